mod common;
mod config;
mod error;
mod network;
mod storage;

use std::process::ExitCode;

use clap::Parser;
use config::{AppConfig, Behavior};
use dotenvy::dotenv;
use network::{AppState, StaticToken};
use storage::{DataLoader, DatasetStore};

#[derive(Parser)]
#[command(
    name = "chat_query_service",
    version,
    about = "HTTP queries over an in-memory users/chats dataset"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Address to serve on, e.g. 0.0.0.0:3000
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,
    /// Endpoint returning `{ users, chats }`
    #[arg(long, value_name = "URL")]
    upstream: Option<String>,
    /// Value the `authorization` header must carry
    #[arg(long, value_name = "TOKEN")]
    auth_token: Option<String>,
    /// Seconds to wait for the upstream dataset
    #[arg(long, value_name = "SECS")]
    fetch_timeout: Option<u64>,
    #[arg(long, value_enum)]
    behavior: Option<Behavior>,
}

impl Cli {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(upstream) = self.upstream {
            config.upstream_url = upstream;
        }
        if let Some(token) = self.auth_token {
            config.auth_token = token;
        }
        if let Some(secs) = self.fetch_timeout {
            config.fetch_timeout_secs = secs;
        }
        if let Some(behavior) = self.behavior {
            config.behavior = behavior;
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);
    let app_config = cli.apply(app_config);

    let loader = DataLoader::new(&app_config.upstream_url, app_config.fetch_timeout());
    let dataset = match loader.fetch().await {
        Ok(dataset) => dataset,
        Err(err) => {
            log::error!("Initial dataset load failed, refusing to serve: {err}");
            return ExitCode::FAILURE;
        }
    };

    let store = DatasetStore::new(dataset, app_config.behavior);
    log::info!(
        "Serving {} users and {} chats ({:?} behavior)",
        store.dataset().users.len(),
        store.dataset().chats.len(),
        store.behavior()
    );
    let state = AppState::new(store, StaticToken::new(app_config.auth_token));

    if let Err(err) = network::server::run(&app_config.listen_addr, state).await {
        log::error!("HTTP server terminated: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
