use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/service.json";

/// How the store treats the two quirks inherited from the upstream service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Bit-for-bit parity with the upstream service.
    #[default]
    Legacy,
    /// Mutual users exclude each user's own name, single-chat removal works at index 0.
    Corrected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listen_addr: String,
    pub upstream_url: String,
    pub auth_token: String,
    pub fetch_timeout_secs: u64,
    pub behavior: Behavior,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            upstream_url: "http://localhost:4001/chats".to_string(),
            auth_token: "someAuthToken".to_string(),
            fetch_timeout_secs: 10,
            behavior: Behavior::Legacy,
        }
    }
}

impl AppConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|err| {
            log::warn!("Failed to parse config file {}: {err}", path.display());
            AppConfig::default()
        }),
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

fn parse_config(content: &str) -> serde_json::Result<AppConfig> {
    serde_json::from_str::<AppConfig>(content)
}
