pub mod auth;
pub mod server;

pub use auth::StaticToken;
pub use server::AppState;
