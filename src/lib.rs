use anyhow::Result;
use dotenvy::dotenv;

pub mod api;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod interface;
pub mod logger;
pub mod roles;
pub mod session;
pub mod utils;
pub mod weather;

/// Run the application: load `.env`, load config, and start the REPL.
///
/// When `enable_dashboard = true` in `rolecast.toml`, the web dashboard
/// is spawned as a background task alongside the CLI REPL.
pub async fn run() -> Result<()> {
    // Load environment variables from .env (OPENAI_API_KEY, OPENWEATHER_API_KEY)
    dotenv().ok();

    let config = config::AppConfig::load();

    if config.enable_dashboard {
        interface::start_repl_with_dashboard(&config).await;
    } else {
        interface::start_repl(&config).await;
    }

    Ok(())
}

// Re-exports for library consumers: common useful types
pub use api::{CompletionClient, GenerationParams};
pub use config::AppConfig;
pub use error::AppError;
pub use session::{Message, Role, Session};
pub use weather::{WeatherClient, WeatherSnapshot};
