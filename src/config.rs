use anyhow::{Context, Result};

pub const DEFAULT_TRANSLATOR_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: String,

    // Translation provider
    pub translator_key: String,
    pub translator_endpoint: String,

    // Persistence
    pub database_path: String,

    // Language catalog
    pub languages_file: String,

    // Long polling
    pub poll_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing required variables fail immediately with a diagnostic naming
    /// the variable, so a misconfigured deployment dies at startup rather
    /// than at the first inbound message.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Telegram
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN not set")?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string()),

            // Translation provider
            translator_key: std::env::var("TRANSLATOR_KEY")
                .context("TRANSLATOR_KEY not set")?,
            translator_endpoint: std::env::var("TRANSLATOR_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_TRANSLATOR_ENDPOINT.to_string()),

            // Persistence
            database_path: std::env::var("DATABASE_PATH")
                .context("DATABASE_PATH not set")?,

            // Language catalog
            languages_file: std::env::var("LANGUAGES_FILE")
                .unwrap_or_else(|_| "data/languages.json".to_string()),

            // Long polling
            poll_timeout_secs: std::env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }
}
