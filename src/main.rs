use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use translation_bot::{
    catalog::LanguageCatalog, config::Config, db::Database, dispatcher::Dispatcher,
    telegram::{self, BotClient}, translator::TranslatorClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_bot=info".parse()?),
        )
        .init();

    info!("Starting translation bot");

    // Load configuration from environment; missing settings are fatal here,
    // before anything touches the network or the database.
    let config = Config::from_env()?;

    // Load the language catalog; a missing or malformed file is fatal.
    let catalog = LanguageCatalog::load(&config.languages_file)
        .context("Language catalog failed to load")?;
    info!("Loaded {} languages from {}", catalog.len(), config.languages_file);

    // Open the store.
    let db = Database::open(&config.database_path)?;
    info!("Database ready at {}", config.database_path);

    let translator = TranslatorClient::new(&config.translator_endpoint, &config.translator_key);
    let bot = Arc::new(BotClient::new(
        &config.telegram_api_url,
        &config.telegram_bot_token,
    ));

    let dispatcher = Arc::new(Dispatcher::new(catalog, translator, db, Arc::clone(&bot)));

    telegram::run_polling(bot, dispatcher, config.poll_timeout_secs).await
}
