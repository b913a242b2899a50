use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use translation_io::config::Config;
use translation_io::fanout::FanOut;
use translation_io::server::{self, AppState};
use translation_io::store::{DocumentStore, MemoryStore, PgStore};
use translation_io::translation::GoogleTranslator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the environment is set directly)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_io=info".parse()?),
        )
        .init();

    info!("Starting translation service");

    let config = Config::from_env()?;

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to PostgreSQL");
            Arc::new(PgStore::connect(url, config.database_max_connections).await?)
        }
        None => {
            warn!("DATABASE_URL not set, documents will be kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let translator = Arc::new(GoogleTranslator::from_config(&config)?);
    let fanout = FanOut::from_config(&config, translator);
    info!(
        source = %config.source_language,
        targets = fanout.targets().len(),
        "Translation fan-out configured"
    );

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;

    server::serve(listener, AppState::new(store, fanout)).await
}
