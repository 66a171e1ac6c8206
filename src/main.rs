use anyhow::Result;
use sprachtrainer::api::ApiClient;
use sprachtrainer::config::TrainerConfig;
use sprachtrainer::session::{SessionStorage, SessionStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sprachtrainer=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sprachtrainer engine");

    let config = TrainerConfig::default();
    config.validate().map_err(anyhow::Error::msg)?;

    let storage = match &config.storage_path {
        Some(path) => SessionStorage::at(path),
        None => SessionStorage::default_location()?,
    };
    let store = SessionStore::open(storage);

    let api = ApiClient::new(&config.api)?;
    info!("Speech service at {}", api.base_url());

    let snapshot = store.snapshot();
    info!(
        target_lang = ?snapshot.target_lang,
        profiles = snapshot.profiles_by_lang.len(),
        display_name = %snapshot.user,
        "Session hydrated"
    );

    Ok(())
}
