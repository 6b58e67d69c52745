use std::{error::Error, sync::Arc};

use ai_llm_service::config::EnvReader;
use ai_llm_service::telemetry;
use api::AppState;
use rag_engine::{AppConfig, Pipeline};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; a malformed one is not.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(telemetry::layer())
        .init();

    let cfg = AppConfig::from_env(&EnvReader::process())?;
    info!(
        chat_model = %cfg.chat.model,
        index = %cfg.store.index_name,
        address = %cfg.api_address,
        request_timeout_secs = cfg.request_timeout.as_secs(),
        "configuration loaded"
    );

    let pipeline = Pipeline::from_config(&cfg)?;
    let state = Arc::new(AppState::from_config(&cfg, pipeline));

    api::start(state, &cfg.api_address).await?;

    Ok(())
}
