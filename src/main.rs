use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reco_api::api::{create_router, AppState};
use reco_api::config::Config;
use reco_api::db::{create_pool, PreferenceStore, RecommendationStore};
use reco_api::middleware::{make_span, request_id_middleware};
use reco_api::services::providers::OpenAiProvider;
use reco_api::services::workflow::WorkflowController;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting reco-api v{}", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(&config.database_url).await?;
    info!(database_url = %config.database_url, "SQLite store ready");

    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; recommendation requests will fail until it is configured");
    }

    let preferences = PreferenceStore::new(pool.clone());
    let history = RecommendationStore::new(pool);
    let provider = Arc::new(OpenAiProvider::new(
        config.openai_api_key.clone(),
        config.openai_api_url.clone(),
    ));
    let workflow = Arc::new(WorkflowController::new(
        preferences.clone(),
        history.clone(),
        provider,
    ));

    let state = AppState::new(workflow, preferences, history);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
