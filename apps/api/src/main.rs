mod chat;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::orchestrator::ChatService;
use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::llm_client::OpenRouterClient;
use crate::resume::store::ResumeStore;
use crate::routes::build_router;
use crate::state::{AppState, CHAT_TIMEOUT};

/// Local frontend dev servers always allowed by CORS.
const DEV_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:5174",
];

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite and seed the resume on first start
    let db = create_pool(&config.database_url).await?;
    init_schema(&db).await?;
    let store = ResumeStore::new(db, &config.resume_path);
    store.seed_if_empty().await?;

    // Initialize chat orchestrator
    let provider = config.provider();
    let upstream = OpenRouterClient::new(&provider)?;
    if provider.is_configured() {
        info!("AI chat enabled (model: {})", provider.model);
    } else {
        warn!("OPENROUTER_API_KEY is not set; /api/chat will report that AI chat is not configured");
    }
    let chat = ChatService::new(provider, Arc::new(upstream), Arc::new(store.clone()));

    let state = AppState {
        store,
        chat: Arc::new(chat),
        chat_timeout: CHAT_TIMEOUT,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Dev origins plus `FRONTEND_URL`, deduplicated. Credentials are allowed,
/// so methods and headers mirror the request instead of using a wildcard.
fn build_cors(config: &Config) -> CorsLayer {
    let origins: BTreeSet<&str> = DEV_ORIGINS
        .iter()
        .copied()
        .chain(config.frontend_url.as_deref())
        .collect();

    let origins: Vec<HeaderValue> = origins
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{origin}': {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
    }
}
