mod config;
mod db;
mod errors;
mod grading;
mod interview;
mod llm_client;
mod questions;
mod render;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::grading::LlmGradingClient;
use crate::interview::report::MeanAggregator;
use crate::interview::InterviewService;
use crate::llm_client::LlmClient;
use crate::questions::TopicQuestionSource;
use crate::render::HttpPdfRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgSessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Proctor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    ensure_schema(&pool).await?;

    // Initialize the grading client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM grading client initialized (model: {})", llm_client::MODEL);

    // Assemble the interview core behind its seams
    let interviews = Arc::new(InterviewService::new(
        Arc::new(PgSessionStore::new(pool)),
        Arc::new(LlmGradingClient::new(llm)),
        Arc::new(TopicQuestionSource),
        Arc::new(HttpPdfRenderer::new(&config.render_service_url)),
        Arc::new(MeanAggregator),
    ));

    let state = AppState {
        interviews,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
