mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::{Evaluator, FollowUpClient};
use crate::config::Config;
use crate::llm_client::{GeminiClient, ModelService};
use crate::routes::build_router;
use crate::session::Session;
use crate::state::AppState;

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

    info!("Starting Scouter API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model client shared by evaluation and follow-up questions
    let model: Arc<dyn ModelService> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
        config.request_timeout,
    )?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let evaluator = Evaluator::new(
        model.clone(),
        config.response_language.clone(),
        config.validation_policy,
    );
    let chat = FollowUpClient::new(model, config.response_language.clone());
    info!(
        "Responses in {}, validation policy {:?}",
        config.response_language, config.validation_policy
    );

    // Build app state
    let state = AppState {
        session: Arc::new(Session::new(evaluator, chat, config.analysis_timeout)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
