//! agent-orchestra HTTP Server
//!
//! Axum-based server exposing the orchestra: the agent roster, provider
//! linking, chat turns against a single session and voice command routing.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orchestra_connectors::{CredentialVault, FileStore};
use orchestra_core::ReasoningModel;
use orchestra_runtime::OllamaModel;

use crate::config::ServerConfig;
use crate::handlers::{
    chat_handler, health_check, link_provider, list_agents, list_messages, list_providers,
    metrics, unlink_provider, voice_handler,
};
use crate::state::AppState;

fn app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Roster & providers
        .route("/api/agents", get(list_agents))
        .route("/api/providers", get(list_providers))
        .route(
            "/api/providers/{id}/link",
            post(link_provider).delete(unlink_provider),
        )
        // Session
        .route("/api/chat", post(chat_handler))
        .route("/api/messages", get(list_messages))
        .route("/api/metrics", get(metrics))
        .route("/api/voice", post(voice_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize reasoning model
    let ollama = Arc::new(OllamaModel::from_config(config.ollama.clone())?);

    // Verify Ollama connection
    match ollama.list_models().await {
        Ok(models) => {
            tracing::info!("✓ Connected to Ollama at {}", ollama.config().base_url());
            for model in models {
                tracing::info!("  Model: {}", model);
            }
        }
        Err(e) => {
            tracing::warn!("⚠ Ollama not available ({}) - turns will fail", e);
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    // Credential vault
    let store = FileStore::open(&config.credentials_path).await?;
    tracing::info!("Credentials stored in {}", store.path().display());
    let vault = CredentialVault::new(Arc::new(store));

    let model: Arc<dyn ReasoningModel> = ollama;
    let state = AppState::new(model, vault, &config);
    tracing::info!(
        agents = state.session.agents().all().len(),
        model = %config.model,
        semantic_cache = config.semantic_cache,
        max_delegation_depth = config.max_delegation_depth,
        "orchestra ready"
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🎼 agent-orchestra running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                   - Health check");
    tracing::info!("  GET    /api/agents?category=&q=  - Agent roster");
    tracing::info!("  GET    /api/providers            - Provider connection state");
    tracing::info!("  POST   /api/providers/:id/link   - Link a provider token");
    tracing::info!("  DELETE /api/providers/:id/link   - Unlink a provider");
    tracing::info!("  POST   /api/chat                 - Run an agent turn");
    tracing::info!("  GET    /api/messages             - Conversation log");
    tracing::info!("  GET    /api/metrics              - Session metrics");
    tracing::info!("  POST   /api/voice                - Route a voice transcript");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
