//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use orchestra_connectors::{ConnectorError, ProviderStatus};
use orchestra_core::{
    Agent, Category, ConversationMessage, SystemMetrics, TurnOutcome, VoiceCommand,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_connected: bool,
    pub session_id: String,
    pub busy: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Handler error rendered as `{error, code}` with a status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn busy() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "SESSION_BUSY",
            "Another request is still being orchestrated.",
        )
    }

    fn agent_not_found(id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "AGENT_NOT_FOUND", format!("No agent with id '{id}'"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            code: self.code.into(),
        });
        (self.status, body).into_response()
    }
}

impl From<ConnectorError> for ApiError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::UnknownProvider(_) => {
                Self::new(StatusCode::NOT_FOUND, "UNKNOWN_PROVIDER", err.to_string())
            }
            ConnectorError::EmptyToken => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_TOKEN", err.to_string())
            }
            other => {
                tracing::error!("Credential storage error: {}", other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Credential storage failed",
                )
            }
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct AgentQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Defaults to the selected agent, then the supervisor
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub agent_id: String,
    pub answer: String,
    pub cached: bool,
    /// Log entries appended by this turn, in order
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    pub transcript: String,
}

#[derive(Debug, Default, Serialize)]
pub struct VoiceResponse {
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Text for the speech layer to say
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ConversationMessage>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_connected = state.model.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model_connected,
        session_id: state.session.id().to_string(),
        busy: state.session.is_busy(),
    })
}

/// Roster filtered by category and free-text query
pub async fn list_agents(
    State(state): State<AppState>,
    Query(query): Query<AgentQuery>,
) -> ApiResult<Vec<Agent>> {
    let category = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(raw) => Some(Category::parse(raw).ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_CATEGORY",
                format!("Unknown category '{raw}'"),
            )
        })?),
        None => None,
    };
    let agents = state.session.agents().filter(category, query.q.as_deref());
    Ok(Json(agents.iter().map(|a| Agent::clone(a)).collect()))
}

pub async fn list_providers(State(state): State<AppState>) -> ApiResult<Vec<ProviderStatus>> {
    Ok(Json(state.catalog.snapshot().await?))
}

pub async fn link_provider(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    Json(payload): Json<LinkRequest>,
) -> ApiResult<ProviderStatus> {
    Ok(Json(state.catalog.link(&provider_id, payload.token.trim()).await?))
}

pub async fn unlink_provider(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
) -> ApiResult<ProviderStatus> {
    Ok(Json(state.catalog.unlink(&provider_id).await?))
}

/// Run one top-level turn
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    let session = &state.session;
    if session.is_busy() {
        return Err(ApiError::busy());
    }

    let agent = match payload.agent_id.as_deref() {
        Some(id) => session
            .agents()
            .find_by_id(id)
            .ok_or_else(|| ApiError::agent_not_found(id))?,
        None => session
            .selected_agent()
            .or_else(|| session.agents().default_agent())
            .ok_or_else(|| ApiError::agent_not_found("default"))?,
    };

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message is empty"));
    }

    let start = session.log().len();
    let outcome = session.execute_agent_task(agent.clone(), message).await;

    match outcome {
        TurnOutcome::Answered { text, cached } => Ok(Json(ChatResponse {
            agent_id: agent.id.clone(),
            answer: text,
            cached,
            messages: session.log().since(start),
        })),
        TurnOutcome::Failed { message, retryable } => {
            let status = if retryable {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err(ApiError::new(status, "ORCHESTRATION_ERROR", message))
        }
        TurnOutcome::Rejected => Err(ApiError::busy()),
    }
}

/// Full conversation log
pub async fn list_messages(State(state): State<AppState>) -> Json<Vec<ConversationMessage>> {
    Json(state.session.log().snapshot())
}

pub async fn metrics(State(state): State<AppState>) -> Json<SystemMetrics> {
    Json(state.session.metrics())
}

/// Route a final speech transcript and run it when it names a task
pub async fn voice_handler(
    State(state): State<AppState>,
    Json(payload): Json<VoiceRequest>,
) -> ApiResult<VoiceResponse> {
    let session = &state.session;
    let command = state.voice.route(
        &payload.transcript,
        &**session.agents(),
        session.selected_agent(),
    );

    let response = match command {
        VoiceCommand::Ignored => VoiceResponse {
            action: "ignored",
            ..Default::default()
        },
        VoiceCommand::Listen => VoiceResponse {
            action: "listen",
            speech: Some("Listening. State your command for the orchestra.".into()),
            ..Default::default()
        },
        VoiceCommand::Select(agent) => {
            session.select_agent(&agent.id);
            VoiceResponse {
                action: "select",
                agent_id: Some(agent.id.clone()),
                speech: Some(format!("{} module loaded. What is your instruction?", agent.name)),
                ..Default::default()
            }
        }
        VoiceCommand::Execute { agent, task } => {
            let start = session.log().len();
            let speech = match session.execute_agent_task(agent.clone(), &task).await {
                TurnOutcome::Answered { text, .. } => text,
                TurnOutcome::Failed { message, .. } => message,
                TurnOutcome::Rejected => return Err(ApiError::busy()),
            };
            VoiceResponse {
                action: "execute",
                agent_id: Some(agent.id.clone()),
                speech: Some(speech),
                messages: session.log().since(start),
            }
        }
    };

    Ok(Json(response))
}
