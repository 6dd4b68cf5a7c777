//! Error Types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Classification of failures surfaced by the dispatch core.
///
/// The string form is what the reasoning model and the presentation layer see.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Function call without a name
    MalformedCall,
    /// Call name not declared on the agent
    ToolNotFound,
    /// Provider has no stored token
    AuthRequired,
    /// Provider execution failed for any other reason
    ProviderError,
    /// Uncaught failure during a full turn
    OrchestrationError,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedCall => "MALFORMED_CALL",
            Self::ToolNotFound => "TOOL_NOT_FOUND",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::OrchestrationError => "ORCHESTRATION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Provider requires a linked credential before tools can run
    #[error("AUTHENTICATION_REQUIRED: No valid session for {provider}.")]
    AuthRequired { provider: String },

    /// Provider tool execution failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Reasoning model returned an error
    #[error("Model error: {0}")]
    Model(String),

    /// Reasoning model unavailable or not responding
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error (credential vault, caches)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Shorthand for the missing-credential condition
    pub fn auth_required(provider: impl Into<String>) -> Self {
        Self::AuthRequired {
            provider: provider.into(),
        }
    }

    /// Map to the error kind reported to the model and the UI
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthRequired { .. } => ErrorKind::AuthRequired,
            Self::Provider(_) => ErrorKind::ProviderError,
            _ => ErrorKind::OrchestrationError,
        }
    }

    /// Provider id carried by an auth failure
    pub fn auth_provider(&self) -> Option<&str> {
        match self {
            Self::AuthRequired { provider } => Some(provider),
            _ => None,
        }
    }

    /// Check if error is retryable.
    ///
    /// Nothing in the core retries automatically; callers use this to decide
    /// whether offering "try again" makes sense.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_) | Self::Io(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Model(msg) => format!("The reasoning model encountered an error: {msg}"),
            Self::ModelUnavailable(_) => {
                "The reasoning model is currently unavailable. Please try again.".into()
            }
            Self::AuthRequired { provider } => {
                format!("Link your {provider} account to let agents use it.")
            }
            Self::Provider(msg) => format!("Tool error: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AgentError::auth_required("jira").kind(), ErrorKind::AuthRequired);
        assert_eq!(AgentError::Provider("boom".into()).kind(), ErrorKind::ProviderError);
        assert_eq!(
            AgentError::Model("down".into()).kind(),
            ErrorKind::OrchestrationError
        );
    }

    #[test]
    fn test_auth_message_names_provider() {
        let err = AgentError::auth_required("instagram");
        assert!(err.to_string().starts_with("AUTHENTICATION_REQUIRED"));
        assert_eq!(err.auth_provider(), Some("instagram"));
        assert!(err.user_message().contains("instagram"));
    }

    #[test]
    fn test_retryable_and_user_message() {
        let down = AgentError::ModelUnavailable("connection refused".into());
        assert!(down.is_retryable());
        assert!(down.user_message().contains("try again"));

        let bad = AgentError::Model("script exhausted".into());
        assert!(!bad.is_retryable());
        assert!(bad.user_message().ends_with("script exhausted"));
    }

    #[test]
    fn test_kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::ToolNotFound).unwrap();
        assert_eq!(json, "\"TOOL_NOT_FOUND\"");
        assert_eq!(ErrorKind::AuthRequired.to_string(), "AUTH_REQUIRED");
    }
}
