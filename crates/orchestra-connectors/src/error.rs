//! Error Types for Provider Connectors

use orchestra_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectorError>;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Token must not be empty")]
    EmptyToken,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ConnectorError> for AgentError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::Io(e) => Self::Io(e),
            ConnectorError::Serialization(e) => Self::Json(e),
            other => Self::Storage(other.to_string()),
        }
    }
}
