//! # orchestra-runtime
//!
//! Reasoning model backends for the orchestra.
//!
//! ## Backends
//!
//! - **Ollama** (default): local inference via `/api/chat` with native tool calling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orchestra_runtime::{OllamaConfig, OllamaModel};
//!
//! let model = Arc::new(OllamaModel::from_config(OllamaConfig::from_env()?)?);
//! let orchestrator = Orchestrator::new(model, agents, registry, log, config);
//! ```

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaModel};

// Re-export core types for convenience
pub use orchestra_core::{AgentError, ReasoningModel, Result};
