//! # orchestra-core
//!
//! Agent dispatch and tool-call resolution core with a model-agnostic
//! reasoning abstraction and recursive agent-to-agent delegation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Session                             │
//! │   turn gate ─▶ Orchestrator ─▶ ReasoningModel (Strategy)     │
//! │                    │                                         │
//! │                    ▼                                         │
//! │             DispatchClient ──▶ ToolExecutor (provider side)  │
//! │                    └────────▶ delegation ─▶ Orchestrator     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ReasoningModel` trait enables swapping between Ollama, hosted models
//! or a scripted stand-in without changing orchestration logic. Providers are
//! reached only through `ToolExecutor`, implemented by `orchestra-connectors`.

pub mod agent;
pub mod cache;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod model;
pub mod orchestrator;
pub mod session;
pub mod tool;

pub use agent::{Agent, AgentRegistry, AgentRoster, Category, SUPERVISOR_AGENT_ID};
pub use cache::SemanticCache;
pub use command::{VoiceCommand, VoiceRouter};
pub use dispatch::{CallOutcome, Delegator, DispatchClient};
pub use error::{AgentError, ErrorKind, Result};
pub use message::{ConversationLog, ConversationMessage, Role};
pub use model::{ModelResponse, ReasoningModel, ScriptedModel};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use session::{Session, SessionConfig, SessionId, SystemMetrics, TurnOutcome};
pub use tool::{FunctionCall, ParamType, ParameterSchema, ToolExecutor, ToolSpec};
