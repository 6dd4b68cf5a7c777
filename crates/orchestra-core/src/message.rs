//! Conversation Messages
//!
//! The append-only log a session shows to the human: user prompts, agent
//! answers and system notices (delegations, auth prompts, orchestration errors).

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human input
    User,
    /// Final answer from an agent
    Assistant,
    /// Notices emitted by the orchestration core
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single entry in the conversation log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Agent that produced the message (assistant answers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Marks failures and auth prompts
    #[serde(default)]
    pub error: bool,

    /// Provider that needs linking (auth prompts only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Answer served from the semantic cache
    #[serde(default)]
    pub cached: bool,
}

impl ConversationMessage {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            agent_id: None,
            timestamp: Utc::now(),
            error: false,
            provider_id: None,
            cached: false,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant answer attributed to an agent
    pub fn assistant(content: impl Into<String>, agent_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.agent_id = Some(agent_id.into());
        msg
    }

    /// Create a system notice
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Notice emitted before a delegated sub-turn starts
    pub fn delegation(target_name: &str) -> Self {
        Self::system(format!("🔄 DELEGATING: {target_name}"))
    }

    /// Prompt asking the human to link a provider
    pub fn auth_required(provider_id: impl Into<String>) -> Self {
        let provider_id = provider_id.into();
        let mut msg = Self::system(format!("⚠️ AUTH REQUIRED: {provider_id}"));
        msg.error = true;
        msg.provider_id = Some(provider_id);
        msg
    }

    /// Top-level failure of a turn
    pub fn orchestration_error(detail: impl std::fmt::Display) -> Self {
        let mut msg = Self::system(format!("ORCHESTRATION_ERROR: {detail}"));
        msg.error = true;
        msg
    }

    /// Mark as served from the cache
    #[must_use]
    pub const fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    /// Estimate token count (rough approximation)
    pub fn estimate_tokens(&self) -> u32 {
        // ~4 characters per token is a rough estimate
        u32::try_from(self.content.len() / 4).unwrap_or(u32::MAX)
    }
}

/// Shared, append-only conversation log.
///
/// Cloning yields another handle to the same log. Locks are held only for the
/// duration of a push or a copy, never across an await point.
#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    messages: Arc<RwLock<Vec<ConversationMessage>>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ConversationMessage>> {
        self.messages
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ConversationMessage>> {
        self.messages
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Append a message
    pub fn push(&self, message: ConversationMessage) {
        tracing::trace!(role = %message.role, "log append");
        self.write().push(message);
    }

    /// Copy of all messages in order
    pub fn snapshot(&self) -> Vec<ConversationMessage> {
        self.read().clone()
    }

    /// Messages appended at or after `index`
    pub fn since(&self, index: usize) -> Vec<ConversationMessage> {
        self.read().iter().skip(index).cloned().collect()
    }

    /// Get the last message
    pub fn last(&self) -> Option<ConversationMessage> {
        self.read().last().cloned()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
