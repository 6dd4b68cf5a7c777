//! Reasoning Model Strategy Pattern
//!
//! Defines the interface the orchestration loop uses to talk to a reasoning
//! model (Ollama, Gemini, OpenAI, ...), along with the conversation content
//! shapes that carry function calls and function responses between turns.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orchestra_core::model::{GenerateRequest, ReasoningModel};
//!
//! let request = GenerateRequest::new(persona, vec![Content::user_text(prompt)], tools);
//! let response = model.generate(&request).await?;
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::tool::{FunctionCall, FunctionResponse, ToolDeclaration};

/// Configuration for generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "llama3.2", "qwen2.5")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

const fn default_temperature() -> f32 { 0.7 }
const fn default_max_tokens() -> u32 { 2048 }
const fn default_top_p() -> f32 { 0.9 }

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "llama3.2".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
        }
    }
}

/// Who produced a piece of conversation content
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    User,
    Model,
    Tool,
}

/// One part of a content turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

/// A turn of conversation content sent to the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: ContentRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn tool_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: ContentRole::Tool,
            parts: responses.into_iter().map(Part::FunctionResponse).collect(),
        }
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn function_responses(&self) -> impl Iterator<Item = &FunctionResponse> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionResponse(r) => Some(r),
            _ => None,
        })
    }
}

/// Everything the model needs for one invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Persona / system instruction
    pub system_instruction: String,

    /// Conversation content in order
    pub contents: Vec<Content>,

    /// Functions the model may call; empty means none
    pub tools: Vec<ToolDeclaration>,

    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerateRequest {
    pub fn new(
        system_instruction: impl Into<String>,
        contents: Vec<Content>,
        tools: Vec<ToolDeclaration>,
    ) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            contents,
            tools,
            options: GenerationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from one model invocation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Generated text; empty when the model only requested calls
    pub text: String,

    /// Requested function calls in emission order
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,

    /// Model that generated this response
    #[serde(default)]
    pub model: String,

    /// Token usage statistics (if available)
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn calls(function_calls: Vec<FunctionCall>) -> Self {
        Self {
            function_calls,
            ..Default::default()
        }
    }

    pub fn has_function_calls(&self) -> bool {
        !self.function_calls.is_empty()
    }

    /// The model's turn, replayed as context on the follow-up invocation
    pub fn turn(&self) -> Content {
        let mut parts = Vec::with_capacity(self.function_calls.len() + 1);
        if !self.text.is_empty() {
            parts.push(Part::Text(self.text.clone()));
        }
        parts.extend(self.function_calls.iter().cloned().map(Part::FunctionCall));
        Content {
            role: ContentRole::Model,
            parts,
        }
    }
}

/// Strategy trait for reasoning models
///
/// Implement this trait to add support for new backends.
/// The orchestration loop works exclusively through this interface.
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Generate a response, possibly requesting function calls
    async fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Canned-response model for tests and offline demos.
///
/// Pops one scripted response per `generate` call and records every request,
/// so callers can assert on what the orchestration loop sent.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<ModelResponse>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    pub fn new(script: impl IntoIterator<Item = ModelResponse>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another response
    pub fn push(&self, response: ModelResponse) {
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(response);
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl ReasoningModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request.clone());
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| AgentError::Model("script exhausted".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.model, "llama3.2");
    }

    #[test]
    fn test_model_turn_keeps_call_order() {
        let response = ModelResponse {
            text: "Checking.".into(),
            function_calls: vec![
                FunctionCall::new("a", json!({})),
                FunctionCall::new("b", json!({})),
            ],
            ..Default::default()
        };
        let turn = response.turn();
        assert_eq!(turn.role, ContentRole::Model);
        assert_eq!(turn.parts.len(), 3);
        assert_eq!(turn.text(), "Checking.");
        assert!(matches!(&turn.parts[2], Part::FunctionCall(c) if c.name() == Some("b")));
    }

    #[tokio::test]
    async fn test_scripted_model_records_requests() {
        let model = ScriptedModel::new([ModelResponse::text("one")]);
        let request = GenerateRequest::new("persona", vec![Content::user_text("hi")], vec![]);

        assert_eq!(model.generate(&request).await.unwrap().text, "one");
        assert!(model.generate(&request).await.is_err());
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.requests()[0].contents[0].text(), "hi");
    }
}
