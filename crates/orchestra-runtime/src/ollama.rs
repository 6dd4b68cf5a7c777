//! Ollama Reasoning Model
//!
//! Implementation of `ReasoningModel` against Ollama's `/api/chat` endpoint
//! using native tool calling. Requests are non-streaming: the orchestration
//! loop needs the complete set of function calls before it can dispatch.

use std::time::Duration;

use async_trait::async_trait;
use orchestra_core::error::{AgentError, Result};
use orchestra_core::model::{
    Content, ContentRole, GenerateRequest, ModelResponse, Part, ReasoningModel, TokenUsage,
};
use orchestra_core::tool::{FunctionCall, ToolDeclaration};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ollama backend configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            timeout_secs: 120,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from `OLLAMA_HOST` / `OLLAMA_PORT` as returned by `lookup`.
    /// A port that is set but not a valid `u16` is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let host = lookup("OLLAMA_HOST")
            .map(|h| h.trim().trim_end_matches('/').to_owned())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);
        let port = match lookup("OLLAMA_PORT").filter(|p| !p.trim().is_empty()) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AgentError::Config(format!("OLLAMA_PORT: expected a port number, got {raw:?}"))
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host,
            port,
            ..defaults
        })
    }

    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Wire types for /api/chat and /api/tags

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct ToolDefinition<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDeclaration,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct WireFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    message: ChatMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

/// Ollama reasoning model
pub struct OllamaModel {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaModel {
    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create with default localhost settings
    pub fn localhost() -> Result<Self> {
        Self::from_config(OllamaConfig::default())
    }

    pub const fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    /// Names of locally available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| AgentError::ModelUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AgentError::ModelUnavailable(e.to_string()))?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Model(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Flatten a request into Ollama chat messages
    fn convert_contents(request: &GenerateRequest) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::new("system", &request.system_instruction)];
        for content in &request.contents {
            messages.extend(Self::convert_content(content));
        }
        messages
    }

    fn convert_content(content: &Content) -> Vec<ChatMessage> {
        match content.role {
            ContentRole::User => vec![ChatMessage::new("user", content.text())],
            ContentRole::Model => {
                let tool_calls = content
                    .parts
                    .iter()
                    .filter_map(|p| match p {
                        Part::FunctionCall(call) => Some(WireToolCall {
                            id: call.id.clone(),
                            function: WireFunction {
                                name: call.name.clone().unwrap_or_default(),
                                arguments: call.args.clone(),
                            },
                        }),
                        _ => None,
                    })
                    .collect();
                vec![ChatMessage {
                    tool_calls,
                    ..ChatMessage::new("assistant", content.text())
                }]
            }
            ContentRole::Tool => content
                .function_responses()
                .map(|r| ChatMessage {
                    tool_name: Some(r.name.clone()),
                    ..ChatMessage::new("tool", r.response.to_string())
                })
                .collect(),
        }
    }

    fn build_request<'a>(request: &'a GenerateRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &request.options.model,
            messages: Self::convert_contents(request),
            tools: request
                .tools
                .iter()
                .map(|function| ToolDefinition {
                    kind: "function",
                    function,
                })
                .collect(),
            stream: false,
            options: ChatOptions {
                temperature: request.options.temperature,
                top_p: request.options.top_p,
                num_predict: request.options.max_tokens,
            },
        }
    }

    /// Convert an Ollama response into a model response
    fn convert_response(response: ChatResponse) -> ModelResponse {
        let function_calls = response
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                // Some models send arguments as a JSON-encoded string
                let args = match call.function.arguments {
                    Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
                    other => other,
                };
                FunctionCall {
                    id: Some(call.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string())),
                    name: Some(call.function.name),
                    args,
                }
            })
            .collect();

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, completion) => {
                let (prompt, completion) = (prompt.unwrap_or(0), completion.unwrap_or(0));
                Some(TokenUsage {
                    prompt_tokens: prompt,
                    completion_tokens: completion,
                    total_tokens: prompt.saturating_add(completion),
                })
            }
        };

        ModelResponse {
            text: response.message.content,
            function_calls,
            model: response.model,
            usage,
        }
    }
}

#[async_trait]
impl ReasoningModel for OllamaModel {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse> {
        let body = Self::build_request(request);
        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "ollama chat request"
        );

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AgentError::ModelUnavailable(e.to_string())
                } else {
                    AgentError::Model(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Model(format!("{status}: {detail}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Model(format!("invalid chat response: {e}")))?;
        let converted = Self::convert_response(chat);

        tracing::debug!(
            calls = converted.function_calls.len(),
            text_len = converted.text.len(),
            "ollama chat response"
        );
        Ok(converted)
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
