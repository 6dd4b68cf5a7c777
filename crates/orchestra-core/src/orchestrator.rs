//! Orchestration Loop
//!
//! Drives one "agent answers a prompt" interaction:
//!
//! ```text
//! prompt ──▶ model(persona, tools) ──▶ no calls? ──▶ text
//!                    │
//!                    ▼ calls (in emission order)
//!            DispatchClient ──▶ provider registry
//!                    │      └─▶ delegation ──▶ Orchestrator::run(target) (recursive)
//!                    ▼
//!   model([prompt, model turn, function responses]) ──▶ final text
//! ```
//!
//! Delegation recursion is bounded by [`OrchestratorConfig::max_delegation_depth`]
//! and refuses to re-enter an agent already on the current delegation chain.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::json;

use crate::agent::{Agent, AgentRegistry};
use crate::dispatch::{Delegator, DispatchClient};
use crate::error::{AgentError, ErrorKind, Result};
use crate::message::{ConversationLog, ConversationMessage};
use crate::model::{Content, GenerateRequest, GenerationOptions, ReasoningModel};
use crate::tool::{FunctionResponse, ToolExecutor};

/// Result string returned to the model when a delegation target is unknown
pub const AGENT_NOT_FOUND: &str = "Error: Agent not found.";

/// Result string returned when the delegation chain is already at its limit
pub const DELEGATION_DEPTH_EXCEEDED: &str = "Error: Delegation depth limit reached.";

/// Result string returned when delegation would re-enter an active agent
pub const DELEGATION_CYCLE: &str = "Error: Agent is already working on this request.";

/// Orchestration configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Maximum nested delegations below the top-level agent
    pub max_delegation_depth: usize,

    /// Answer used when the follow-up invocation returns no text
    pub fallback_answer: String,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_delegation_depth: 3,
            fallback_answer: "Dispatch processed.".into(),
            generation: GenerationOptions::default(),
        }
    }
}

/// The recursive agent runner
pub struct Orchestrator {
    model: Arc<dyn ReasoningModel>,
    agents: Arc<dyn AgentRegistry>,
    executor: Arc<dyn ToolExecutor>,
    log: ConversationLog,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ReasoningModel>,
        agents: Arc<dyn AgentRegistry>,
        executor: Arc<dyn ToolExecutor>,
        log: ConversationLog,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            model,
            agents,
            executor,
            log,
            config,
        }
    }

    pub fn agents(&self) -> &Arc<dyn AgentRegistry> {
        &self.agents
    }

    pub fn model(&self) -> &Arc<dyn ReasoningModel> {
        &self.model
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run `agent` on `prompt` and return its final answer
    pub async fn run(&self, agent: Arc<Agent>, prompt: &str) -> Result<String> {
        let chain = vec![agent.id.clone()];
        self.run_in_chain(agent, prompt.to_owned(), chain).await
    }

    /// `chain` holds the ids of every agent between the top-level one and
    /// `agent` inclusive.
    fn run_in_chain(
        &self,
        agent: Arc<Agent>,
        prompt: String,
        chain: Vec<String>,
    ) -> BoxFuture<'_, Result<String>> {
        async move {
            let depth = chain.len() - 1;
            tracing::info!(agent = %agent.id, depth, "agent turn started");

            let dispatch = DispatchClient::new(agent.clone(), self.executor.clone());
            let request = GenerateRequest::new(
                agent.persona(),
                vec![Content::user_text(prompt.clone())],
                dispatch.list_tool_declarations(),
            )
            .with_options(self.config.generation.clone());

            let first = self.model.generate(&request).await?;

            if !first.has_function_calls() {
                tracing::info!(agent = %agent.id, "agent answered without tools");
                return Ok(first.text);
            }

            let scope = DelegationScope {
                orchestrator: self,
                chain: &chain,
            };

            let mut responses = Vec::with_capacity(first.function_calls.len());
            for call in &first.function_calls {
                let name = call.name.clone().unwrap_or_default();
                let id = call.id.clone().unwrap_or_default();

                let response = match dispatch.handle_call(call, &scope).await {
                    Ok(outcome) => outcome.into_response(),
                    Err(AgentError::AuthRequired { provider }) => {
                        tracing::warn!(agent = %agent.id, %provider, tool = %name, "provider not linked");
                        self.log.push(ConversationMessage::auth_required(provider));
                        json!({ "error": ErrorKind::AuthRequired.as_str() })
                    }
                    Err(err) => return Err(err),
                };

                responses.push(FunctionResponse { id, name, response });
            }

            tracing::debug!(agent = %agent.id, responses = responses.len(), "re-entering model with tool results");

            let follow_up = GenerateRequest::new(
                request.system_instruction,
                vec![
                    Content::user_text(prompt),
                    first.turn(),
                    Content::tool_responses(responses),
                ],
                request.tools,
            )
            .with_options(self.config.generation.clone());

            let last = self.model.generate(&follow_up).await?;

            tracing::info!(agent = %agent.id, "agent turn finished");
            if last.text.is_empty() {
                Ok(self.config.fallback_answer.clone())
            } else {
                Ok(last.text)
            }
        }
        .boxed()
    }
}

/// Delegation callback bound to one position in the delegation chain
struct DelegationScope<'a> {
    orchestrator: &'a Orchestrator,
    chain: &'a [String],
}

#[async_trait]
impl<'a> Delegator for DelegationScope<'a> {
    async fn delegate(&self, agent_id: &str, task: &str) -> Result<String> {
        let Some(target) = self.orchestrator.agents.find_by_id(agent_id) else {
            tracing::warn!(delegate_to = %agent_id, "delegation target not found");
            return Ok(AGENT_NOT_FOUND.into());
        };

        if self.chain.len() > self.orchestrator.config.max_delegation_depth {
            tracing::warn!(delegate_to = %agent_id, depth = self.chain.len(), "delegation depth limit reached");
            return Ok(DELEGATION_DEPTH_EXCEEDED.into());
        }

        if self.chain.iter().any(|id| id == agent_id) {
            tracing::warn!(delegate_to = %agent_id, "delegation cycle refused");
            return Ok(DELEGATION_CYCLE.into());
        }

        self.orchestrator
            .log
            .push(ConversationMessage::delegation(&target.name));

        let mut chain = self.chain.to_vec();
        chain.push(target.id.clone());
        self.orchestrator
            .run_in_chain(target, task.to_owned(), chain)
            .await
    }
}
