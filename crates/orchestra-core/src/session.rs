//! Session Management
//!
//! A session owns the conversation log and admits one top-level turn at a
//! time. Delegated sub-turns run inside the admitted turn and never touch the
//! gate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{Agent, AgentRegistry};
use crate::cache::{DEFAULT_TTL, SemanticCache};
use crate::message::{ConversationLog, ConversationMessage};
use crate::orchestrator::Orchestrator;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session behaviour switches
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Serve repeated prompts to the same agent from the semantic cache
    pub semantic_cache: bool,
    pub cache_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            semantic_cache: false,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

/// Per-session counters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub total_requests: u64,
    pub cache_hits: u64,
    /// Estimated tokens not spent because answers came from the cache
    pub tokens_saved: u64,
    /// Mean wall time of live (uncached) turns
    pub avg_latency_ms: f64,
    #[serde(skip)]
    live_turns: u64,
}

impl SystemMetrics {
    fn record_live(&mut self, elapsed: Duration) {
        self.live_turns += 1;
        #[allow(clippy::cast_precision_loss)]
        let (n, ms) = (self.live_turns as f64, elapsed.as_secs_f64() * 1000.0);
        self.avg_latency_ms += (ms - self.avg_latency_ms) / n;
    }
}

/// What happened to a submitted top-level turn
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The agent answered; the answer is on the log
    Answered { text: String, cached: bool },
    /// The turn failed; an orchestration error notice is on the log.
    /// `message` is the user-facing wording of the failure.
    Failed { message: String, retryable: bool },
    /// Another turn was in flight; nothing happened
    Rejected,
}

/// Releases the turn gate when dropped
struct TurnGuard<'a>(&'a AtomicBool);

impl<'a> TurnGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A conversation with the orchestra
pub struct Session {
    id: SessionId,
    orchestrator: Orchestrator,
    config: SessionConfig,
    busy: AtomicBool,
    selected: RwLock<Option<String>>,
    metrics: Mutex<SystemMetrics>,
    cache: SemanticCache,
}

impl Session {
    pub fn new(orchestrator: Orchestrator, config: SessionConfig) -> Self {
        let cache = SemanticCache::with_ttl(config.cache_ttl);
        Self {
            id: SessionId::new(),
            orchestrator,
            config,
            busy: AtomicBool::new(false),
            selected: RwLock::new(None),
            metrics: Mutex::new(SystemMetrics::default()),
            cache,
        }
    }

    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn log(&self) -> &ConversationLog {
        self.orchestrator.log()
    }

    pub fn agents(&self) -> &Arc<dyn AgentRegistry> {
        self.orchestrator.agents()
    }

    pub const fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// True while a top-level turn is running
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> SystemMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Last agent the human selected or talked to
    pub fn selected_agent(&self) -> Option<Arc<Agent>> {
        let selected = self
            .selected
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()?;
        self.agents().find_by_id(&selected)
    }

    /// Select an agent by id; unknown ids leave the selection unchanged
    pub fn select_agent(&self, agent_id: &str) -> Option<Arc<Agent>> {
        let agent = self.agents().find_by_id(agent_id)?;
        *self
            .selected
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(agent.id.clone());
        tracing::info!(session = %self.id, agent = %agent.id, "agent selected");
        Some(agent)
    }

    fn with_metrics(&self, f: impl FnOnce(&mut SystemMetrics)) {
        f(&mut self
            .metrics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner));
    }

    fn cache_key(agent: &Agent, input: &str) -> String {
        format!("{}::{}", agent.id, input.trim())
    }

    /// Run one top-level turn of `agent` on `input`.
    ///
    /// Returns [`TurnOutcome::Rejected`] without touching the log when a turn
    /// is already in flight.
    pub async fn execute_agent_task(&self, agent: Arc<Agent>, input: &str) -> TurnOutcome {
        let Some(_guard) = TurnGuard::try_acquire(&self.busy) else {
            tracing::warn!(session = %self.id, agent = %agent.id, "turn rejected: session busy");
            return TurnOutcome::Rejected;
        };

        *self
            .selected
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(agent.id.clone());
        self.with_metrics(|m| m.total_requests += 1);
        self.log().push(ConversationMessage::user(input));

        let key = Self::cache_key(&agent, input);
        if self.config.semantic_cache {
            if let Some(text) = self.cache.lookup(&key) {
                let answer = ConversationMessage::assistant(text.clone(), agent.id.clone())
                    .with_cached(true);
                let saved = u64::from(answer.estimate_tokens());
                self.with_metrics(|m| {
                    m.cache_hits += 1;
                    m.tokens_saved += saved;
                });
                self.log().push(answer);
                tracing::info!(session = %self.id, agent = %agent.id, "answer served from cache");
                return TurnOutcome::Answered { text, cached: true };
            }
        }

        let started = Instant::now();
        match self.orchestrator.run(agent.clone(), input).await {
            Ok(text) => {
                self.with_metrics(|m| m.record_live(started.elapsed()));
                if self.config.semantic_cache {
                    self.cache.store(&key, text.clone());
                }
                self.log()
                    .push(ConversationMessage::assistant(text.clone(), agent.id.clone()));
                TurnOutcome::Answered {
                    text,
                    cached: false,
                }
            }
            Err(err) => {
                tracing::error!(session = %self.id, agent = %agent.id, error = %err, "orchestration failed");
                self.log()
                    .push(ConversationMessage::orchestration_error(err.to_string()));
                TurnOutcome::Failed {
                    message: err.user_message(),
                    retryable: err.is_retryable(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::Notify;

    use super::*;
    use crate::agent::{AgentRoster, Category};
    use crate::error::{AgentError, Result};
    use crate::message::Role;
    use crate::model::{GenerateRequest, ModelResponse, ReasoningModel, ScriptedModel};
    use crate::orchestrator::OrchestratorConfig;
    use crate::tool::ToolExecutor;

    struct NoTools;

    #[async_trait]
    impl ToolExecutor for NoTools {
        async fn execute(&self, _: &str, _: &Value, provider_id: &str) -> Result<Value> {
            Err(AgentError::auth_required(provider_id))
        }
    }

    /// Blocks inside `generate` until released
    #[derive(Default)]
    struct GatedModel {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ReasoningModel for GatedModel {
        fn name(&self) -> &str {
            "gated"
        }

        async fn generate(&self, _: &GenerateRequest) -> Result<ModelResponse> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(ModelResponse::text("done"))
        }
    }

    fn roster() -> Arc<AgentRoster> {
        Arc::new(AgentRoster::new([
            Agent::new("code-agent", "Code Agent", "Lead Developer", Category::Engineering),
            Agent::new("test-agent", "Test Agent", "QA Automation", Category::Quality),
        ]))
    }

    fn session(model: Arc<dyn ReasoningModel>, config: SessionConfig) -> Session {
        let orchestrator = Orchestrator::new(
            model,
            roster(),
            Arc::new(NoTools),
            ConversationLog::new(),
            OrchestratorConfig::default(),
        );
        Session::new(orchestrator, config)
    }

    fn agent(session: &Session, id: &str) -> Arc<Agent> {
        session.agents().find_by_id(id).unwrap()
    }

    #[tokio::test]
    async fn test_turn_appends_user_and_answer() {
        let model = Arc::new(ScriptedModel::new([ModelResponse::text("It is an LRU.")]));
        let session = session(model, SessionConfig::default());

        let outcome = session
            .execute_agent_task(agent(&session, "code-agent"), "explain the caching layer")
            .await;
        assert_eq!(
            outcome,
            TurnOutcome::Answered {
                text: "It is an LRU.".into(),
                cached: false
            }
        );

        let log = session.log().snapshot();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, Role::User);
        assert_eq!(log[1].agent_id.as_deref(), Some("code-agent"));
        assert_eq!(session.selected_agent().unwrap().id, "code-agent");
        assert_eq!(session.metrics().total_requests, 1);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_second_turn_rejected_while_busy() {
        let model = Arc::new(GatedModel::default());
        let session = Arc::new(session(model.clone(), SessionConfig::default()));

        let first = tokio::spawn({
            let session = session.clone();
            async move {
                let agent = agent(&session, "code-agent");
                session.execute_agent_task(agent, "first").await
            }
        });

        model.entered.notified().await;
        assert!(session.is_busy());

        let second = session
            .execute_agent_task(agent(&session, "test-agent"), "second")
            .await;
        assert_eq!(second, TurnOutcome::Rejected);
        assert_eq!(session.log().len(), 1);

        model.release.notify_one();
        assert!(matches!(first.await.unwrap(), TurnOutcome::Answered { .. }));
        assert_eq!(session.log().len(), 2);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_failure_appends_error_and_releases_gate() {
        let model = Arc::new(ScriptedModel::new([]));
        let session = session(model, SessionConfig::default());

        let outcome = session
            .execute_agent_task(agent(&session, "code-agent"), "anything")
            .await;
        assert_eq!(
            outcome,
            TurnOutcome::Failed {
                message: "The reasoning model encountered an error: script exhausted".into(),
                retryable: false,
            }
        );
        assert!(!session.is_busy());

        let last = session.log().last().unwrap();
        assert_eq!(last.role, Role::System);
        assert!(last.error);
        assert_eq!(last.content, "ORCHESTRATION_ERROR: Model error: script exhausted");
    }

    struct OfflineModel;

    #[async_trait]
    impl ReasoningModel for OfflineModel {
        fn name(&self) -> &str {
            "offline"
        }

        async fn generate(&self, _: &GenerateRequest) -> Result<ModelResponse> {
            Err(AgentError::ModelUnavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_unreachable_model_is_retryable() {
        let session = session(Arc::new(OfflineModel), SessionConfig::default());

        let outcome = session
            .execute_agent_task(agent(&session, "code-agent"), "anything")
            .await;
        assert!(matches!(outcome, TurnOutcome::Failed { retryable: true, .. }));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_cancelled_turn_releases_gate() {
        let model = Arc::new(GatedModel::default());
        let session = session(model.clone(), SessionConfig::default());

        let turn = session.execute_agent_task(agent(&session, "code-agent"), "slow");
        let cancelled = tokio::time::timeout(Duration::from_millis(10), turn).await;
        assert!(cancelled.is_err());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_cache_scoped_per_agent() {
        let model = Arc::new(ScriptedModel::new([ModelResponse::text("Use an LRU.")]));
        let config = SessionConfig {
            semantic_cache: true,
            ..Default::default()
        };
        let session = session(model.clone(), config);
        let code = agent(&session, "code-agent");

        session.execute_agent_task(code.clone(), "Caching?").await;
        let hit = session.execute_agent_task(code, "  caching? ").await;
        assert_eq!(
            hit,
            TurnOutcome::Answered {
                text: "Use an LRU.".into(),
                cached: true
            }
        );
        assert_eq!(model.call_count(), 1);
        assert!(session.log().last().unwrap().cached);

        let metrics = session.metrics();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.tokens_saved, 2);

        // Same prompt to another agent goes to the model, which has nothing left
        let other = session
            .execute_agent_task(agent(&session, "test-agent"), "caching?")
            .await;
        assert!(matches!(other, TurnOutcome::Failed { .. }));
        assert_eq!(model.call_count(), 2);
    }

    #[test]
    fn test_select_agent() {
        let session = session(Arc::new(ScriptedModel::default()), SessionConfig::default());
        assert!(session.selected_agent().is_none());
        assert!(session.select_agent("ghost").is_none());
        assert_eq!(session.select_agent("test-agent").unwrap().name, "Test Agent");
        assert_eq!(session.selected_agent().unwrap().id, "test-agent");
    }
}
