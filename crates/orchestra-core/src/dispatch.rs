//! Dispatch Client
//!
//! Interprets one function call requested by the reasoning model on behalf of
//! a single agent. Delegation calls go to the supplied [`Delegator`], external
//! calls go to the provider registry, and both are normalized into a
//! `{result}` / `{error}` envelope.
//!
//! Only a missing credential is raised to the caller; every other failure is
//! returned inline so the model still receives a well-formed tool response.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::agent::Agent;
use crate::error::{AgentError, ErrorKind, Result};
use crate::tool::{DELEGATE_FUNCTION, FunctionCall, ToolDeclaration, ToolExecutor};

/// Receives dispatch log lines
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Handles `delegate_to_agent` calls.
///
/// Target resolution belongs to the implementor: an unknown agent id must come
/// back as an `Ok` result string, not an error.
#[async_trait]
pub trait Delegator: Send + Sync {
    async fn delegate(&self, agent_id: &str, task: &str) -> Result<String>;
}

/// Normalized outcome of one dispatched call
#[derive(Clone, Debug, PartialEq)]
pub enum CallOutcome {
    /// Tool or delegation produced a payload
    Success(Value),
    /// Call could not be satisfied; reported to the model, never raised
    Failed { kind: ErrorKind, message: String },
}

impl CallOutcome {
    fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }

    /// Envelope handed back to the model as the function response
    pub fn into_response(self) -> Value {
        match self {
            Self::Success(payload) => json!({ "result": payload }),
            Self::Failed { message, .. } => json!({ "error": message }),
        }
    }
}

/// Per-agent function call interpreter
pub struct DispatchClient {
    agent: Arc<Agent>,
    executor: Arc<dyn ToolExecutor>,
    log: LogSink,
}

impl DispatchClient {
    /// Create a client whose log lines go to `tracing` at debug level
    pub fn new(agent: Arc<Agent>, executor: Arc<dyn ToolExecutor>) -> Self {
        let agent_id = agent.id.clone();
        let log: LogSink = Arc::new(move |line: &str| {
            tracing::debug!(agent = %agent_id, "{line}");
        });
        Self {
            agent,
            executor,
            log,
        }
    }

    /// Replace the logging sink
    #[must_use]
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log = sink;
        self
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    fn log(&self, line: &str) {
        (self.log)(line);
    }

    /// Declarations for exactly the tools declared on the bound agent
    pub fn list_tool_declarations(&self) -> Vec<ToolDeclaration> {
        self.agent.tool_declarations()
    }

    /// Resolve and execute one function call.
    ///
    /// Returns `Err` only for [`AgentError::AuthRequired`] or for a failure
    /// raised by the delegated sub-turn itself.
    pub async fn handle_call(
        &self,
        call: &FunctionCall,
        delegator: &dyn Delegator,
    ) -> Result<CallOutcome> {
        let Some(name) = call.name() else {
            self.log("Error: function call missing name");
            return Ok(CallOutcome::failed(
                ErrorKind::MalformedCall,
                ErrorKind::MalformedCall.as_str(),
            ));
        };

        self.log(&format!("Inbound call: {name}"));

        if name == DELEGATE_FUNCTION {
            let agent_id = call.str_arg("agent_id").unwrap_or_default();
            let task = call.str_arg("task").unwrap_or_default();
            self.log(&format!("Routing delegation: internal_orchestra -> {agent_id}"));
            let result = delegator.delegate(agent_id, task).await?;
            return Ok(CallOutcome::Success(Value::String(result)));
        }

        let Some(tool) = self.agent.find_tool(name) else {
            self.log(&format!("Error: tool {name} not declared on agent"));
            return Ok(CallOutcome::failed(
                ErrorKind::ToolNotFound,
                ErrorKind::ToolNotFound.as_str(),
            ));
        };

        self.log(&format!("Dispatching to provider: {}", tool.provider));

        let args = if call.args.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            call.args.clone()
        };

        match self.executor.execute(name, &args, &tool.provider).await {
            Ok(payload) => {
                let latency = payload
                    .pointer("/_metadata/latency")
                    .and_then(Value::as_u64)
                    .unwrap_or_default();
                self.log(&format!("Provider response: success (latency: {latency}ms)"));
                Ok(CallOutcome::Success(payload))
            }
            Err(err @ AgentError::AuthRequired { .. }) => {
                self.log(&format!(
                    "Auth failure: {} requires a valid session",
                    tool.provider
                ));
                Err(err)
            }
            Err(err) => {
                self.log(&format!("Provider error: {err}"));
                Ok(CallOutcome::failed(ErrorKind::ProviderError, err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::agent::Category;
    use crate::tool::{ParamType, ParameterSchema, ToolSpec};

    /// Executor that counts calls and fails the way it is told to
    #[derive(Default)]
    struct FakeExecutor {
        calls: AtomicUsize,
        fail_with: Mutex<Option<fn() -> AgentError>>,
    }

    #[async_trait]
    impl ToolExecutor for FakeExecutor {
        async fn execute(&self, tool_name: &str, args: &Value, provider_id: &str) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(make_err) = *self.fail_with.lock().unwrap() {
                return Err(make_err());
            }
            Ok(json!({
                "tool": tool_name,
                "provider": provider_id,
                "args": args,
                "_metadata": {"latency": 3, "node": "test"},
            }))
        }
    }

    struct EchoDelegator;

    #[async_trait]
    impl Delegator for EchoDelegator {
        async fn delegate(&self, agent_id: &str, task: &str) -> Result<String> {
            Ok(format!("{agent_id} did {task}"))
        }
    }

    fn marketing_agent() -> Arc<Agent> {
        Arc::new(
            Agent::new("marketing-agent", "Marketing Agent", "Growth Strategist", Category::Marketing)
                .tool(
                    ToolSpec::new("post_instagram_video", "Posts a video", "instagram")
                        .param(ParameterSchema::required("caption", ParamType::String, "Caption")),
                ),
        )
    }

    #[tokio::test]
    async fn test_missing_name_is_malformed() {
        let executor = Arc::new(FakeExecutor::default());
        let client = DispatchClient::new(marketing_agent(), executor.clone());

        for name in [None, Some(String::new())] {
            let call = FunctionCall {
                name,
                ..Default::default()
            };
            let outcome = client.handle_call(&call, &EchoDelegator).await.unwrap();
            assert_eq!(outcome.error_kind(), Some(ErrorKind::MalformedCall));
        }
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_returned_inline() {
        let executor = Arc::new(FakeExecutor::default());
        let client = DispatchClient::new(marketing_agent(), executor.clone());

        let outcome = client
            .handle_call(&FunctionCall::new("drop_tables", json!({})), &EchoDelegator)
            .await
            .unwrap();
        assert_eq!(outcome.clone().into_response(), json!({"error": "TOOL_NOT_FOUND"}));
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_external_tool_success_wraps_result() {
        let executor = Arc::new(FakeExecutor::default());
        let client = DispatchClient::new(marketing_agent(), executor);

        let outcome = client
            .handle_call(
                &FunctionCall::new("post_instagram_video", json!({"caption": "launch"})),
                &EchoDelegator,
            )
            .await
            .unwrap();
        let response = outcome.into_response();
        assert_eq!(response["result"]["provider"], "instagram");
        assert_eq!(response["result"]["args"]["caption"], "launch");
    }

    #[tokio::test]
    async fn test_auth_failure_is_raised() {
        let executor = Arc::new(FakeExecutor::default());
        *executor.fail_with.lock().unwrap() = Some(|| AgentError::auth_required("instagram"));
        let client = DispatchClient::new(marketing_agent(), executor);

        let err = client
            .handle_call(&FunctionCall::new("post_instagram_video", json!({})), &EchoDelegator)
            .await
            .unwrap_err();
        assert_eq!(err.auth_provider(), Some("instagram"));
    }

    #[tokio::test]
    async fn test_other_provider_failure_returned_inline() {
        let executor = Arc::new(FakeExecutor::default());
        *executor.fail_with.lock().unwrap() = Some(|| AgentError::Provider("rate limited".into()));
        let client = DispatchClient::new(marketing_agent(), executor);

        let outcome = client
            .handle_call(&FunctionCall::new("post_instagram_video", json!({})), &EchoDelegator)
            .await
            .unwrap();
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ProviderError));
        assert_eq!(
            outcome.into_response()["error"],
            "Provider error: rate limited"
        );
    }

    #[tokio::test]
    async fn test_delegation_uses_callback_for_any_agent() {
        let executor = Arc::new(FakeExecutor::default());
        // The marketing agent does not declare delegate_to_agent
        let client = DispatchClient::new(marketing_agent(), executor.clone());

        let outcome = client
            .handle_call(
                &FunctionCall::new(
                    DELEGATE_FUNCTION,
                    json!({"agent_id": "code-agent", "task": "review"}),
                ),
                &EchoDelegator,
            )
            .await
            .unwrap();
        assert_eq!(outcome.into_response(), json!({"result": "code-agent did review"}));
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_log_sink_receives_lines() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink_lines = lines.clone();
        let client = DispatchClient::new(marketing_agent(), Arc::new(FakeExecutor::default()))
            .with_log_sink(Arc::new(move |l: &str| sink_lines.lock().unwrap().push(l.to_owned())));

        client
            .handle_call(&FunctionCall::new("post_instagram_video", json!({})), &EchoDelegator)
            .await
            .unwrap();
        let lines = lines.lock().unwrap();
        assert_eq!(lines[0], "Inbound call: post_instagram_video");
        assert!(lines.iter().any(|l| l.contains("latency: 3ms")));
    }

    #[test]
    fn test_declarations_match_agent_tools() {
        let client = DispatchClient::new(marketing_agent(), Arc::new(FakeExecutor::default()));
        let decls = client.list_tool_declarations();
        assert_eq!(decls.len(), client.agent().tools.len());
        assert_eq!(decls[0].name, "post_instagram_video");
        assert_eq!(client.list_tool_declarations(), decls);
    }
}
