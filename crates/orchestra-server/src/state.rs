//! Application State

use std::sync::Arc;

use orchestra_connectors::{CredentialVault, ProviderCatalog, ProviderRegistry, default_roster};
use orchestra_core::model::GenerationOptions;
use orchestra_core::{
    ConversationLog, Orchestrator, OrchestratorConfig, ReasoningModel, Session, SessionConfig,
    VoiceRouter,
};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The single conversation this server drives
    pub session: Arc<Session>,

    /// Linkable providers over the credential vault
    pub catalog: Arc<ProviderCatalog>,

    /// Voice conversation window
    pub voice: Arc<VoiceRouter>,

    /// Reasoning backend, kept for health checks
    pub model: Arc<dyn ReasoningModel>,
}

impl AppState {
    /// Wire the session, registry and catalog around one credential vault
    pub fn new(model: Arc<dyn ReasoningModel>, vault: CredentialVault, config: &ServerConfig) -> Self {
        let registry = ProviderRegistry::new(vault.clone()).with_latency(config.tool_latency);
        let orchestrator = Orchestrator::new(
            model.clone(),
            Arc::new(default_roster()),
            Arc::new(registry),
            ConversationLog::new(),
            OrchestratorConfig {
                max_delegation_depth: config.max_delegation_depth,
                generation: GenerationOptions {
                    model: config.model.clone(),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        let session = Session::new(
            orchestrator,
            SessionConfig {
                semantic_cache: config.semantic_cache,
                ..Default::default()
            },
        );

        Self {
            session: Arc::new(session),
            catalog: Arc::new(ProviderCatalog::with_defaults(vault)),
            voice: Arc::new(VoiceRouter::default()),
            model,
        }
    }
}
