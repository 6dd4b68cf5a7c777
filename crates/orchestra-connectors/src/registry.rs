//! Provider Registry
//!
//! Executes tool calls against providers on behalf of the dispatch client.
//! Credentials are checked before anything else: a provider without a token
//! fails immediately and never sees the call.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use orchestra_core::tool::{ToolExecutor, is_internal_provider};
use orchestra_core::{AgentError, Result};
use rand::Rng;
use serde_json::{Map, Value, json};

use crate::credentials::CredentialVault;
use crate::payloads::PayloadMap;

/// Node id reported in every payload's `_metadata`
pub const BRIDGE_NODE: &str = "bridge-v3-mfa";

/// Simulated provider round-trip time: `min_ms` plus up to `jitter_ms`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatencyProfile {
    pub min_ms: u64,
    pub jitter_ms: u64,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            min_ms: 600,
            jitter_ms: 400,
        }
    }
}

impl LatencyProfile {
    /// No simulated latency
    pub const fn none() -> Self {
        Self {
            min_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Parse `"min,jitter"` or a bare `"min"`
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split(',').map(str::trim);
        let min_ms = parts.next()?.parse().ok()?;
        let jitter_ms = match parts.next() {
            Some(j) => j.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { min_ms, jitter_ms })
    }

    /// Draw one delay
    pub fn sample(&self) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..self.jitter_ms)
        };
        Duration::from_millis(self.min_ms.saturating_add(jitter))
    }
}

/// Credential-gated provider bridge
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    vault: CredentialVault,
    payloads: PayloadMap,
    latency: LatencyProfile,
}

impl ProviderRegistry {
    pub fn new(vault: CredentialVault) -> Self {
        Self {
            vault,
            payloads: PayloadMap::builtin(),
            latency: LatencyProfile::default(),
        }
    }

    #[must_use]
    pub fn with_payloads(mut self, payloads: PayloadMap) -> Self {
        self.payloads = payloads;
        self
    }

    #[must_use]
    pub const fn with_latency(mut self, latency: LatencyProfile) -> Self {
        self.latency = latency;
        self
    }

    pub const fn vault(&self) -> &CredentialVault {
        &self.vault
    }
}

#[async_trait]
impl ToolExecutor for ProviderRegistry {
    async fn execute(&self, tool_name: &str, args: &Value, provider_id: &str) -> Result<Value> {
        if !is_internal_provider(provider_id) && self.vault.get_token(provider_id).await?.is_none() {
            tracing::warn!(provider = %provider_id, tool = %tool_name, "no token stored for provider");
            return Err(AgentError::auth_required(provider_id));
        }

        let started = Instant::now();
        let delay = self.latency.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let payload = self.payloads.generate(provider_id, tool_name, args);
        let mut body = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".into(), other);
                map
            }
        };
        let latency = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        body.insert(
            "_metadata".into(),
            json!({ "latency": latency, "node": BRIDGE_NODE }),
        );

        tracing::debug!(provider = %provider_id, tool = %tool_name, latency, "provider call simulated");
        Ok(Value::Object(body))
    }
}
