//! Provider Catalog
//!
//! The providers a human can link, with display metadata. Connection state is
//! never stored here; it is derived from the credential vault on every read.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialVault;
use crate::error::{ConnectorError, Result};

/// Display metadata for a linkable provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
}

impl ProviderInfo {
    fn new(id: &str, name: &str, icon: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            description: description.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    /// A link write is in progress
    Connecting,
    Connected,
}

/// Provider with its current connection state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    #[serde(flatten)]
    pub info: ProviderInfo,
    pub status: ConnectionStatus,
}

/// The bundled linkable providers in display order
pub fn default_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo::new("jira", "Jira Software", "🎫", "Backlog and Sprint management."),
        ProviderInfo::new("miro", "Miro Board", "🖼️", "Discovery and flow mapping."),
        ProviderInfo::new("seo_perf", "SEO Performance", "⚡", "Lighthouse and Core Web Vitals."),
        ProviderInfo::new("google_search", "Google Search", "🔍", "Real-time web search."),
        ProviderInfo::new("grafana", "Grafana Labs", "📈", "Real-time SRE observability."),
        ProviderInfo::new("github", "GitHub Enterprise", "🐙", "V3 REST Production API."),
        ProviderInfo::new("slack", "Slack Ops", "💬", "Internal team communication."),
        ProviderInfo::new("figma", "Figma Cloud", "🎨", "Design tokens and assets."),
        ProviderInfo::new("aws", "AWS Production", "☁️", "IAM-scoped cloud infrastructure."),
        ProviderInfo::new("stripe", "Stripe Finance", "💳", "Financial telemetry and billing."),
        ProviderInfo::new(
            "instagram",
            "Instagram Business",
            "📸",
            "Social media management and publishing.",
        ),
    ]
}

/// Linkable providers over a credential vault
#[derive(Debug)]
pub struct ProviderCatalog {
    providers: Vec<ProviderInfo>,
    vault: CredentialVault,
    linking: Mutex<HashSet<String>>,
}

impl ProviderCatalog {
    pub fn new(providers: Vec<ProviderInfo>, vault: CredentialVault) -> Self {
        Self {
            providers,
            vault,
            linking: Mutex::new(HashSet::new()),
        }
    }

    /// Catalog of the bundled providers
    pub fn with_defaults(vault: CredentialVault) -> Self {
        Self::new(default_providers(), vault)
    }

    pub fn find(&self, provider_id: &str) -> Option<&ProviderInfo> {
        self.providers.iter().find(|p| p.id == provider_id)
    }

    pub const fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    fn is_linking(&self, provider_id: &str) -> bool {
        self.linking
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(provider_id)
    }

    fn set_linking(&self, provider_id: &str, linking: bool) {
        let mut set = self
            .linking
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if linking {
            set.insert(provider_id.to_owned());
        } else {
            set.remove(provider_id);
        }
    }

    pub async fn status(&self, provider_id: &str) -> Result<ConnectionStatus> {
        if self.is_linking(provider_id) {
            return Ok(ConnectionStatus::Connecting);
        }
        Ok(if self.vault.get_token(provider_id).await?.is_some() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        })
    }

    /// Every provider with its state derived from the vault
    pub async fn snapshot(&self) -> Result<Vec<ProviderStatus>> {
        let mut out = Vec::with_capacity(self.providers.len());
        for info in &self.providers {
            let status = self.status(&info.id).await?;
            out.push(ProviderStatus {
                info: info.clone(),
                status,
            });
        }
        Ok(out)
    }

    /// Store a token for a catalog provider
    pub async fn link(&self, provider_id: &str, token: &str) -> Result<ProviderStatus> {
        let info = self
            .find(provider_id)
            .cloned()
            .ok_or_else(|| ConnectorError::UnknownProvider(provider_id.to_owned()))?;

        self.set_linking(provider_id, true);
        let stored = self.vault.set_token(provider_id, Some(token)).await;
        self.set_linking(provider_id, false);
        stored?;

        tracing::info!(provider = %provider_id, "provider linked");
        Ok(ProviderStatus {
            info,
            status: ConnectionStatus::Connected,
        })
    }

    /// Forget the token for a catalog provider
    pub async fn unlink(&self, provider_id: &str) -> Result<ProviderStatus> {
        let info = self
            .find(provider_id)
            .cloned()
            .ok_or_else(|| ConnectorError::UnknownProvider(provider_id.to_owned()))?;

        self.vault.set_token(provider_id, None).await?;
        tracing::info!(provider = %provider_id, "provider unlinked");
        Ok(ProviderStatus {
            info,
            status: ConnectionStatus::Disconnected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_follows_vault() {
        let vault = CredentialVault::in_memory();
        vault.set_token("slack", Some("xoxb")).await.unwrap();
        let catalog = ProviderCatalog::with_defaults(vault);

        let snapshot = catalog.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 11);
        for p in &snapshot {
            let expected = if p.info.id == "slack" {
                ConnectionStatus::Connected
            } else {
                ConnectionStatus::Disconnected
            };
            assert_eq!(p.status, expected, "{}", p.info.id);
        }
    }

    #[tokio::test]
    async fn test_link_and_unlink() {
        let catalog = ProviderCatalog::with_defaults(CredentialVault::in_memory());

        let linked = catalog.link("figma", "figd_1").await.unwrap();
        assert_eq!(linked.status, ConnectionStatus::Connected);
        assert!(catalog.vault().is_authenticated("figma").await.unwrap());

        catalog.unlink("figma").await.unwrap();
        assert_eq!(
            catalog.status("figma").await.unwrap(),
            ConnectionStatus::Disconnected
        );
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let catalog = ProviderCatalog::with_defaults(CredentialVault::in_memory());
        assert!(matches!(
            catalog.link("postgres", "pw").await,
            Err(ConnectorError::UnknownProvider(_))
        ));
        assert!(catalog.link("jira", "").await.is_err());
        assert_eq!(catalog.status("jira").await.unwrap(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_serialized_shape() {
        let status = ProviderStatus {
            info: default_providers().remove(0),
            status: ConnectionStatus::Connecting,
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["id"], "jira");
        assert_eq!(json["status"], "connecting");
    }
}
