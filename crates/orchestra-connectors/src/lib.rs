//! # orchestra-connectors
//!
//! The provider side of the orchestra: a credential-gated registry that agents
//! reach through [`orchestra_core::ToolExecutor`], the catalog of providers a
//! human can link, and the bundled agent roster.
//!
//! ```text
//! DispatchClient ──▶ ProviderRegistry ──▶ CredentialVault ──▶ CredentialStore
//!                          │                                  (FileStore | MemoryStore)
//!                          ▼
//!                     PayloadMap (per-provider generators)
//! ```
//!
//! Provider calls are simulated: after the credential check the registry
//! sleeps a configurable latency and returns a fixed-shape payload for the
//! provider.

pub mod catalog;
pub mod credentials;
pub mod error;
pub mod payloads;
pub mod registry;
pub mod roster;

pub use catalog::{ConnectionStatus, ProviderCatalog, ProviderInfo, ProviderStatus};
pub use credentials::{CredentialStore, CredentialVault, FileStore, MemoryStore, TOKEN_KEY_PREFIX};
pub use error::{ConnectorError, Result};
pub use payloads::PayloadMap;
pub use registry::{BRIDGE_NODE, LatencyProfile, ProviderRegistry};
pub use roster::{default_agents, default_roster};
