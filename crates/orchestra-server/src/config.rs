//! Server Configuration
//!
//! Read from the process environment (after `.env` is loaded). Parsing goes
//! through a lookup function so it can be exercised without touching the
//! real environment.

use std::path::PathBuf;

use orchestra_connectors::LatencyProfile;
use orchestra_runtime::OllamaConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: expected {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("model backend: {0}")]
    Backend(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub model: String,
    pub credentials_path: PathBuf,
    pub max_delegation_depth: usize,
    pub semantic_cache: bool,
    pub tool_latency: LatencyProfile,
    pub ollama: OllamaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            model: "llama3.2".into(),
            credentials_path: PathBuf::from(".orchestra/credentials.json"),
            max_delegation_depth: 3,
            semantic_cache: false,
            tool_latency: LatencyProfile::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            expected: "a boolean",
            value: value.to_owned(),
        }),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_delegation_depth = match get("ORCHESTRA_MAX_DELEGATION_DEPTH") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "ORCHESTRA_MAX_DELEGATION_DEPTH",
                expected: "a non-negative integer",
                value: v.clone(),
            })?,
            None => defaults.max_delegation_depth,
        };

        let semantic_cache = match get("ORCHESTRA_SEMANTIC_CACHE") {
            Some(v) => parse_flag("ORCHESTRA_SEMANTIC_CACHE", &v)?,
            None => defaults.semantic_cache,
        };

        let tool_latency = match get("ORCHESTRA_TOOL_LATENCY_MS") {
            Some(v) => LatencyProfile::parse(&v).ok_or_else(|| ConfigError::Invalid {
                key: "ORCHESTRA_TOOL_LATENCY_MS",
                expected: "\"min,jitter\" in milliseconds",
                value: v.clone(),
            })?,
            None => defaults.tool_latency,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            model: get("ORCHESTRA_MODEL").unwrap_or(defaults.model),
            credentials_path: get("ORCHESTRA_CREDENTIALS_PATH")
                .map_or(defaults.credentials_path, PathBuf::from),
            max_delegation_depth,
            semantic_cache,
            tool_latency,
            ollama: OllamaConfig::from_lookup(&lookup)
                .map_err(|e| ConfigError::Backend(e.to_string()))?,
        })
    }
}
