//! Configuration - endpoints, names and limits, optionally loaded from JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Everything the relay and the routing client need to know about their peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON-RPC endpoint of the MCP peer
    pub mcp_url: String,
    /// Tool returning the dynamic document categories
    pub tool_name: String,
    /// Prompt template used to route a member query
    pub prompt_name: String,
    /// Curated resources live at `{resource_prefix}{context}`
    pub resource_prefix: String,
    /// Query used when none is given on the command line
    pub member_query: String,
    pub relay: RelayConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    pub path: String,
    pub source_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub classify_max_tokens: u32,
    pub summarize_max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mcp_url: "http://localhost:4444/mcp/fd477fc295cf488da8c16219e2af894b".to_string(),
            tool_name: "employerassestfastapi-local".to_string(),
            prompt_name: "behavioral-health-context-router".to_string(),
            resource_prefix: "resource://bcbsnc/".to_string(),
            member_query: "I am struggling with drug and alcohol overuse".to_string(),
            relay: RelayConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            path: "/behavior-health".to_string(),
            source_url: "https://assets.bcbsnc.com/assets/employer/content/healthandwellness/endpoints/behaviourHealth.json".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com/v1".to_string(),
            model: "claude-sonnet-4-6".to_string(),
            classify_max_tokens: 100,
            summarize_max_tokens: 500,
        }
    }
}

impl Config {
    /// Load from the default location (~/.config/bhrouter/config.json)
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bhrouter").join("config.json"))
    }

    /// URI of the curated resource for a context.
    pub fn resource_uri(&self, context: impl std::fmt::Display) -> String {
        format!("{}{}", self.resource_prefix, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.tool_name, "employerassestfastapi-local");
        assert_eq!(config.relay.path, "/behavior-health");
        assert_eq!(config.llm.classify_max_tokens, 100);
        assert_eq!(config.llm.summarize_max_tokens, 500);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mcp_url": "http://127.0.0.1:9000/mcp", "relay": {{"bind": "0.0.0.0:8080"}}}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.mcp_url, "http://127.0.0.1:9000/mcp");
        assert_eq!(config.relay.bind.port(), 8080);
        assert_eq!(config.relay.path, "/behavior-health");
        assert_eq!(config.prompt_name, "behavioral-health-context-router");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn resource_uri_joins_prefix_and_context() {
        let config = Config::default();
        assert_eq!(config.resource_uri("youth-bh"), "resource://bcbsnc/youth-bh");
    }
}
