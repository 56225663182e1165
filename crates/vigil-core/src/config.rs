//! Configuration loading for the Vigil service.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file
//! (an explicit `--config` path, or `<config dir>/vigil/config.toml` when
//! present), then `VIGIL_*` environment overrides. Every section has a
//! usable default so the service starts with no file at all; the edge and
//! LLM credentials are the only values that genuinely need to be supplied
//! before a live session can run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VigilConfig {
    pub server: ServerConfig,
    pub edge: EdgeConfig,
    pub llm: LlmConfig,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Video-edge credentials and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EdgeConfig {
    /// Public API key of the edge application.
    pub api_key: String,
    /// Server-side token used to authenticate REST calls.
    pub api_token: String,
    pub base_url: String,
    /// Base of the hosted demo UI the human participant is sent to.
    pub demo_base_url: String,
    pub agent_user_id: String,
    pub agent_user_name: String,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_token: String::new(),
            base_url: "https://video.stream-io-api.com".to_string(),
            demo_base_url: "https://pronto.getstream.io".to_string(),
            agent_user_id: "agent".to_string(),
            agent_user_name: "Wellness Assistant".to_string(),
        }
    }
}

/// Hosted LLM settings for the conversational collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

impl VigilConfig {
    /// Load configuration with the standard layering.
    ///
    /// An explicit `path` must exist and parse; the default location is
    /// only used when the file is actually there.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/vigil/config.toml`, when a config dir is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vigil").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("VIGIL_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("VIGIL_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(%port, "ignoring unparsable VIGIL_PORT"),
            }
        }
        if let Ok(key) = std::env::var("VIGIL_EDGE_API_KEY") {
            self.edge.api_key = key;
        }
        if let Ok(token) = std::env::var("VIGIL_EDGE_TOKEN") {
            self.edge.api_token = token;
        }
        if let Ok(key) = std::env::var("VIGIL_LLM_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(model) = std::env::var("VIGIL_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = std::env::var("VIGIL_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_bind_the_demo_port() {
        let config = VigilConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert!(config.edge.api_key.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[llm]\nmodel = \"gemini-exp\"\n"
        )
        .unwrap();

        let config = VigilConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.model, "gemini-exp");
        assert_eq!(config.edge.agent_user_id, "agent");
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server = \"not a table\"").unwrap();

        let err = VigilConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = VigilConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
