//! Server configuration, loaded from TOML.
//!
//! ```toml
//! bind = "0.0.0.0:8080"
//! ws_path = "/ws"
//! health_path = "/_health"
//! request_timeout_secs = 30
//! max_body_bytes = 2097152
//! ```
//!
//! Every key is optional.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,
    /// Route of the WebSocket command endpoint.
    pub ws_path: String,
    pub health_path: String,
    /// Timeout applied by outbound HTTP clients.
    pub request_timeout_secs: u64,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3030)),
            ws_path: "/ws".to_string(),
            health_path: "/_health".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, path) in [("ws_path", &self.ws_path), ("health_path", &self.health_path)] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{} must start with '/', got {:?}",
                    key, path
                )));
            }
        }
        if self.ws_path == self.health_path {
            return Err(ConfigError::Invalid(format!(
                "ws_path and health_path are both {:?}",
                self.ws_path
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = ServerConfig::from_toml_str(&content)?;
    tracing::debug!(path = %path.display(), bind = %config.bind, "loaded server config");
    Ok(config)
}
