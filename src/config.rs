use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::SlateError;

/// Connection settings for one SFTP session.
///
/// Immutable once a session starts. The CLI loads this from a TOML file;
/// library callers construct it directly. Validation happens upfront via
/// [`ConnectionConfig::validate`] so a misconfigured session fails before
/// any network activity.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub username: String,
    pub private_key_path: PathBuf,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Remote directory used when an operation is given no explicit one.
    #[serde(default)]
    pub default_remote_dir: Option<String>,
    /// Timeout for establishing the connection (TCP + handshake + auth).
    /// No timeout when absent.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

fn default_port() -> u16 {
    22
}

impl ConnectionConfig {
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        private_key_path: impl Into<PathBuf>,
    ) -> Self {
        ConnectionConfig {
            hostname: hostname.into(),
            username: username.into(),
            private_key_path: private_key_path.into(),
            port: default_port(),
            default_remote_dir: None,
            connect_timeout_secs: None,
        }
    }

    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SlateError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SlateError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: ConnectionConfig = toml::from_str(&raw).map_err(|e| {
            SlateError::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the fields required for connecting are present.
    pub fn validate(&self) -> Result<(), SlateError> {
        if self.hostname.trim().is_empty() {
            return Err(SlateError::Configuration("hostname is empty".into()));
        }
        if self.username.trim().is_empty() {
            return Err(SlateError::Configuration("username is empty".into()));
        }
        if self.private_key_path.as_os_str().is_empty() {
            return Err(SlateError::Configuration("private_key_path is empty".into()));
        }
        if self.port == 0 {
            return Err(SlateError::Configuration("port must be non-zero".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Resolve the directory an operation targets: the explicit argument,
    /// else the configured default, else the remote login directory.
    pub fn resolve_remote_dir(&self, dir: Option<&str>) -> String {
        match dir {
            Some(d) => d.to_string(),
            None => self
                .default_remote_dir
                .clone()
                .unwrap_or_else(|| ".".to_string()),
        }
    }
}
