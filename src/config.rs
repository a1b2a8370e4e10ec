//! Deployment configuration, persisted as TOML.
//!
//! Every field has a serde default, so an empty file (or no file at all)
//! yields a working in-memory setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::store::DEFAULT_MAX_COMPOUND_LEN;

/// Environment variable overriding [`MaterialsConfig::bind`].
pub const ENV_BIND: &str = "MATERIALS_BIND";
/// Environment variable overriding [`MaterialsConfig::port`].
pub const ENV_PORT: &str = "MATERIALS_PORT";

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialsConfig {
    /// Directory for the redb store. None means in-memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Whether free-text search is available.
    #[serde(default = "default_full_text")]
    pub full_text: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Longest accepted compound string, in characters.
    #[serde(default = "default_max_compound_len")]
    pub max_compound_len: usize,
}

fn default_full_text() -> bool {
    true
}
fn default_bind() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_max_compound_len() -> usize {
    DEFAULT_MAX_COMPOUND_LEN
}

impl Default for MaterialsConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            full_text: default_full_text(),
            bind: default_bind(),
            port: default_port(),
            log_filter: default_log_filter(),
            max_compound_len: default_max_compound_len(),
        }
    }
}

impl MaterialsConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Apply `MATERIALS_BIND` / `MATERIALS_PORT` when set.
    ///
    /// An unparsable port is ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_BIND).ok(),
            std::env::var(ENV_PORT).ok(),
        );
        self
    }

    fn apply_overrides(&mut self, bind: Option<String>, port: Option<String>) {
        if let Some(bind) = bind.filter(|b| !b.trim().is_empty()) {
            self.bind = bind;
        }
        if let Some(port) = port {
            match port.trim().parse() {
                Ok(p) => self.port = p,
                Err(_) => tracing::warn!(%port, "ignoring invalid {ENV_PORT}"),
            }
        }
    }

    /// `bind:port`, ready for a listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
