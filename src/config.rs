// Server configuration
// Loaded from an optional TOML file, then overridden by command-line flags

use crate::query::{ClassificationMode, OpenOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the binary needs to open the store and serve it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Host to bind to (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the SQLite vocabulary store (default: "GRE_3333.db")
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Open the store read-only (default: true)
    #[serde(default = "default_read_only")]
    pub read_only: bool,

    /// Statement classification rule (default: substring)
    #[serde(default)]
    pub classification: ClassificationMode,

    /// Tables described by `GET /db/format` (default: Vocabulary, Meaning)
    #[serde(default = "default_format_tables")]
    pub format_tables: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("GRE_3333.db")
}

fn default_read_only() -> bool {
    true
}

fn default_format_tables() -> Vec<String> {
    vec!["Vocabulary".to_string(), "Meaning".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            read_only: default_read_only(),
            classification: ClassificationMode::default(),
            format_tables: default_format_tables(),
        }
    }
}

impl ServerConfig {
    /// Read a config file, falling back to defaults for missing keys
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Options for opening the store
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            read_only: self.read_only,
            classification: self.classification,
        }
    }
}
