//! # Configuration
//!
//! Optional TOML configuration file, layered under CLI flags.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! rate_limit = 100
//! cors_origins = "https://portal.example.org"
//!
//! [storage]
//! database = "incubator.db"
//! backend = "redb"
//! ```
//!
//! Precedence, highest first: CLI flag, environment variable (server
//! settings only, see [`crate::api`]), file value, built-in default.

use crate::AppError;
use clap::ValueEnum;
use incubator_core::StorageBackend;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default database path when neither flag nor file names one.
pub const DEFAULT_DATABASE: &str = "incubator.db";

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// FILE CONFIG
// =============================================================================

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

impl FileConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            AppError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(AppError::Config(format!(
                "Config file size {} bytes exceeds maximum {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }
}

/// `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests per second, 0 disables rate limiting.
    pub rate_limit: u32,
    /// Comma-separated allowed origins, or `"*"`.
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: 100,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// Apply `--host` / `--port` flags on top of file values.
    #[must_use]
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Storage backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Volatile in-process map.
    Memory,
    /// redb database file.
    #[default]
    Redb,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Redb => "redb",
        }
    }
}

/// `[storage]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub database: Option<PathBuf>,
    pub backend: Option<BackendKind>,
}

impl StorageConfig {
    /// Resolve the effective storage settings, CLI flags winning.
    #[must_use]
    pub fn resolve(
        &self,
        database: Option<&Path>,
        backend: Option<BackendKind>,
    ) -> StorageSettings {
        StorageSettings {
            database: database
                .map(Path::to_path_buf)
                .or_else(|| self.database.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            backend: backend.or(self.backend).unwrap_or_default(),
        }
    }
}

/// Effective storage selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub database: PathBuf,
    pub backend: BackendKind,
}

impl StorageSettings {
    /// Open the selected backend.
    pub fn open(&self) -> Result<StorageBackend, AppError> {
        match self.backend {
            BackendKind::Memory => Ok(StorageBackend::default()),
            BackendKind::Redb => Ok(StorageBackend::redb(&self.database)?),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
