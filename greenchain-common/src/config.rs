//! Configuration loading and path resolution
//!
//! Bootstrap configuration comes from a TOML file. The file location is
//! resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`GREENCHAIN_CONFIG`)
//! 3. Per-user config file (`~/.config/greenchain/config.toml`)
//! 4. Compiled defaults (no file)
//!
//! A missing config file is never fatal: a warning is logged and the
//! compiled defaults are used.

use crate::models::AdvancedDetection;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "GREENCHAIN_CONFIG";

/// Longest accepted bearer-token lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Bootstrap configuration loaded from TOML
///
/// Every field has a compiled default, so an empty file is a valid config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Path to the SQLite database file. Defaults to the platform data dir.
    pub database_path: Option<PathBuf>,

    /// Address the HTTP server binds to
    pub bind_address: String,

    /// Path prefix all API routes are mounted under ("" = root)
    pub api_prefix: String,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,

    /// Lifetime of issued bearer tokens
    pub session_ttl_hours: i64,

    /// Alternate curriculum catalog (JSON). Built-in catalog when unset.
    pub curriculum_path: Option<PathBuf>,

    pub logging: LoggingConfig,

    pub recommendations: RecommendationConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            bind_address: "127.0.0.1:5740".to_string(),
            api_prefix: String::new(),
            max_body_bytes: 10 * 1024 * 1024,
            session_ttl_hours: 24 * 7,
            curriculum_path: None,
            logging: LoggingConfig::default(),
            recommendations: RecommendationConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Recommendation behavior
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// How lessons are classified as advanced when a module is tagged "advanced"
    pub advanced_detection: AdvancedDetection,
}

impl TomlConfig {
    /// Load configuration from `path`, or compiled defaults when `path` is None
    ///
    /// A path that does not exist yields defaults with a warning. A file that
    /// exists but does not parse is a configuration error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No config file found, using compiled defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_hours <= 0 {
            return Err(Error::Config(
                "session_ttl_hours must be positive".to_string(),
            ));
        }
        if self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(Error::Config(format!(
                "session_ttl_hours must be at most {}",
                MAX_SESSION_TTL_HOURS
            )));
        }
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(Error::Config(format!(
                "api_prefix must start with '/': {:?}",
                self.api_prefix
            )));
        }
        Ok(())
    }

    /// Database path, falling back to the platform default
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Resolve which config file to read
///
/// Returns None when no candidate applies (compiled defaults are used).
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file, only if it exists
    dirs::config_dir()
        .map(|d| d.join("greenchain").join("config.toml"))
        .filter(|p| p.exists())
}

/// OS-dependent default data folder
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("greenchain"))
        .unwrap_or_else(|| PathBuf::from("./greenchain_data"))
}

/// Default database file inside the data folder
pub fn default_database_path() -> PathBuf {
    default_data_dir().join("greenchain.db")
}
