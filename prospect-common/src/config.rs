//! Configuration loading for Prospect services
//!
//! Two sources with fixed priority: environment variables override values
//! from the TOML file. Only bootstrap concerns live here; runtime behavior
//! knobs (timeouts, provider lists) are explicit config parameters on the
//! engine types that use them.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable carrying the code-host API token
pub const CODE_HOST_TOKEN_ENV: &str = "PROSPECT_CODE_HOST_TOKEN";

/// Bootstrap configuration loaded from a TOML file
///
/// Every field is optional; a missing file yields `TomlConfig::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// API token for the code-host adapter (anonymous access when absent)
    #[serde(default)]
    pub code_host_token: Option<String>,

    /// Per-adapter timeout override, seconds
    #[serde(default)]
    pub adapter_timeout_secs: Option<u64>,

    /// Whole-run deadline override, seconds (0 disables the deadline)
    #[serde(default)]
    pub global_deadline_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load TOML configuration from `path`
///
/// A missing file is not an error: defaults are returned so services can run
/// unconfigured. A present but unparseable file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        info!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the code-host API token with ENV -> TOML priority
///
/// Returns `None` when neither source provides a usable value; anonymous
/// access is a supported mode, not an error.
pub fn resolve_code_host_token(toml_config: &TomlConfig) -> Option<String> {
    let env_token = std::env::var(CODE_HOST_TOKEN_ENV)
        .ok()
        .filter(|t| is_valid_token(t));
    let toml_token = toml_config
        .code_host_token
        .clone()
        .filter(|t| is_valid_token(t));

    if env_token.is_some() && toml_token.is_some() {
        warn!(
            "Code-host token found in both {} and TOML config, using environment (highest priority)",
            CODE_HOST_TOKEN_ENV
        );
    }

    if let Some(token) = env_token {
        info!("Code-host token loaded from environment variable");
        return Some(token);
    }
    if let Some(token) = toml_token {
        info!("Code-host token loaded from TOML config");
        return Some(token);
    }
    None
}

/// Validate token (non-empty, non-whitespace)
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}
