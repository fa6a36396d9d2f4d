//! Configuration file model and discovery
//!
//! The TOML file is the lowest-priority source of settings. Command-line
//! flags and environment variables are layered on top of it by the binary.
//!
//! File discovery order:
//! 1. Explicit path from the command line
//! 2. `CIMPORT_CONFIG` environment variable
//! 3. `<user config dir>/cimport/config.toml`
//!
//! An explicitly named file must exist and parse. The per-user default file
//! is optional: when it is absent, built-in defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CIMPORT_CONFIG";

/// Contact service base URL used when nothing else is configured
pub const DEFAULT_HOST: &str = "https://api.omnigage.io/api/v1/";

/// Per-request network timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings loaded from the TOML config file
///
/// Every field is optional so a partial file can be combined with flags and
/// environment variables.
#[derive(Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Contact service base URL
    #[serde(default)]
    pub host: Option<String>,

    /// API token key
    #[serde(default)]
    pub token_key: Option<String>,

    /// API token secret
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Account key sent as `X-Account-Key`
    #[serde(default)]
    pub account_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl fmt::Debug for TomlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TomlConfig")
            .field("host", &self.host)
            .field("token_key", &self.token_key)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("account_key", &self.account_key)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("logging", &self.logging)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
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

/// Where a config file path came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Named on the command line
    CommandLine(PathBuf),
    /// Named by `CIMPORT_CONFIG`
    Environment(PathBuf),
    /// Per-user default location
    UserDefault(PathBuf),
}

impl ConfigLocation {
    pub fn path(&self) -> &Path {
        match self {
            ConfigLocation::CommandLine(p)
            | ConfigLocation::Environment(p)
            | ConfigLocation::UserDefault(p) => p,
        }
    }

    /// Explicitly named files must exist
    pub fn is_required(&self) -> bool {
        !matches!(self, ConfigLocation::UserDefault(_))
    }
}

/// Resolve which config file to read
///
/// Returns `None` only when no explicit path is given and the platform has no
/// user config directory.
pub fn resolve_config_location(cli_arg: Option<&Path>) -> Option<ConfigLocation> {
    if let Some(path) = cli_arg {
        return Some(ConfigLocation::CommandLine(path.to_path_buf()));
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(ConfigLocation::Environment(PathBuf::from(path)));
        }
    }

    default_config_path().map(ConfigLocation::UserDefault)
}

/// Per-user config file path (`~/.config/cimport/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cimport").join("config.toml"))
}

impl TomlConfig {
    /// Parse a config file from disk
    ///
    /// Read failures surface as [`Error::Io`]; bad content as [`Error::Config`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Locate and load the config file, falling back to defaults when the
    /// optional per-user file is missing
    pub fn discover(cli_arg: Option<&Path>) -> Result<Self> {
        let Some(location) = resolve_config_location(cli_arg) else {
            warn!("No user config directory available, using built-in defaults");
            return Ok(Self::default());
        };

        let path = location.path();
        if !path.exists() {
            if location.is_required() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let config = Self::from_file(path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == Some(0) {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
