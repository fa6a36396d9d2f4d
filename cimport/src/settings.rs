//! Settings resolution for cimport
//!
//! Provides layered resolution with CLI/ENV → TOML → built-in default
//! priority. Command-line flags and environment variables arrive together
//! through clap, so they form a single top layer here.

use crate::credentials::Credentials;
use crate::error::{ImportError, Result};
use cimport_common::config::{TomlConfig, DEFAULT_HOST, DEFAULT_TIMEOUT_SECS};
use std::time::Duration;
use tracing::info;

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub host: Option<String>,
    pub token_key: Option<String>,
    pub token_secret: Option<String>,
    pub account_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Everything one pipeline run needs to talk to the remote services
#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub host: String,
    pub credentials: Credentials,
    pub request_timeout: Duration,
}

impl ImportSettings {
    pub fn new(host: impl Into<String>, credentials: Credentials, request_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            credentials,
            request_timeout,
        }
    }

    /// Merge overrides on top of the TOML file
    ///
    /// Token key, token secret and account key are required; a blank value
    /// counts as missing.
    pub fn resolve(overrides: SettingsOverrides, toml: &TomlConfig) -> Result<Self> {
        let host = pick("host", overrides.host, toml.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let token_key = require(
            "token key",
            "--token-key",
            "CIMPORT_TOKEN_KEY",
            "token_key",
            pick("token key", overrides.token_key, toml.token_key.clone()),
        )?;
        let token_secret = require(
            "token secret",
            "--token-secret",
            "CIMPORT_TOKEN_SECRET",
            "token_secret",
            pick("token secret", overrides.token_secret, toml.token_secret.clone()),
        )?;
        let account_key = require(
            "account key",
            "--account-key",
            "CIMPORT_ACCOUNT_KEY",
            "account_key",
            pick("account key", overrides.account_key, toml.account_key.clone()),
        )?;

        let timeout_secs = overrides
            .request_timeout_secs
            .or(toml.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ImportError::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host,
            credentials: Credentials::new(token_key, token_secret, account_key),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Non-empty, non-whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

fn pick(label: &str, top: Option<String>, toml: Option<String>) -> Option<String> {
    if let Some(value) = top.filter(|v| is_valid_value(v)) {
        info!("{} taken from command line or environment", label);
        return Some(value);
    }
    if let Some(value) = toml.filter(|v| is_valid_value(v)) {
        info!("{} taken from TOML config", label);
        return Some(value);
    }
    None
}

fn require(
    label: &str,
    flag: &str,
    env_var: &str,
    toml_key: &str,
    value: Option<String>,
) -> Result<String> {
    value.ok_or_else(|| {
        ImportError::Config(format!(
            "{} not configured. Please configure using one of:\n\
             1. Command line: {} <value>\n\
             2. Environment: {}=<value>\n\
             3. TOML config: ~/.config/cimport/config.toml ({} = \"<value>\")",
            label, flag, env_var, toml_key
        ))
    })
}
