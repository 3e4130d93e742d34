//! Construction-time configuration for `RequestClient`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::interceptor::{debug_enabled, parse_flag, DEBUG_ENV};
use crate::options::ClientOptions;

pub const BASE_URI_ENV: &str = "ENVELOPE_CLIENT_BASE_URI";
pub const TIMEOUT_ENV: &str = "ENVELOPE_CLIENT_TIMEOUT_SECS";
pub const USER_AGENT_ENV: &str = "ENVELOPE_CLIENT_USER_AGENT";

/// Settings for a `RequestClient`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prepended to relative request paths.
    pub base_uri: Option<String>,
    pub client_options: ClientOptions,
    /// Debug tracing override. `None` follows the process-wide flag.
    pub debug: Option<bool>,
}

impl ClientConfig {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: Some(base_uri.into()),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from `ENVELOPE_CLIENT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout_secs = lookup(TIMEOUT_ENV)
            .map(|value| {
                value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: TIMEOUT_ENV,
                    value,
                })
            })
            .transpose()?;

        Ok(Self {
            base_uri: lookup(BASE_URI_ENV),
            client_options: ClientOptions {
                timeout_secs,
                user_agent: lookup(USER_AGENT_ENV),
                ..ClientOptions::default()
            },
            debug: lookup(DEBUG_ENV).map(|value| parse_flag(&value)),
        })
    }

    /// Whether debug tracing should be installed on new transports.
    pub fn debug_enabled(&self) -> bool {
        self.debug.unwrap_or_else(debug_enabled)
    }

    /// Base URI with exactly one trailing slash.
    pub fn normalized_base_uri(&self) -> Option<String> {
        self.base_uri.as_deref().map(normalize_base_uri)
    }
}

/// Collapse trailing slashes to exactly one.
pub fn normalize_base_uri(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}
