// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;

use crate::error::SettingsError;

pub const DEFAULT_CONFIG_KEY: &str = "logSystemConfig";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// How a log system instance is wired to its collaborators.
///
/// Unlike [`Config`](crate::config::Config) these values are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Collector endpoint flushed batches are POSTed to
    pub collector_url: Option<String>,
    /// Endpoint serving the default configuration
    pub defaults_url: Option<String>,
    /// Application identifier stamped onto every record
    pub app_id: String,
    /// Key the configuration document is stored under
    pub config_key: String,
    /// Directory for the file-backed configuration store; in-memory when unset
    pub store_dir: Option<PathBuf>,
    /// Timeout for collector and defaults requests
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            collector_url: None,
            defaults_url: None,
            app_id: String::new(),
            config_key: DEFAULT_CONFIG_KEY.to_string(),
            store_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Reads settings from `LOG_SYSTEM_*` environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        let collector_url = env::var("LOG_SYSTEM_COLLECTOR_URL").ok();
        let defaults_url = env::var("LOG_SYSTEM_DEFAULTS_URL").ok();
        let app_id = env::var("LOG_SYSTEM_APP_ID").unwrap_or_default();
        let config_key = env::var("LOG_SYSTEM_CONFIG_KEY")
            .unwrap_or_else(|_| DEFAULT_CONFIG_KEY.to_string());
        let store_dir = env::var("LOG_SYSTEM_STORE_DIR").ok().map(PathBuf::from);
        let request_timeout_secs = match env::var("LOG_SYSTEM_TIMEOUT_SECS") {
            Ok(val) => val.parse::<u64>().map_err(|_| {
                SettingsError::Invalid(format!("LOG_SYSTEM_TIMEOUT_SECS '{val}' is not a number"))
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let settings = Self {
            collector_url,
            defaults_url,
            app_id,
            config_key,
            store_dir,
            request_timeout_secs,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, url) in [
            ("collector URL", &self.collector_url),
            ("defaults URL", &self.defaults_url),
        ] {
            if let Some(url) = url {
                if url.trim().is_empty() {
                    return Err(SettingsError::Invalid(format!("{name} cannot be empty")));
                }
            }
        }

        if self.config_key.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "configuration key cannot be empty".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
