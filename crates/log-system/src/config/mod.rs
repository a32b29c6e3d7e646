// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Persisted configuration of a log system instance.
//!
//! The configuration is stored as one flat JSON document:
//!
//! ```json
//! {
//!   "BufferSize": 10000,
//!   "SendInterval": 150,
//!   "GlobalLogLevel": "fatal",
//!   "ConsoleEcho": false,
//!   "guid1::TestPlugin": "debug"
//! }
//! ```
//!
//! Every field that is not one of the reserved names is a per-caller override
//! keyed by `<instance guid>::<component name>`.
//!
//! At start-up the hard-coded fallback, the remote defaults and the persisted
//! document are layered in that order, later layers winning field by field.

pub mod remote;
pub mod settings;
pub mod store;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::level::{resolve_level, LevelArg, LogLevel};

/// Flat field/value mapping persisted by a [`store::ConfigStore`].
pub type Document = Map<String, Value>;

pub const BUFFER_SIZE_KEY: &str = "BufferSize";
pub const SEND_INTERVAL_KEY: &str = "SendInterval";
pub const GLOBAL_LEVEL_KEY: &str = "GlobalLogLevel";
pub const CONSOLE_ECHO_KEY: &str = "ConsoleEcho";

const RESERVED_KEYS: [&str; 4] = [
    BUFFER_SIZE_KEY,
    SEND_INTERVAL_KEY,
    GLOBAL_LEVEL_KEY,
    CONSOLE_ECHO_KEY,
];

/// Separates instance guid from component name in override keys.
pub const OVERRIDE_KEY_SEPARATOR: &str = "::";

pub const DEFAULT_BUFFER_LIMIT_BYTES: usize = 10_000;
pub const DEFAULT_FLUSH_INTERVAL_SECONDS: u64 = 150;
pub const DEFAULT_GLOBAL_LEVEL: LogLevel = LogLevel::Fatal;

/// `(instance guid, component name)`
pub type CallerKey = (String, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub global_level: LogLevel,
    pub buffer_limit_bytes: usize,
    pub flush_interval_seconds: u64,
    pub console_echo: bool,
    pub caller_levels: BTreeMap<CallerKey, LogLevel>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            global_level: DEFAULT_GLOBAL_LEVEL,
            buffer_limit_bytes: DEFAULT_BUFFER_LIMIT_BYTES,
            flush_interval_seconds: DEFAULT_FLUSH_INTERVAL_SECONDS,
            console_echo: false,
            caller_levels: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Builds a configuration from a document, layered over the fallback defaults.
    ///
    /// Invalid reserved fields are logged and ignored; invalid override fields are
    /// skipped.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        let mut config = Config::default();
        config.apply_document(document);
        config
    }

    /// Overlays every valid field of `document` onto this configuration.
    pub fn apply_document(&mut self, document: &Document) {
        for (key, value) in document {
            match key.as_str() {
                BUFFER_SIZE_KEY => match positive_integer(value) {
                    Some(limit) => {
                        self.buffer_limit_bytes = usize::try_from(limit).unwrap_or(usize::MAX);
                    }
                    None => error!("Invalid {BUFFER_SIZE_KEY} in configuration: {value}"),
                },
                SEND_INTERVAL_KEY => match positive_integer(value) {
                    Some(interval) => self.flush_interval_seconds = interval,
                    None => error!("Invalid {SEND_INTERVAL_KEY} in configuration: {value}"),
                },
                GLOBAL_LEVEL_KEY => match LevelArg::from_value(value).and_then(resolve_level) {
                    Some(level) => self.global_level = level,
                    None => error!("Invalid {GLOBAL_LEVEL_KEY} in configuration: {value}"),
                },
                CONSOLE_ECHO_KEY => match value.as_bool() {
                    Some(echo) => self.console_echo = echo,
                    None => error!("Invalid {CONSOLE_ECHO_KEY} in configuration: {value}"),
                },
                _ => {
                    let level = LevelArg::from_value(value).and_then(resolve_level);
                    match (parse_override_key(key), level) {
                        (Some(caller), Some(level)) => {
                            self.caller_levels.insert(caller, level);
                        }
                        _ => warn!("Skipping unrecognized configuration field {key}={value}"),
                    }
                }
            }
        }
    }

    /// Serializes the whole configuration as a flat document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(BUFFER_SIZE_KEY.to_string(), Value::from(self.buffer_limit_bytes));
        document.insert(
            SEND_INTERVAL_KEY.to_string(),
            Value::from(self.flush_interval_seconds),
        );
        document.insert(
            GLOBAL_LEVEL_KEY.to_string(),
            Value::from(self.global_level.as_str()),
        );
        document.insert(CONSOLE_ECHO_KEY.to_string(), Value::from(self.console_echo));
        for ((guid, component), level) in &self.caller_levels {
            document.insert(override_key(guid, component), Value::from(level.as_str()));
        }
        document
    }

    /// The override for this exact pair if one exists, else the global level.
    #[must_use]
    pub fn effective_threshold(&self, guid: &str, component: &str) -> LogLevel {
        self.caller_levels
            .get(&(guid.to_string(), component.to_string()))
            .copied()
            .unwrap_or(self.global_level)
    }
}

/// Layers `overlay` onto `base`, overlay fields winning.
#[must_use]
pub fn merge_documents(mut base: Document, overlay: &Document) -> Document {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
    base
}

#[must_use]
pub fn override_key(guid: &str, component: &str) -> String {
    format!("{guid}{OVERRIDE_KEY_SEPARATOR}{component}")
}

fn parse_override_key(key: &str) -> Option<CallerKey> {
    if RESERVED_KEYS.contains(&key) {
        return None;
    }
    let (guid, component) = key.split_once(OVERRIDE_KEY_SEPARATOR)?;
    if guid.is_empty() || component.is_empty() {
        return None;
    }
    Some((guid.to_string(), component.to_string()))
}

fn positive_integer(value: &Value) -> Option<u64> {
    value.as_u64().filter(|n| *n > 0)
}
