// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Severity scale for buffered records.
//!
//! The scale has exactly five ranks with strictly increasing priorities:
//!
//! | Level   | Priority |
//! |---------|----------|
//! | `fatal` | 1        |
//! | `error` | 2        |
//! | `warn`  | 3        |
//! | `info`  | 4        |
//! | `debug` | 5        |
//!
//! A threshold with a higher priority lets more verbose records through, so a
//! `debug` threshold admits everything and a `fatal` threshold admits only `fatal`.
//!
//! Levels can be named (case-insensitive) or given by priority. Anything outside
//! the scale resolves to `None` instead of failing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::error;

/// Severity of a log record.
///
/// # Parsing
///
/// ```
/// use log_system::LogLevel;
/// use std::str::FromStr;
///
/// assert_eq!(LogLevel::from_str("Warn").unwrap(), LogLevel::Warn);
/// assert!(LogLevel::from_str("super fatal").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Unrecoverable failures. Default threshold.
    #[default]
    Fatal = 1,
    Error = 2,
    Warn = 3,
    Info = 4,
    Debug = 5,
}

impl LogLevel {
    /// Every level, least to most verbose.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    #[must_use]
    pub fn priority(self) -> u8 {
        self as u8
    }

    /// Looks a level up by priority.
    #[must_use]
    pub fn from_priority(priority: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| i64::from(level.priority()) == priority)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fatal" => Ok(LogLevel::Fatal),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(format!(
                "Invalid log level: '{s}'. Valid levels are: fatal, error, warn, info, debug",
            )),
        }
    }
}

/// Lenient deserialization: accepts a name or a priority, and falls back to
/// [`LogLevel::Fatal`] (logging an error) for anything else so a bad persisted
/// document never prevents start-up.
impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match LevelArg::from_value(&value).and_then(resolve_level) {
            Some(level) => Ok(level),
            None => {
                error!("Expected a log level name or priority, got {:?}", value);
                Ok(LogLevel::default())
            }
        }
    }
}

/// A level as supplied by a caller: a symbolic name or a numeric priority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelArg {
    Name(String),
    Priority(i64),
    Level(LogLevel),
}

impl LevelArg {
    /// Reads a level argument out of a JSON value (string or integer).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(LevelArg::Name(name.clone())),
            Value::Number(number) => number.as_i64().map(LevelArg::Priority),
            _ => None,
        }
    }
}

impl From<LogLevel> for LevelArg {
    fn from(level: LogLevel) -> Self {
        LevelArg::Level(level)
    }
}

impl From<&str> for LevelArg {
    fn from(name: &str) -> Self {
        LevelArg::Name(name.to_string())
    }
}

impl From<String> for LevelArg {
    fn from(name: String) -> Self {
        LevelArg::Name(name)
    }
}

impl From<&String> for LevelArg {
    fn from(name: &String) -> Self {
        LevelArg::Name(name.clone())
    }
}

macro_rules! level_arg_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for LevelArg {
            fn from(priority: $t) -> Self {
                LevelArg::Priority(i64::from(priority))
            }
        })*
    };
}

level_arg_from_int!(u8, u16, u32, i8, i16, i32, i64);

/// Normalizes a name or priority to a level. Returns `None` when the value is
/// not on the scale.
#[must_use]
pub fn resolve_level(arg: impl Into<LevelArg>) -> Option<LogLevel> {
    match arg.into() {
        LevelArg::Level(level) => Some(level),
        LevelArg::Name(name) => LogLevel::from_str(&name).ok(),
        LevelArg::Priority(priority) => LogLevel::from_priority(priority),
    }
}
