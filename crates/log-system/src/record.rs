// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::panic::Location;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::level::LogLevel;
use crate::size;

/// One buffered log event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub instance_guid: String,
    pub component_name: String,
    pub level: LogLevel,
    pub message: String,
    /// Best-effort call site of the emitting code, empty when unknown.
    pub caller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub app_id: String,
}

impl LogRecord {
    /// Estimated footprint of this record on its own.
    ///
    /// A record that cannot be represented as JSON reports `usize::MAX`, which no
    /// buffer limit admits.
    #[must_use]
    pub fn estimated_size(&self) -> usize {
        size::estimate_serialized(self).unwrap_or(usize::MAX)
    }
}

/// Attribution fields stamped onto every record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordContext {
    pub app_id: String,
    pub username: Option<String>,
}

/// How the `caller` field of a record is filled in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallSite {
    /// `file:line` of the code that called the emitting operation.
    #[default]
    Location,
    /// Always empty.
    Disabled,
}

impl CallSite {
    #[must_use]
    pub fn resolve(self, location: &Location<'_>) -> String {
        match self {
            CallSite::Location => format!("{}:{}", location.file(), location.line()),
            CallSite::Disabled => String::new(),
        }
    }
}

/// Validated caller input for a record.
pub(crate) struct RecordInput<'a> {
    pub level: LogLevel,
    pub guid: &'a str,
    pub component: &'a str,
    pub message: &'a str,
}

impl RecordInput<'_> {
    /// Instance id, component name and message must all be non-empty.
    pub(crate) fn is_valid(&self) -> bool {
        !self.guid.is_empty() && !self.component.is_empty() && !self.message.is_empty()
    }

    pub(crate) fn into_record(self, context: &RecordContext, caller: String) -> LogRecord {
        LogRecord {
            timestamp: now_millis(),
            instance_guid: self.guid.to_string(),
            component_name: self.component.to_string(),
            level: self.level,
            message: self.message.to_string(),
            caller,
            username: context.username.clone(),
            app_id: context.app_id.clone(),
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input<'a>(guid: &'a str, component: &'a str, message: &'a str) -> RecordInput<'a> {
        RecordInput {
            level: LogLevel::Warn,
            guid,
            component,
            message,
        }
    }

    #[test]
    fn test_validation_rejects_empty_fields() {
        assert!(input("1", "testPlugin", "test record").is_valid());
        assert!(!input("", "testPlugin", "test record").is_valid());
        assert!(!input("1", "", "test record").is_valid());
        assert!(!input("1", "testPlugin", "").is_valid());
        assert!(!input("", "", "").is_valid());
    }

    #[test]
    fn test_into_record_stamps_context() {
        let context = RecordContext {
            app_id: "dtcd".to_string(),
            username: Some("alice".to_string()),
        };
        let record = input("1", "testPlugin", "test record").into_record(&context, "f".into());

        assert_eq!(record.instance_guid, "1");
        assert_eq!(record.component_name, "testPlugin");
        assert_eq!(record.level, LogLevel::Warn);
        assert_eq!(record.message, "test record");
        assert_eq!(record.caller, "f");
        assert_eq!(record.username.as_deref(), Some("alice"));
        assert_eq!(record.app_id, "dtcd");
        assert!(record.timestamp > 0);
    }

    #[test]
    fn test_serialized_shape() {
        let record = LogRecord {
            timestamp: 1,
            instance_guid: "g".to_string(),
            component_name: "c".to_string(),
            level: LogLevel::Info,
            message: "m".to_string(),
            caller: String::new(),
            username: None,
            app_id: "a".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "timestamp": 1,
                "instanceGuid": "g",
                "componentName": "c",
                "level": "info",
                "message": "m",
                "caller": "",
                "appId": "a",
            })
        );
    }

    #[test]
    fn test_estimated_size() {
        let record = LogRecord {
            timestamp: 1,
            instance_guid: "1".to_string(),
            component_name: "testPlugin".to_string(),
            level: LogLevel::Fatal,
            message: "test record test record test".to_string(),
            caller: String::new(),
            username: None,
            app_id: "dtcd".to_string(),
        };
        // keys: timestamp 18, instanceGuid 24, componentName 26, level 10,
        // message 14, caller 12, appId 10 = 114
        // values: 8 + 2 + 20 + 10 + 56 + 0 + 8 = 104
        assert_eq!(record.estimated_size(), 218);

        let with_user = LogRecord {
            username: Some("bob".to_string()),
            ..record
        };
        // "username"(16) + "bob"(6)
        assert_eq!(with_user.estimated_size(), 240);
    }

    #[test]
    fn test_call_site() {
        let location = Location::caller();
        assert!(CallSite::Location.resolve(location).contains("record.rs:"));
        assert_eq!(CallSite::Disabled.resolve(location), "");
    }
}
