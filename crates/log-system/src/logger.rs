// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic output of the log system itself.
//!
//! Operator-facing messages (delivery failures, dropped records, configuration
//! problems) and console echo of records go through `tracing`. [`Formatter`]
//! renders them as:
//!
//! ```text
//! LOG_SYSTEM | LEVEL | [span_name{span_fields}:] message {event_fields}
//! ```
//!
//! ```text
//! LOG_SYSTEM | ERROR | Failed to flush 12 log records, dropping them: Collector responded with status 503
//! LOG_SYSTEM | WARN | [1700000000000] WARN 1/testPlugin (src/main.rs:10): disk almost full
//! ```

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::level::LogLevel;
use crate::record::LogRecord;

/// Target console-echo events are emitted under.
pub const ECHO_TARGET: &str = "log_system::echo";

#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(&mut writer, "LOG_SYSTEM | {} | ", metadata.level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs a global subscriber using [`Formatter`] and the given filter
/// directives (e.g. `"log_system=debug"`).
///
/// Returns false if a global subscriber is already installed.
pub fn init(filter: &str) -> bool {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .event_format(Formatter)
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// Human-readable rendering of a record for console echo.
#[must_use]
pub fn render_record(record: &LogRecord) -> String {
    let mut line = format!(
        "[{}] {} {}/{}",
        record.timestamp,
        record.level.as_str().to_uppercase(),
        record.instance_guid,
        record.component_name
    );
    if !record.caller.is_empty() {
        line.push_str(&format!(" ({})", record.caller));
    }
    if let Some(username) = &record.username {
        line.push_str(&format!(" <{username}>"));
    }
    line.push_str(": ");
    line.push_str(&record.message);
    line
}

/// Echoes a record to the diagnostic channel at its matching level.
pub fn echo(record: &LogRecord) {
    let line = render_record(record);
    match record.level {
        LogLevel::Fatal | LogLevel::Error => tracing::error!(target: ECHO_TARGET, "{line}"),
        LogLevel::Warn => tracing::warn!(target: ECHO_TARGET, "{line}"),
        LogLevel::Info => tracing::info!(target: ECHO_TARGET, "{line}"),
        LogLevel::Debug => tracing::debug!(target: ECHO_TARGET, "{line}"),
    }
}
