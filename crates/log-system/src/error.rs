// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types returned by the collaborators of the log system.
//!
//! None of these escape the public [`LogSystem`](crate::LogSystem) surface: every
//! public operation reports a plain `bool` or value and logs the underlying error
//! to the diagnostic channel instead.

/// Failure to hand a batch of records to the collector.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to send logs: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Collector responded with status {0}")]
    Status(u16),
}

/// Failure to read or write the persisted configuration document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Configuration store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration store unavailable: {0}")]
    Unavailable(String),
}

/// Failure to fetch the remote default configuration.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Failed to fetch remote defaults: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Remote defaults are malformed: {0}")]
    Malformed(String),
}

/// Invalid wiring settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid settings: {0}")]
    Invalid(String),
}
