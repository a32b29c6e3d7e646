// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of flushed batches to the collector.
//!
//! ```text
//!   overflow / timer tick
//!          │
//!          v
//!   ┌─────────────┐
//!   │ LogFlusher  │  logs and swallows failures
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │    Sink     │  (HttpSink: JSON POST)
//!   └─────────────┘
//! ```
//!
//! Delivery is best-effort: a failed batch is logged and dropped, never retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, error};

use crate::error::SinkError;
use crate::record::LogRecord;

/// Destination for flushed batches.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn deliver(&self, batch: Vec<LogRecord>) -> Result<(), SinkError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    app_id: &'a str,
    logs: &'a [LogRecord],
}

/// POSTs each batch as `{"appId": ..., "logs": [...]}` to a collector endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    app_id: String,
    timeout: Duration,
}

impl HttpSink {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: String, app_id: String, timeout: Duration) -> Self {
        HttpSink {
            client,
            endpoint,
            app_id,
            timeout,
        }
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn deliver(&self, batch: Vec<LogRecord>) -> Result<(), SinkError> {
        let payload = Payload {
            app_id: &self.app_id,
            logs: &batch,
        };
        let time = Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            debug!(
                "Delivered {} log records in {} ms",
                batch.len(),
                time.elapsed().as_millis()
            );
            return Ok(());
        }
        Err(SinkError::Status(status.as_u16()))
    }
}

/// Hands batches to a [`Sink`], observing the outcome only to log it.
#[derive(Clone)]
pub struct LogFlusher {
    sink: Arc<dyn Sink>,
    runtime: Option<Handle>,
}

impl LogFlusher {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        LogFlusher {
            sink,
            runtime: None,
        }
    }

    /// Pins background deliveries to `runtime`, so [`LogFlusher::dispatch`]
    /// also works from threads outside it.
    #[must_use]
    pub fn on_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// The pinned runtime, else the one the caller runs on.
    pub(crate) fn runtime(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    /// Delivers a batch and waits for the outcome. Returns whether it succeeded.
    pub async fn flush(&self, batch: Vec<LogRecord>) -> bool {
        if batch.is_empty() {
            return true;
        }
        let count = batch.len();
        match self.sink.deliver(batch).await {
            Ok(()) => {
                debug!("Flushed {count} log records");
                true
            }
            Err(e) => {
                error!("Failed to flush {count} log records, dropping them: {e}");
                false
            }
        }
    }

    /// Starts delivering a batch in the background and returns immediately.
    ///
    /// Without a pinned runtime and outside any tokio runtime the batch cannot
    /// be sent and is dropped.
    pub fn dispatch(&self, batch: Vec<LogRecord>) {
        if batch.is_empty() {
            return;
        }
        match self.runtime() {
            Some(handle) => {
                let flusher = self.clone();
                handle.spawn(async move {
                    flusher.flush(batch).await;
                });
            }
            None => error!(
                "No async runtime available, dropping {} log records",
                batch.len()
            ),
        }
    }
}
