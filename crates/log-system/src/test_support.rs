// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sinks and helpers shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::SinkError;
use crate::record::LogRecord;
use crate::sink::Sink;

/// Remembers every delivered batch.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    batches: Mutex<Vec<Vec<LogRecord>>>,
}

impl RecordingSink {
    pub(crate) fn batches(&self) -> Vec<Vec<LogRecord>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn delivery_count(&self) -> usize {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn deliver(&self, batch: Vec<LogRecord>) -> Result<(), SinkError> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch);
        Ok(())
    }
}

/// Fails every delivery.
#[derive(Debug, Default)]
pub(crate) struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for FailingSink {
    async fn deliver(&self, _batch: Vec<LogRecord>) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Status(503))
    }
}

/// Lets spawned tasks run to completion on a current-thread runtime.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
