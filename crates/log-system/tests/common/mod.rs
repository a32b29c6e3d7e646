// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared collaborators for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log_system::config::remote::RemoteDefaults;
use log_system::config::store::{ConfigStore, MemoryStore};
use log_system::config::Document;
use log_system::error::{RemoteError, SinkError};
use log_system::sink::Sink;
use log_system::{CallSite, LogRecord, LogSystem};
use serde_json::Value;

pub const APP_ID: &str = "dtcd";
pub const GUID: &str = "1";
pub const COMPONENT: &str = "testPlugin";
/// With `APP_ID`, `GUID`, `COMPONENT`, level fatal and no caller, a record
/// carrying this message is estimated at 218 bytes, 220 as first buffer element.
pub const MESSAGE: &str = "test record test record test";

/// Sink remembering every delivered batch
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<LogRecord>>>,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<Vec<LogRecord>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn deliver(&self, batch: Vec<LogRecord>) -> Result<(), SinkError> {
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }
}

/// Remote defaults source counting how often it is asked
pub struct CountingRemote {
    response: Result<Option<Document>, String>,
    calls: AtomicUsize,
}

impl CountingRemote {
    pub fn serving(document: Value) -> Self {
        CountingRemote {
            response: Ok(Some(as_document(document))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        CountingRemote {
            response: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteDefaults for CountingRemote {
    async fn fetch_defaults(&self) -> Result<Option<Document>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(RemoteError::Malformed)
    }
}

pub fn as_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Store already holding `document` under the default key
pub fn store_with(document: Value) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .save("logSystemConfig", &as_document(document))
        .unwrap();
    store
}

/// Log system with the fixed attribution used by the size contracts
pub fn system(sink: Arc<RecordingSink>, store: Arc<MemoryStore>) -> LogSystem {
    LogSystem::builder(sink)
        .store(store)
        .app_id(APP_ID)
        .call_site(CallSite::Disabled)
        .build()
}

/// Lets spawned deliveries run on a current-thread runtime.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
