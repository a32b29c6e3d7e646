// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::Document;
use crate::error::RemoteError;

/// Source of the default configuration, consulted once at start-up when nothing
/// has been persisted yet.
#[async_trait]
pub trait RemoteDefaults: Send + Sync {
    /// `Ok(None)` means the source answered but had no defaults to offer.
    async fn fetch_defaults(&self) -> Result<Option<Document>, RemoteError>;
}

/// Fetches defaults as a JSON object from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpRemoteDefaults {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpRemoteDefaults {
    #[must_use]
    pub fn new(client: reqwest::Client, url: String, timeout: Duration) -> Self {
        HttpRemoteDefaults {
            client,
            url,
            timeout,
        }
    }
}

#[async_trait]
impl RemoteDefaults for HttpRemoteDefaults {
    async fn fetch_defaults(&self) -> Result<Option<Document>, RemoteError> {
        debug!("Fetching log system defaults from {}", self.url);
        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        match resp.json::<Value>().await? {
            Value::Object(document) => Ok(Some(document)),
            Value::Null => Ok(None),
            other => Err(RemoteError::Malformed(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}
