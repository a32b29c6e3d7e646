// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;

use async_trait::async_trait;

/// Resolves the session user stamped onto records. Consulted once per `init`;
/// `None` is a normal outcome.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_username(&self) -> Option<String>;
}

/// Always resolves to the same user.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Option<String>);

#[async_trait]
impl IdentityResolver for StaticIdentity {
    async fn resolve_username(&self) -> Option<String> {
        self.0.clone().filter(|name| !name.is_empty())
    }
}

/// Reads the user from an environment variable (`USER` by default).
#[derive(Debug, Clone)]
pub struct EnvIdentity {
    var: String,
}

impl EnvIdentity {
    pub fn new(var: impl Into<String>) -> Self {
        EnvIdentity { var: var.into() }
    }
}

impl Default for EnvIdentity {
    fn default() -> Self {
        EnvIdentity::new("USER")
    }
}

#[async_trait]
impl IdentityResolver for EnvIdentity {
    async fn resolve_username(&self) -> Option<String> {
        env::var(&self.var).ok().filter(|name| !name.is_empty())
    }
}
