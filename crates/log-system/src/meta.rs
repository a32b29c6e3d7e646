// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

/// Descriptor the host reads to order plugin loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationMeta {
    pub kind: &'static str,
    pub title: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub initialization_required: bool,
    pub priority: u32,
}

pub const REGISTRATION_META: RegistrationMeta = RegistrationMeta {
    kind: "core-service",
    title: "Log system",
    name: "LogSystem",
    version: env!("CARGO_PKG_VERSION"),
    initialization_required: true,
    priority: 6,
};
