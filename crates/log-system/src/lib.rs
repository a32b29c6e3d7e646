// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Log System
//!
//! Client-side log aggregation for plugin hosts. Callers identified by an
//! instance guid and a component name emit leveled records; records that pass
//! the caller's severity threshold are buffered in memory and periodically
//! flushed to a remote collector.
//!
//! ## Architecture
//!
//! - [`level`]: the five-rank severity scale and level normalization
//! - [`gate`]: threshold comparison
//! - [`size`]: footprint estimate used for buffer accounting
//! - [`record`]: the buffered record and its attribution fields
//! - [`buffer`]: size-bounded admission with overflow flushing
//! - [`scheduler`]: the periodic flush timer
//! - [`sink`]: delivery to the collector
//! - [`config`]: persisted configuration, its store and remote defaults
//! - [`identity`]: session user resolution
//! - [`system`]: the [`LogSystem`] tying it all together
//! - [`logger`]: diagnostic output formatting
//!
//! Delivery is best-effort. Records larger than the buffer are dropped, failed
//! flushes are logged and not retried.

#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod level;
pub mod logger;
pub mod meta;
pub mod record;
pub mod scheduler;
pub mod sink;
pub mod size;
pub mod system;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use level::{resolve_level, LevelArg, LogLevel};
pub use record::{CallSite, LogRecord};
pub use system::{LogSystem, LogSystemBuilder};
