// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The log system core: severity gating, record construction, buffering and
//! flushing for one host.
//!
//! ```text
//!   fatal/error/warn/info/debug, invoke_on_level
//!          │
//!          v
//!   ┌──────────────┐
//!   │  Level gate  │  effective threshold for (guid, component)
//!   └──────┬───────┘
//!          │ admitted
//!          v
//!   ┌──────────────┐  overflow  ┌─────────────┐
//!   │  LogBuffer   │ ─────────> │ LogFlusher  │ ──> Sink
//!   └──────┬───────┘            └─────────────┘
//!          │                           ^
//!          │ drain on tick             │
//!   ┌──────┴───────┐                   │
//!   │FlushScheduler│ ──────────────────┘
//!   └──────────────┘
//! ```
//!
//! Public operations never fail loudly: they return `bool` (or a value) and
//! report problems on the diagnostic channel.
//!
//! # Example
//!
//! ```rust,ignore
//! let system = LogSystem::builder(Arc::new(sink))
//!     .store(Arc::new(FileStore::new("/var/lib/app")))
//!     .app_id("dashboard")
//!     .build();
//! system.init().await;
//!
//! system.warn("guid-1", "Chart", "render took 3s");
//! system.invoke_on_level("guid-1", "Chart", "debug", || expensive_dump());
//! ```

use std::future::Future;
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::buffer::{Admission, LogBuffer};
use crate::config::remote::{HttpRemoteDefaults, RemoteDefaults};
use crate::config::settings::{Settings, DEFAULT_CONFIG_KEY};
use crate::config::store::{ConfigStore, FileStore, MemoryStore};
use crate::config::{self, Config, Document, OVERRIDE_KEY_SEPARATOR};
use crate::error::SettingsError;
use crate::gate::is_admitted;
use crate::identity::IdentityResolver;
use crate::level::{resolve_level, LevelArg, LogLevel};
use crate::logger;
use crate::meta::{RegistrationMeta, REGISTRATION_META};
use crate::record::{CallSite, LogRecord, RecordContext, RecordInput};
use crate::scheduler::{FlushScheduler, TimerState};
use crate::sink::{HttpSink, LogFlusher, Sink};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct LogSystemBuilder {
    sink: Arc<dyn Sink>,
    store: Arc<dyn ConfigStore>,
    remote: Option<Arc<dyn RemoteDefaults>>,
    identity: Option<Arc<dyn IdentityResolver>>,
    config_key: String,
    app_id: String,
    call_site: CallSite,
}

impl LogSystemBuilder {
    fn new(sink: Arc<dyn Sink>) -> Self {
        LogSystemBuilder {
            sink,
            store: Arc::new(MemoryStore::new()),
            remote: None,
            identity: None,
            config_key: DEFAULT_CONFIG_KEY.to_string(),
            app_id: String::new(),
            call_site: CallSite::default(),
        }
    }

    /// Wires an HTTP collector, optional HTTP defaults endpoint and optional
    /// file store from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        settings.validate()?;

        let collector_url = settings
            .collector_url
            .clone()
            .ok_or_else(|| SettingsError::Invalid("collector URL is required".to_string()))?;
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SettingsError::Invalid(format!("failed to build HTTP client: {e}")))?;

        let sink = HttpSink::new(
            client.clone(),
            collector_url,
            settings.app_id.clone(),
            timeout,
        );
        let mut builder = LogSystemBuilder::new(Arc::new(sink))
            .app_id(settings.app_id.clone())
            .config_key(settings.config_key.clone());

        if let Some(url) = &settings.defaults_url {
            builder = builder.remote_defaults(Arc::new(HttpRemoteDefaults::new(
                client,
                url.clone(),
                timeout,
            )));
        }
        if let Some(dir) = &settings.store_dir {
            builder = builder.store(Arc::new(FileStore::new(dir.clone())));
        }
        Ok(builder)
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn remote_defaults(mut self, remote: Arc<dyn RemoteDefaults>) -> Self {
        self.remote = Some(remote);
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = Some(identity);
        self
    }

    #[must_use]
    pub fn config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = key.into();
        self
    }

    #[must_use]
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    #[must_use]
    pub fn call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = call_site;
        self
    }

    /// Builds an uninitialized log system running on fallback defaults. Call
    /// [`LogSystem::init`] to load the persisted configuration and start the
    /// flush timer.
    #[must_use]
    pub fn build(self) -> LogSystem {
        let config = Config::default();
        let buffer = Arc::new(Mutex::new(LogBuffer::new(config.buffer_limit_bytes)));
        let flusher = LogFlusher::new(self.sink);
        let scheduler = FlushScheduler::new(
            Duration::from_secs(config.flush_interval_seconds),
            Arc::clone(&buffer),
            flusher.clone(),
        );

        LogSystem {
            store: self.store,
            remote: self.remote,
            identity: self.identity,
            config_key: self.config_key,
            call_site: self.call_site,
            config: Mutex::new(config),
            context: Mutex::new(RecordContext {
                app_id: self.app_id,
                username: None,
            }),
            buffer,
            flusher: Mutex::new(flusher),
            scheduler: Mutex::new(scheduler),
        }
    }
}

pub struct LogSystem {
    store: Arc<dyn ConfigStore>,
    remote: Option<Arc<dyn RemoteDefaults>>,
    identity: Option<Arc<dyn IdentityResolver>>,
    config_key: String,
    call_site: CallSite,
    /// Persisted configuration. Buffer limit and flush interval in here only
    /// take effect on the next `init`.
    config: Mutex<Config>,
    context: Mutex<RecordContext>,
    buffer: Arc<Mutex<LogBuffer>>,
    /// Pinned to the runtime `init` ran on, so emits from other threads can
    /// still flush.
    flusher: Mutex<LogFlusher>,
    scheduler: Mutex<FlushScheduler>,
}

impl LogSystem {
    pub fn builder(sink: Arc<dyn Sink>) -> LogSystemBuilder {
        LogSystemBuilder::new(sink)
    }

    #[must_use]
    pub fn registration_meta() -> RegistrationMeta {
        REGISTRATION_META
    }

    /// Loads the configuration, resolves the session user, applies the buffer
    /// limit and (re)starts the flush timer.
    ///
    /// A persisted document wins over remote defaults, which win over the
    /// hard-coded fallback. Remote defaults are only fetched when nothing has
    /// been persisted. The merged configuration is persisted before returning.
    pub async fn init(&self) {
        let overlay = self.load_document().await;
        let document = config::merge_documents(Config::default().to_document(), &overlay);
        let loaded = Config::from_document(&document);

        if let Err(e) = self.store.save(&self.config_key, &loaded.to_document()) {
            error!("Failed to persist log system configuration: {e}");
        }

        let username = match &self.identity {
            Some(identity) => identity.resolve_username().await,
            None => None,
        };
        lock(&self.context).username = username;

        lock(&self.buffer).set_limit(loaded.buffer_limit_bytes);

        let flusher = {
            let mut flusher = lock(&self.flusher);
            if let Ok(runtime) = Handle::try_current() {
                *flusher = flusher.clone().on_runtime(runtime);
            }
            flusher.clone()
        };

        let period = Duration::from_secs(loaded.flush_interval_seconds);
        {
            let mut scheduler = lock(&self.scheduler);
            *scheduler = FlushScheduler::new(period, Arc::clone(&self.buffer), flusher);
            scheduler.start();
        }

        info!(
            "Log system initialized: level={}, buffer={} bytes, flush every {}s",
            loaded.global_level, loaded.buffer_limit_bytes, loaded.flush_interval_seconds
        );
        *lock(&self.config) = loaded;
    }

    async fn load_document(&self) -> Document {
        match self.store.load(&self.config_key) {
            Ok(Some(document)) => return document,
            Ok(None) => debug!("No persisted log system configuration found"),
            Err(e) => warn!("Failed to read log system configuration, using defaults: {e}"),
        }

        let Some(remote) = &self.remote else {
            return Document::new();
        };
        match remote.fetch_defaults().await {
            Ok(Some(document)) => document,
            Ok(None) => Document::new(),
            Err(e) => {
                warn!("Failed to fetch remote log system defaults, using fallback: {e}");
                Document::new()
            }
        }
    }

    #[track_caller]
    pub fn emit(&self, level: LogLevel, guid: &str, component: &str, message: &str) -> bool {
        self.emit_at(level, guid, component, message, Location::caller())
    }

    #[track_caller]
    pub fn fatal(&self, guid: &str, component: &str, message: &str) -> bool {
        self.emit_at(LogLevel::Fatal, guid, component, message, Location::caller())
    }

    #[track_caller]
    pub fn error(&self, guid: &str, component: &str, message: &str) -> bool {
        self.emit_at(LogLevel::Error, guid, component, message, Location::caller())
    }

    #[track_caller]
    pub fn warn(&self, guid: &str, component: &str, message: &str) -> bool {
        self.emit_at(LogLevel::Warn, guid, component, message, Location::caller())
    }

    #[track_caller]
    pub fn info(&self, guid: &str, component: &str, message: &str) -> bool {
        self.emit_at(LogLevel::Info, guid, component, message, Location::caller())
    }

    #[track_caller]
    pub fn debug(&self, guid: &str, component: &str, message: &str) -> bool {
        self.emit_at(LogLevel::Debug, guid, component, message, Location::caller())
    }

    /// Unleveled entry point; same as [`LogSystem::info`].
    #[track_caller]
    pub fn log(&self, guid: &str, component: &str, message: &str) -> bool {
        self.emit_at(LogLevel::Info, guid, component, message, Location::caller())
    }

    /// Builds the message with `producer` only if `level` would be admitted for
    /// this caller, then emits it.
    ///
    /// Returns false without calling `producer` when `level` is not a valid
    /// level or is filtered out.
    #[track_caller]
    pub fn invoke_on_level<F>(
        &self,
        guid: &str,
        component: &str,
        level: impl Into<LevelArg>,
        producer: F,
    ) -> bool
    where
        F: FnOnce() -> String,
    {
        let location = Location::caller();
        let Some(level) = resolve_level(level) else {
            return false;
        };
        if !self.admits(guid, component, level) {
            return false;
        }
        let message = producer();
        self.emit_at(level, guid, component, &message, location)
    }

    /// Asynchronous form of [`LogSystem::invoke_on_level`]: the producer's
    /// future is awaited for the message.
    #[track_caller]
    pub fn invoke_on_level_async<'a, L, F, Fut>(
        &'a self,
        guid: &'a str,
        component: &'a str,
        level: L,
        producer: F,
    ) -> impl Future<Output = bool> + 'a
    where
        L: Into<LevelArg> + 'a,
        F: FnOnce() -> Fut + 'a,
        Fut: Future<Output = String> + 'a,
    {
        let location = Location::caller();
        let level = resolve_level(level);
        async move {
            let Some(level) = level else {
                return false;
            };
            if !self.admits(guid, component, level) {
                return false;
            }
            let message = producer().await;
            self.emit_at(level, guid, component, &message, location)
        }
    }

    fn admits(&self, guid: &str, component: &str, level: LogLevel) -> bool {
        let threshold = lock(&self.config).effective_threshold(guid, component);
        is_admitted(threshold, level)
    }

    fn emit_at(
        &self,
        level: LogLevel,
        guid: &str,
        component: &str,
        message: &str,
        location: &'static Location<'static>,
    ) -> bool {
        let (threshold, console_echo) = {
            let config = lock(&self.config);
            (config.effective_threshold(guid, component), config.console_echo)
        };
        if !is_admitted(threshold, level) {
            return false;
        }

        let input = RecordInput {
            level,
            guid,
            component,
            message,
        };
        if !input.is_valid() {
            debug!("Ignoring {level} log call with empty instance guid, component or message");
            return false;
        }

        let record = input.into_record(&lock(&self.context), self.call_site.resolve(location));
        if console_echo {
            logger::echo(&record);
        }
        self.admit(record)
    }

    fn admit(&self, record: LogRecord) -> bool {
        let admission = lock(&self.buffer).try_admit(record);
        match admission {
            Admission::Appended => true,
            Admission::Overflowed(evicted) => {
                lock(&self.flusher).dispatch(evicted);
                let mut scheduler = lock(&self.scheduler);
                if scheduler.state() == TimerState::Active {
                    scheduler.restart();
                }
                true
            }
            Admission::Rejected => false,
        }
    }

    /// Flushes whatever is buffered and waits for the delivery outcome.
    ///
    /// Returns true when there was nothing to flush or delivery succeeded.
    pub async fn flush(&self) -> bool {
        let drained = lock(&self.buffer).drain();
        match drained {
            Some(batch) => {
                let flusher = lock(&self.flusher).clone();
                flusher.flush(batch).await
            }
            None => true,
        }
    }

    /// Stops the flush timer and flushes what is left.
    pub async fn shutdown(&self) -> bool {
        lock(&self.scheduler).stop();
        self.flush().await
    }

    #[must_use]
    pub fn global_level(&self) -> LogLevel {
        lock(&self.config).global_level
    }

    pub fn set_global_level(&self, level: impl Into<LevelArg>) -> bool {
        let Some(level) = resolve_level(level) else {
            return false;
        };
        self.update_config(|config| {
            config.global_level = level;
            true
        })
    }

    /// The effective threshold for this caller.
    #[must_use]
    pub fn caller_level(&self, guid: &str, component: &str) -> LogLevel {
        lock(&self.config).effective_threshold(guid, component)
    }

    pub fn set_caller_level(&self, guid: &str, component: &str, level: impl Into<LevelArg>) -> bool {
        if guid.is_empty() || component.is_empty() || guid.contains(OVERRIDE_KEY_SEPARATOR) {
            return false;
        }
        let Some(level) = resolve_level(level) else {
            return false;
        };
        self.update_config(|config| {
            config
                .caller_levels
                .insert((guid.to_string(), component.to_string()), level);
            true
        })
    }

    /// Returns false when there was no override for this caller.
    pub fn remove_caller_level_override(&self, guid: &str, component: &str) -> bool {
        self.update_config(|config| {
            config
                .caller_levels
                .remove(&(guid.to_string(), component.to_string()))
                .is_some()
        })
    }

    /// Persists a new flush interval. The running timer keeps its period until
    /// the next `init`.
    pub fn set_flush_interval_seconds(&self, seconds: u64) -> bool {
        if seconds == 0 {
            return false;
        }
        self.update_config(|config| {
            config.flush_interval_seconds = seconds;
            true
        })
    }

    /// Persists a new buffer limit. The live buffer keeps its limit until the
    /// next `init`.
    pub fn set_buffer_limit_bytes(&self, bytes: usize) -> bool {
        if bytes == 0 {
            return false;
        }
        self.update_config(|config| {
            config.buffer_limit_bytes = bytes;
            true
        })
    }

    pub fn set_console_echo(&self, enabled: bool) -> bool {
        self.update_config(|config| {
            config.console_echo = enabled;
            true
        })
    }

    /// Deletes the persisted document. The in-memory configuration is kept
    /// until the next `init`, which starts over from remote or fallback defaults.
    pub fn reset_configuration(&self) -> bool {
        match self.store.remove(&self.config_key) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to reset log system configuration: {e}");
                false
            }
        }
    }

    /// Applies `change` to a copy of the configuration, persists it whole and
    /// only then commits it.
    fn update_config(&self, change: impl FnOnce(&mut Config) -> bool) -> bool {
        let mut config = lock(&self.config);
        let mut updated = config.clone();
        if !change(&mut updated) {
            return false;
        }
        if let Err(e) = self.store.save(&self.config_key, &updated.to_document()) {
            error!("Failed to persist log system configuration: {e}");
            return false;
        }
        *config = updated;
        true
    }

    /// Snapshot of the persisted configuration.
    #[must_use]
    pub fn configuration(&self) -> Config {
        lock(&self.config).clone()
    }

    /// Live flush period.
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        lock(&self.scheduler).period()
    }

    /// Live buffer limit.
    #[must_use]
    pub fn buffer_limit_bytes(&self) -> usize {
        lock(&self.buffer).limit()
    }

    #[must_use]
    pub fn buffered_len(&self) -> usize {
        lock(&self.buffer).len()
    }

    #[must_use]
    pub fn buffered_size(&self) -> usize {
        lock(&self.buffer).estimated_size()
    }

    #[must_use]
    pub fn buffered_records(&self) -> Vec<LogRecord> {
        lock(&self.buffer).records().cloned().collect()
    }

    #[must_use]
    pub fn timer_state(&self) -> TimerState {
        lock(&self.scheduler).state()
    }
}
