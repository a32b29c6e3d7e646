// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Periodic flushing of the log buffer.
//!
//! Each log system owns exactly one [`FlushScheduler`], which owns at most one
//! running timer task. Restarting cancels the running task and spawns the next
//! one, so the first tick after a restart is a full period away. A restart that
//! cannot spawn leaves the running task alone.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::buffer::LogBuffer;
use crate::sink::LogFlusher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    NotStarted,
    Active,
    Stopped,
}

pub struct FlushScheduler {
    period: Duration,
    buffer: Arc<Mutex<LogBuffer>>,
    flusher: LogFlusher,
    cancel: Option<CancellationToken>,
    state: TimerState,
}

impl FlushScheduler {
    pub fn new(period: Duration, buffer: Arc<Mutex<LogBuffer>>, flusher: LogFlusher) -> Self {
        FlushScheduler {
            period,
            buffer,
            flusher,
            cancel: None,
            state: TimerState::NotStarted,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Starts the timer, replacing any running one.
    ///
    /// The task is spawned on the flusher's runtime (see
    /// [`LogFlusher::on_runtime`]). Returns false, leaving a running timer in
    /// place, when no runtime is reachable.
    pub fn start(&mut self) -> bool {
        let Some(handle) = self.flusher.runtime() else {
            error!("No async runtime available, log flush timer not started");
            return false;
        };

        self.stop();
        let cancel = CancellationToken::new();
        handle.spawn(run(
            self.period,
            Arc::clone(&self.buffer),
            self.flusher.clone(),
            cancel.clone(),
        ));
        self.cancel = Some(cancel);
        self.state = TimerState::Active;
        debug!("Log flush timer started with period {:?}", self.period);
        true
    }

    /// Cancel-and-recreate, resetting the timer's phase to now.
    pub fn restart(&mut self) -> bool {
        self.start()
    }

    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
            self.state = TimerState::Stopped;
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    period: Duration,
    buffer: Arc<Mutex<LogBuffer>>,
    flusher: LogFlusher,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("Log flush timer cancelled");
                break;
            }
            _ = ticker.tick() => {
                let drained = buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .drain();
                if let Some(batch) = drained {
                    debug!("Scheduled flush of {} log records", batch.len());
                    flusher.dispatch(batch);
                }
            }
        }
    }
}
