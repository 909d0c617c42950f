//! Live "seconds since start" for an active entry.
//!
//! The value is always wall-clock arithmetic against the entry's start time,
//! never an accumulated counter, so a clock rebuilt from a stored start time
//! after a reload shows the same figure as the one it replaced.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

// Per-tick logging is noisy; flip for local debugging.
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info, log_warn};

/// Whole seconds from `started_at` to `now`, zero if `now` is earlier.
pub fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - started_at).num_seconds()).unwrap_or(0)
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Periodic publisher of elapsed seconds.
///
/// Output is monotonic non-decreasing while running. Once stopped or
/// suspended the ticker task has exited and nothing more is published.
pub struct ElapsedClock {
    tick_interval: Duration,
    started_at: Option<DateTime<Utc>>,
    ticker: Option<Ticker>,
    elapsed_tx: Arc<watch::Sender<u64>>,
}

impl ElapsedClock {
    pub fn new(tick_interval: Duration) -> Self {
        let (elapsed_tx, _) = watch::channel(0);
        Self {
            tick_interval,
            started_at: None,
            ticker: None,
            elapsed_tx: Arc::new(elapsed_tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed_tx.subscribe()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        match self.started_at {
            Some(started_at) => {
                let published = *self.elapsed_tx.borrow();
                if self.is_running() {
                    elapsed_seconds(started_at, Utc::now()).max(published)
                } else {
                    elapsed_seconds(started_at, Utc::now())
                }
            }
            None => 0,
        }
    }

    pub async fn start(&mut self, started_at: DateTime<Utc>) {
        self.cancel_ticker().await;
        self.started_at = Some(started_at);
        self.elapsed_tx
            .send_replace(elapsed_seconds(started_at, Utc::now()));
        self.spawn_ticker(started_at);
        log_info!("elapsed clock started from {}", started_at);
    }

    /// Stops publishing but keeps the start time for [`resume`](Self::resume).
    pub async fn suspend(&mut self) {
        self.cancel_ticker().await;
        log_info!("elapsed clock suspended");
    }

    /// Restarts a suspended clock. No-op when running or never started.
    pub fn resume(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        if let Some(started_at) = self.started_at {
            self.spawn_ticker(started_at);
            log_info!("elapsed clock resumed from {}", started_at);
        }
    }

    pub async fn stop(&mut self) {
        self.cancel_ticker().await;
        self.started_at = None;
        log_info!("elapsed clock stopped");
    }

    fn spawn_ticker(&mut self, started_at: DateTime<Utc>) {
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            started_at,
            self.tick_interval,
            self.elapsed_tx.clone(),
            cancel_token.clone(),
        ));
        self.ticker = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel_token.cancel();
            if let Err(err) = ticker.handle.await {
                if !err.is_cancelled() {
                    log::error!("elapsed clock ticker failed: {err}");
                }
            }
        }
    }
}

impl Drop for ElapsedClock {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel_token.cancel();
            ticker.handle.abort();
        }
    }
}

async fn tick_loop(
    started_at: DateTime<Utc>,
    tick_interval: Duration,
    elapsed_tx: Arc<watch::Sender<u64>>,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = *elapsed_tx.borrow();

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let measured = elapsed_seconds(started_at, Utc::now());
                // A wall clock stepping backwards must not make the display go backwards.
                if measured < last {
                    log_warn!("wall clock stepped back {}s; holding elapsed at {last}s", last - measured);
                }
                let elapsed = measured.max(last);
                last = elapsed;
                elapsed_tx.send_if_modified(|current| {
                    if *current == elapsed {
                        false
                    } else {
                        *current = elapsed;
                        true
                    }
                });
                log_debug!("elapsed clock tick: {elapsed}s");
            }
        }
    }
}
