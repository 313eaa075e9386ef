//! Periodic compliance cycle.
//!
//! Every cycle runs the full compliance check and overwrites one cache entry
//! with the outcome, so request paths can read the last result without
//! waiting on the network. Cycles started by the timer, by
//! [`LicenseCycle::trigger`] and by direct calls are not serialized against
//! each other; the cache entry holds whichever finished last.

use crate::error::LicenseError;
use crate::store::CycleCache;
use crate::validator::ComplianceChecker;
use crate::verdict::CachedCycleResult;
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Cache key of the cycle result.
pub const CYCLE_CACHE_KEY: &str = "lcl";

/// Default time between two scheduled cycles.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(300_000);

/// Scheduling parameters.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Time between two scheduled cycles.
    pub interval: Duration,
    /// Cache entry the result is written to.
    pub cache_key: String,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CYCLE_INTERVAL,
            cache_key: CYCLE_CACHE_KEY.to_string(),
        }
    }
}

/// Runs compliance checks on a timer and on demand.
pub struct LicenseCycle {
    checker: Arc<ComplianceChecker>,
    cache: Arc<dyn CycleCache>,
    config: CycleConfig,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl LicenseCycle {
    pub fn new(
        checker: Arc<ComplianceChecker>,
        cache: Arc<dyn CycleCache>,
        config: CycleConfig,
    ) -> Self {
        Self {
            checker,
            cache,
            config,
            timer: Mutex::new(None),
        }
    }

    /// Runs the first cycle, waits for it, then starts the timer.
    ///
    /// Calling `init` on a running cycle only runs one more cycle.
    pub async fn init(self: &Arc<Self>) {
        self.run_cycle().await;

        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!("License cycle already running");
            return;
        }

        let period = self.config.interval;
        let weak = Arc::downgrade(self);
        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(cycle) = weak.upgrade() else {
                    break;
                };
                tokio::spawn(async move {
                    cycle.run_cycle().await;
                });
            }
        }));
        info!("License cycle started, interval {:?}", period);
    }

    /// Starts one cycle in the background.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<()> {
        let cycle = Arc::clone(self);
        tokio::spawn(async move {
            cycle.run_cycle().await;
        })
    }

    /// Runs one cycle and writes its outcome to the cache.
    ///
    /// A failed check is recorded as an invalid result; nothing is returned
    /// as an error.
    pub async fn run_cycle(&self) -> CachedCycleResult {
        let outcome = self.checker.validate().await;
        let timestamp = Utc::now().timestamp_millis();

        let record = match outcome {
            Ok(verdict) => CachedCycleResult::from_verdict(&verdict, timestamp),
            Err(e) => {
                error!("{}", LicenseError::SchedulerCycle(Box::new(e)));
                CachedCycleResult::failed(timestamp)
            }
        };

        if let Err(e) = self.cache.set(&self.config.cache_key, &record).await {
            error!("Failed to cache license cycle result: {e}");
        } else {
            debug!(is_valid = record.is_valid, "License cycle result cached");
        }
        record
    }

    /// Returns the last cached result, or the default when no cycle has
    /// completed yet.
    pub async fn read_cached_state(&self) -> CachedCycleResult {
        match self.cache.get(&self.config.cache_key).await {
            Ok(Some(record)) => record,
            Ok(None) => CachedCycleResult::default(),
            Err(e) => {
                warn!("Failed to read cached license state: {e}");
                CachedCycleResult::default()
            }
        }
    }

    /// Stops the timer. In-flight cycles run to completion.
    pub fn shutdown(&self) {
        let handle = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!("License cycle stopped");
        }
    }

    /// Returns true while the timer is active.
    pub fn is_running(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for LicenseCycle {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}
