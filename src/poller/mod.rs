//! Fetch → parse → store loop.
//!
//! The poller starts `Idle`, enters `Fetching` immediately, then alternates
//! between `Sleeping` and `Fetching` until stopped (or after the first pass
//! in one-shot mode). Failures are isolated per feed URL; the next cycle is
//! the only retry.

mod stop;

pub use stop::{stop_channel, StopHandle, StopToken};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::app::{AppContext, FeedstashError, Result};
use crate::export::{self, ExportFilter};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::{SqliteStore, Store};

/// Upper bound on a single sleep step, so stop requests are seen promptly.
const SLEEP_STEP: Duration = Duration::from_secs(1);

/// Parse interval string like "300", "90s", "5m", "1h", "1d"
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let invalid = |what: &str| FeedstashError::Config(format!("Invalid {}: {}", what, s));

    let scaled = |value: &str, unit: u64, what: &str| {
        value
            .parse::<u64>()
            .ok()
            .and_then(|v| v.checked_mul(unit))
            .ok_or_else(|| invalid(what))
    };

    let secs = if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, 3600, "hours")?
    } else if let Some(minutes) = s.strip_suffix('m') {
        scaled(minutes, 60, "minutes")?
    } else if let Some(days) = s.strip_suffix('d') {
        scaled(days, 86400, "days")?
    } else if let Some(secs) = s.strip_suffix('s') {
        scaled(secs, 1, "seconds")?
    } else {
        s.parse::<u64>().map_err(|_| {
            FeedstashError::Config(format!(
                "Invalid interval: {}. Use format like '300', '5m', '1h'",
                s
            ))
        })?
    };

    Ok(Duration::from_secs(secs))
}

/// Format interval for display
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Feed URLs, polled in this order every cycle.
    pub urls: Vec<String>,
    pub interval: Duration,
    /// Stop after the first cycle.
    pub once: bool,
    pub snapshot_path: PathBuf,
    /// Write the snapshot from the full store before the first cycle.
    pub initial_snapshot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Fetching,
    Sleeping,
    Stopped,
}

/// Outcome of one pass over all configured URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries parsed across all feeds.
    pub fetched: usize,
    /// Rows newly written to the store.
    pub inserted: usize,
    /// URLs whose fetch, parse or insert failed.
    pub failed: usize,
}

pub struct Poller {
    store: Arc<SqliteStore>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    config: PollerConfig,
    state: Mutex<PollerState>,
}

impl Poller {
    pub fn new(
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
        config: PollerConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            normalizer,
            config,
            state: Mutex::new(PollerState::Idle),
        }
    }

    pub fn from_context(ctx: &AppContext, config: PollerConfig) -> Self {
        Self::new(
            ctx.store.clone(),
            ctx.fetcher.clone(),
            ctx.normalizer.clone(),
            config,
        )
    }

    pub fn state(&self) -> PollerState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(PollerState::Stopped)
    }

    fn transition(&self, next: PollerState) {
        if let Ok(mut state) = self.state.lock() {
            tracing::debug!(from = ?*state, to = ?next, "Poller state change");
            *state = next;
        }
    }

    /// Runs until `stop` fires, or for a single cycle in one-shot mode.
    /// Returns the total number of newly inserted items.
    pub async fn run(&self, stop: StopToken) -> usize {
        tracing::info!(
            urls = ?self.config.urls,
            interval = %format_interval(self.config.interval),
            once = self.config.once,
            snapshot = %self.config.snapshot_path.display(),
            "Starting poller"
        );

        if self.config.initial_snapshot {
            match self.refresh_snapshot() {
                Ok(written) => tracing::info!("Initial JSON snapshot written, {} rows", written),
                Err(e) => tracing::error!("Failed to write initial JSON snapshot: {}", e),
            }
        }

        let mut total_inserted = 0;

        loop {
            if stop.is_stopped() {
                tracing::info!("Stop requested. Exiting loop.");
                break;
            }

            self.transition(PollerState::Fetching);
            let report = self.run_cycle(&stop).await;
            total_inserted += report.inserted;

            if report.inserted > 0 {
                match self.refresh_snapshot() {
                    Ok(written) => tracing::info!("Updated JSON snapshot, {} rows", written),
                    Err(e) => tracing::error!("Failed to update JSON snapshot after insert: {}", e),
                }
            }

            if self.config.once {
                break;
            }

            self.transition(PollerState::Sleeping);
            self.sleep(&stop).await;
        }

        self.transition(PollerState::Stopped);
        total_inserted
    }

    /// One pass over every configured URL. A failing URL is logged and
    /// skipped; the remaining URLs are still polled.
    pub async fn run_cycle(&self, stop: &StopToken) -> CycleReport {
        let start = Utc::now();
        let mut report = CycleReport::default();

        for url in &self.config.urls {
            if stop.is_stopped() {
                break;
            }

            tracing::info!("Fetching feed: {}", url);
            match self.poll_url(url).await {
                Ok((fetched, inserted)) => {
                    tracing::info!(
                        "Feed {}: fetched {} items, inserted {} new",
                        url,
                        fetched,
                        inserted
                    );
                    report.fetched += fetched;
                    report.inserted += inserted;
                }
                Err(e) => {
                    tracing::error!("Error fetching/parsing {}: {}", url, e);
                    report.failed += 1;
                }
            }
        }

        let elapsed = Utc::now().signed_duration_since(start);
        tracing::info!(
            "Cycle complete: {} new items, {} errors ({:.1}s)",
            report.inserted,
            report.failed,
            elapsed.num_milliseconds() as f64 / 1000.0
        );

        report
    }

    async fn poll_url(&self, url: &str) -> Result<(usize, usize)> {
        let body = self.fetcher.fetch(url).await?;
        let entries = self.normalizer.normalize(&body)?;
        let inserted = self.store.insert_items(&entries)?;
        Ok((entries.len(), inserted))
    }

    fn refresh_snapshot(&self) -> Result<usize> {
        export::export(
            self.store.as_ref(),
            &self.config.snapshot_path,
            &ExportFilter::default(),
        )
    }

    async fn sleep(&self, stop: &StopToken) {
        let mut remaining = self.config.interval;

        while !remaining.is_zero() {
            if stop.is_stopped() {
                return;
            }
            let step = remaining.min(SLEEP_STEP);
            tokio::select! {
                _ = tokio::time::sleep(step) => {}
                _ = stop.stopped() => return,
            }
            remaining -= step;
        }
    }
}
