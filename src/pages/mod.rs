//! View-model state for each screen.
//!
//! Screens own their state; dropping a screen drops its pollers and result
//! channels, so responses that arrive afterwards are discarded.

pub mod group_detail;
pub mod project_detail;
pub mod projects;
pub mod session_detail;
pub mod sessions;

use crate::api::{ApiError, Period, TimeSeriesResponse};
use crate::format::{format_period_label, utc_day};
use crate::poller::Poller;
use log::{debug, error};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

/// Interval of the page-level pollers.
pub const PAGE_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// User-facing text for a failed request.
pub fn error_message(err: &ApiError, fallback: &str) -> String {
    let message = err.to_string();
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Data refreshed by a [`Poller`]. `loading` only covers the first fetch;
/// later ticks replace data silently and a failed tick keeps the last data.
pub struct Polled<T> {
    name: &'static str,
    fallback_error: &'static str,
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    rx: Receiver<Result<T, ApiError>>,
    poller: Poller,
}

impl<T: Send + 'static> Polled<T> {
    pub fn start<F>(
        name: &'static str,
        fetch: F,
        interval: Duration,
        fallback_error: &'static str,
    ) -> Self
    where
        F: Fn() -> Result<T, ApiError> + Send + Sync + 'static,
    {
        let (rx, tick) = Self::channel_tick(fetch);
        Self {
            name,
            fallback_error,
            data: None,
            loading: true,
            error: None,
            rx,
            poller: Poller::new(name, tick, interval, true),
        }
    }

    fn channel_tick<F>(
        fetch: F,
    ) -> (
        Receiver<Result<T, ApiError>>,
        impl Fn() -> Result<(), String> + Send + Sync + 'static,
    )
    where
        F: Fn() -> Result<T, ApiError> + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let tick = move || {
            let result = fetch();
            let failure = result.as_ref().err().map(|e| e.to_string());
            tx.send(result).map_err(|_| "screen closed".to_string())?;
            match failure {
                Some(message) => Err(message),
                None => Ok(()),
            }
        };
        (rx, tick)
    }

    /// Replace the fetch (e.g. after a period change) and poll again immediately.
    /// Results of ticks already in flight are dropped.
    pub fn restart<F>(&mut self, fetch: F)
    where
        F: Fn() -> Result<T, ApiError> + Send + Sync + 'static,
    {
        let (rx, tick) = Self::channel_tick(fetch);
        self.rx = rx;
        self.poller.set_callback(tick);
    }

    /// Apply every result that arrived since the last call.
    pub fn apply_updates(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(Ok(data)) => {
                    self.data = Some(data);
                    self.error = None;
                }
                Ok(Err(e)) => {
                    self.error = Some(error_message(&e, self.fallback_error));
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
            self.loading = false;
            changed = true;
        }
        if changed {
            debug!("{}: state updated", self.name);
        }
        changed
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// A single background load, re-run on demand.
pub struct Loader<T> {
    name: &'static str,
    fallback_error: &'static str,
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    rx: Option<Receiver<Result<T, ApiError>>>,
}

impl<T: Send + 'static> Loader<T> {
    pub fn idle(name: &'static str, fallback_error: &'static str) -> Self {
        Self {
            name,
            fallback_error,
            data: None,
            loading: false,
            error: None,
            rx: None,
        }
    }

    pub fn spawn<F>(name: &'static str, fallback_error: &'static str, fetch: F) -> Self
    where
        F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    {
        let mut loader = Self::idle(name, fallback_error);
        loader.load(fetch);
        loader
    }

    /// Start a new load; the previous one, if still running, is abandoned.
    /// Existing data stays visible until the new result arrives.
    pub fn load<F>(&mut self, fetch: F)
    where
        F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("load-{}", self.name))
            .spawn(move || {
                let _ = tx.send(fetch());
            });
        match spawned {
            Ok(_) => {
                self.rx = Some(rx);
                self.loading = true;
                self.error = None;
            }
            Err(e) => {
                error!("{}: failed to start load: {}", self.name, e);
                self.rx = None;
                self.loading = false;
                self.error = Some(self.fallback_error.to_string());
            }
        }
    }

    pub fn apply_updates(&mut self) -> bool {
        let Some(rx) = &self.rx else {
            return false;
        };
        let result = match rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => None,
        };
        self.rx = None;
        self.loading = false;
        match result {
            Some(Ok(data)) => {
                self.data = Some(data);
                self.error = None;
            }
            Some(Err(e)) => {
                let code = e.body().map_or("-", |b| b.error.as_str());
                error!(
                    "{}: load failed with status {} ({}): {}",
                    self.name,
                    e.status(),
                    code,
                    e
                );
                self.error = Some(error_message(&e, self.fallback_error));
            }
            None => self.error = Some(self.fallback_error.to_string()),
        }
        true
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Selectable date shown under a day-period timeline, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBadge {
    /// `YYYY-MM-DD`, passed to the drilldown.
    pub date: String,
    /// Short "M/D" label.
    pub label: String,
}

/// Badges are only offered for the day period.
pub fn date_badges(timeline: Option<&TimeSeriesResponse>, period: Period) -> Vec<DateBadge> {
    if period != Period::Day {
        return Vec::new();
    }
    let Some(timeline) = timeline else {
        return Vec::new();
    };
    timeline
        .data
        .iter()
        .rev()
        .filter_map(|point| {
            let day = utc_day(&point.period_start)?;
            Some(DateBadge {
                date: day.format("%Y-%m-%d").to_string(),
                label: format_period_label(&point.period_start, false),
            })
        })
        .collect()
}
