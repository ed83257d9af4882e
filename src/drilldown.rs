//! Per-date drilldown state shared by the dashboard, group and project screens.
//!
//! Selecting a date validates it and runs the fetch on a worker thread; the UI
//! loop calls [`Drilldown::apply_results`] every frame to pick up the outcome.

use crate::api::ApiError;
use crate::format::is_valid_date_format;
use log::debug;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

pub const INVALID_DATE_MESSAGE: &str = "Invalid date format";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data";

type FetchFn<T> = Arc<dyn Fn(&str) -> Result<T, ApiError> + Send + Sync>;

/// Outcome of one fetch, tagged with the generation that requested it.
type FetchOutcome<T> = (u64, Result<T, ApiError>);

pub struct Drilldown<T> {
    fetch: FetchFn<T>,
    selected_date: Option<String>,
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    generation: u64,
    inflight: Option<Receiver<FetchOutcome<T>>>,
}

impl<T: Send + 'static> Drilldown<T> {
    pub fn new<F>(fetch: F) -> Self
    where
        F: Fn(&str) -> Result<T, ApiError> + Send + Sync + 'static,
    {
        Self {
            fetch: Arc::new(fetch),
            selected_date: None,
            data: None,
            loading: false,
            error: None,
            generation: 0,
            inflight: None,
        }
    }

    pub fn selected_date(&self) -> Option<&str> {
        self.selected_date.as_deref()
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

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.selected_date.is_some()
    }

    /// Clicking the selected date again deselects it.
    pub fn handle_date_click(&mut self, date: &str) {
        if self.selected_date.as_deref() == Some(date) {
            self.select(None);
        } else {
            self.select(Some(date.to_string()));
        }
    }

    pub fn close(&mut self) {
        self.selected_date = None;
        self.data = None;
        self.invalidate();
    }

    /// Drain the outcome of the current fetch, if it has arrived.
    /// Returns true when state changed.
    pub fn apply_results(&mut self) -> bool {
        let Some(rx) = &self.inflight else {
            return false;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => None,
        };
        self.inflight = None;
        self.loading = false;

        match outcome {
            Some((generation, _)) if generation != self.generation => {
                debug!("drilldown: dropped stale result for generation {}", generation);
            }
            Some((_, Ok(data))) => {
                self.data = Some(data);
            }
            Some((_, Err(e))) => {
                let message = e.to_string();
                self.error = Some(if message.is_empty() {
                    FETCH_FAILED_MESSAGE.to_string()
                } else {
                    message
                });
                self.data = None;
            }
            None => {
                self.error = Some(FETCH_FAILED_MESSAGE.to_string());
                self.data = None;
            }
        }
        true
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.inflight = None;
        self.loading = false;
    }

    fn select(&mut self, date: Option<String>) {
        self.invalidate();
        self.selected_date = date;

        let Some(date) = self.selected_date.clone() else {
            self.data = None;
            return;
        };

        if !is_valid_date_format(&date) {
            self.error = Some(INVALID_DATE_MESSAGE.to_string());
            self.data = None;
            return;
        }

        self.loading = true;
        self.error = None;

        let (tx, rx): (Sender<FetchOutcome<T>>, _) = mpsc::channel();
        let fetch = self.fetch.clone();
        let generation = self.generation;
        let spawned = thread::Builder::new()
            .name("drilldown".to_string())
            .spawn(move || {
                let result = fetch(&date);
                let _ = tx.send((generation, result));
            });
        match spawned {
            Ok(_) => self.inflight = Some(rx),
            Err(e) => {
                log::error!("drilldown: failed to start fetch: {}", e);
                self.loading = false;
                self.error = Some(FETCH_FAILED_MESSAGE.to_string());
                self.data = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorResponse;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    fn settle<T: Send + 'static>(d: &mut Drilldown<T>) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while d.loading() && Instant::now() < deadline {
            d.apply_results();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!d.loading(), "fetch did not finish");
    }

    fn recording() -> (Drilldown<String>, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let c = calls.clone();
        let d = Drilldown::new(move |date: &str| {
            c.lock().push(date.to_string());
            Ok(format!("data for {}", date))
        });
        (d, calls)
    }

    #[test]
    fn test_select_fetches_and_stores_data() {
        let (mut d, calls) = recording();
        d.handle_date_click("2026-01-27");
        assert!(d.loading());
        assert_eq!(d.selected_date(), Some("2026-01-27"));
        settle(&mut d);
        assert_eq!(d.data().map(String::as_str), Some("data for 2026-01-27"));
        assert_eq!(d.error(), None);
        assert_eq!(*calls.lock(), vec!["2026-01-27".to_string()]);
    }

    #[test]
    fn test_same_date_twice_toggles_off() {
        let (mut d, _calls) = recording();
        d.handle_date_click("2026-01-27");
        settle(&mut d);
        d.handle_date_click("2026-01-27");
        assert_eq!(d.selected_date(), None);
        assert!(d.data().is_none());
        assert!(!d.is_open());
    }

    #[test]
    fn test_invalid_date_never_calls_fetch() {
        let (mut d, calls) = recording();
        d.handle_date_click("invalid-date");
        assert_eq!(d.error(), Some(INVALID_DATE_MESSAGE));
        assert!(d.data().is_none());
        assert!(!d.loading());
        d.handle_date_click("2026-02-30");
        assert_eq!(d.error(), Some(INVALID_DATE_MESSAGE));
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_api_error_message_is_surfaced() {
        let mut d: Drilldown<String> = Drilldown::new(|_date: &str| {
            Err(ApiError::Http {
                status: 404,
                body: Some(ErrorResponse {
                    error: "not_found".to_string(),
                    message: "No data for date".to_string(),
                }),
            })
        });
        d.handle_date_click("2026-01-27");
        settle(&mut d);
        assert_eq!(d.error(), Some("No data for date"));
        assert!(d.data().is_none());
    }

    #[test]
    fn test_empty_error_message_uses_generic_text() {
        let mut d: Drilldown<String> =
            Drilldown::new(|_date: &str| Err(ApiError::Network(String::new())));
        d.handle_date_click("2026-01-27");
        settle(&mut d);
        assert_eq!(d.error(), Some(FETCH_FAILED_MESSAGE));
    }

    #[test]
    fn test_panicking_fetch_reports_generic_failure() {
        let mut d: Drilldown<String> = Drilldown::new(|_date: &str| panic!("worker died"));
        d.handle_date_click("2026-01-27");
        settle(&mut d);
        assert_eq!(d.error(), Some(FETCH_FAILED_MESSAGE));
        assert!(d.data().is_none());
    }

    #[test]
    fn test_close_resets_regardless_of_state() {
        let (mut d, _calls) = recording();
        d.close();
        assert_eq!(d.selected_date(), None);
        assert!(d.data().is_none());

        d.handle_date_click("2026-01-27");
        settle(&mut d);
        assert!(d.data().is_some());
        d.close();
        assert_eq!(d.selected_date(), None);
        assert!(d.data().is_none());
    }

    #[test]
    fn test_late_result_after_close_is_discarded() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let mut d: Drilldown<String> = Drilldown::new(move |date: &str| {
            let _ = release_rx.lock().recv_timeout(Duration::from_secs(2));
            Ok(date.to_string())
        });
        d.handle_date_click("2026-01-27");
        d.close();
        release_tx.send(()).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(!d.apply_results());
        assert!(d.data().is_none());
        assert!(!d.loading());
    }

    #[test]
    fn test_reselect_after_close_fetches_again() {
        let (mut d, calls) = recording();
        d.handle_date_click("2026-01-27");
        settle(&mut d);
        d.close();
        d.handle_date_click("2026-01-27");
        settle(&mut d);
        assert_eq!(calls.lock().len(), 2);
        assert!(d.data().is_some());
    }

    #[test]
    fn test_switching_dates_keeps_latest_only() {
        let (mut d, _calls) = recording();
        d.handle_date_click("2026-01-27");
        d.handle_date_click("2026-01-28");
        settle(&mut d);
        assert_eq!(d.selected_date(), Some("2026-01-28"));
        assert_eq!(d.data().map(String::as_str), Some("data for 2026-01-28"));
    }
}
