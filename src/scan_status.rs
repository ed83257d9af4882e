//! Indicator for the backend's initial transcript scan.

use crate::api::{ApiError, ScanState, ScanStatus};
use crate::poller::Poller;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SCAN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Checks the scan status once, then keeps polling only while a scan runs.
/// A failed first check stops polling; failures mid-scan keep the last status.
pub struct ScanMonitor {
    latest: Arc<Mutex<Option<ScanStatus>>>,
    failed: Arc<AtomicBool>,
    poller: Poller,
    seen_running: bool,
    visible: bool,
}

impl ScanMonitor {
    pub fn new<F>(fetch: F, interval: Duration) -> Self
    where
        F: Fn() -> Result<ScanStatus, ApiError> + Send + Sync + 'static,
    {
        let latest = Arc::new(Mutex::new(None));
        let failed = Arc::new(AtomicBool::new(false));
        let (slot, flag) = (latest.clone(), failed.clone());
        let poller = Poller::new(
            "scan-status",
            move || -> Result<(), ApiError> {
                match fetch() {
                    Ok(status) => {
                        *slot.lock() = Some(status);
                        flag.store(false, Ordering::SeqCst);
                        Ok(())
                    }
                    Err(e) => {
                        flag.store(true, Ordering::SeqCst);
                        Err(e)
                    }
                }
            },
            interval,
            true,
        );
        Self {
            latest,
            failed,
            poller,
            seen_running: false,
            visible: false,
        }
    }

    /// Pick up the latest status. Returns true when visibility changed.
    pub fn update(&mut self) -> bool {
        if self.failed.load(Ordering::SeqCst) && !self.seen_running {
            self.poller.set_enabled(false);
        }
        let running = match &*self.latest.lock() {
            Some(status) => status.status == ScanState::Running,
            None => return false,
        };
        self.seen_running |= running;
        if !running {
            self.poller.set_enabled(false);
        }
        let changed = self.visible != running;
        self.visible = running;
        changed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn is_polling(&self) -> bool {
        self.poller.is_enabled()
    }

    /// Latest status, while the indicator is shown.
    pub fn status(&self) -> Option<ScanStatus> {
        if !self.visible {
            return None;
        }
        self.latest.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::wait_until;
    use std::sync::atomic::AtomicUsize;

    fn status(state: ScanState, synced: u64) -> ScanStatus {
        ScanStatus {
            status: state,
            projects_processed: 1,
            sessions_found: 100,
            sessions_synced: synced,
            sessions_skipped: 5,
            error_count: 0,
            started_at: "2026-01-27T10:00:00Z".to_string(),
            completed_at: None,
            last_error: None,
        }
    }

    #[test]
    fn test_hidden_and_stops_when_idle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut monitor = ScanMonitor::new(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(status(ScanState::Completed, 10))
            },
            Duration::from_millis(10),
        );
        assert!(wait_until(|| {
            monitor.update();
            !monitor.is_polling()
        }));
        assert!(!monitor.is_visible());
        let seen = calls.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));
        assert!(calls.load(Ordering::SeqCst) <= seen + 1);
    }

    #[test]
    fn test_visible_while_running_then_hides() {
        let state = Arc::new(Mutex::new(ScanState::Running));
        let s = state.clone();
        let mut monitor = ScanMonitor::new(
            move || Ok(status(*s.lock(), 40)),
            Duration::from_millis(10),
        );
        assert!(wait_until(|| {
            monitor.update();
            monitor.is_visible()
        }));
        assert!(monitor.is_polling());
        let shown = monitor.status().unwrap();
        assert_eq!(shown.processed_sessions(), 45);

        *state.lock() = ScanState::Completed;
        assert!(wait_until(|| {
            monitor.update();
            !monitor.is_visible()
        }));
        assert!(!monitor.is_polling());
        assert!(monitor.status().is_none());
    }

    #[test]
    fn test_failed_first_check_hides_and_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut monitor = ScanMonitor::new(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Network("connection refused".to_string()))
            },
            Duration::from_millis(10),
        );
        assert!(wait_until(|| {
            monitor.update();
            !monitor.is_polling()
        }));
        assert!(!monitor.is_visible());
        let seen = calls.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));
        assert!(calls.load(Ordering::SeqCst) <= seen + 1);
    }

    #[test]
    fn test_error_mid_scan_keeps_polling() {
        let ok = Arc::new(Mutex::new(true));
        let o = ok.clone();
        let (tx, rx) = std::sync::mpsc::channel();
        let mut monitor = ScanMonitor::new(
            move || {
                let _ = tx.send(());
                if *o.lock() {
                    Ok(status(ScanState::Running, 10))
                } else {
                    Err(ApiError::Network("timed out".to_string()))
                }
            },
            Duration::from_millis(10),
        );
        assert!(wait_until(|| {
            monitor.update();
            monitor.is_visible()
        }));

        *ok.lock() = false;
        while rx.try_recv().is_ok() {}
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }
        monitor.update();
        assert!(monitor.is_polling());
        assert!(monitor.is_visible());
        assert_eq!(monitor.status().unwrap().sessions_synced, 10);
    }
}
