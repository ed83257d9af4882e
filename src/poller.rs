//! Interval polling on a background thread.
//!
//! A [`Poller`] invokes its callback immediately when scheduled and then once
//! per interval until it is disabled, rescheduled or dropped. A failing or
//! panicking tick is logged and the next one still fires.
//!
//! Teardown does not wait for a tick that is already running; that tick
//! completes, and no new tick starts once the stop flag is set.

use log::{debug, error};
use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type TickFn = Arc<dyn Fn() -> Result<(), String> + Send + Sync>;

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Scheduled,
}

/// Handle of a running schedule; dropping the sender also stops the thread.
struct Schedule {
    stop_tx: Sender<()>,
    stopped: Arc<AtomicBool>,
}

impl Schedule {
    fn cancel(self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.stop_tx.send(());
    }
}

pub struct Poller {
    name: &'static str,
    callback: TickFn,
    interval: Duration,
    enabled: bool,
    schedule: Option<Schedule>,
}

impl Poller {
    pub fn new<F, E>(name: &'static str, callback: F, interval: Duration, enabled: bool) -> Self
    where
        F: Fn() -> Result<(), E> + Send + Sync + 'static,
        E: Display,
    {
        let mut poller = Self {
            name,
            callback: wrap(callback),
            interval,
            enabled,
            schedule: None,
        };
        poller.reschedule();
        poller
    }

    #[cfg(test)]
    pub fn state(&self) -> PollState {
        if self.schedule.is_some() {
            PollState::Scheduled
        } else {
            PollState::Idle
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enabling fires an immediate tick; disabling cancels the pending one.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.reschedule();
    }

    /// A changed interval restarts the schedule from an immediate tick.
    #[cfg(test)]
    pub fn set_interval(&mut self, interval: Duration) {
        if self.interval == interval {
            return;
        }
        self.interval = interval;
        self.reschedule();
    }

    /// Swap the callback; always restarts the schedule from an immediate tick.
    pub fn set_callback<F, E>(&mut self, callback: F)
    where
        F: Fn() -> Result<(), E> + Send + Sync + 'static,
        E: Display,
    {
        self.callback = wrap(callback);
        self.reschedule();
    }

    fn stop(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            debug!("poller {}: stopped", self.name);
            schedule.cancel();
        }
    }

    fn reschedule(&mut self) {
        self.stop();
        if !self.enabled {
            return;
        }
        self.schedule = spawn_schedule(self.name, self.callback.clone(), self.interval);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn wrap<F, E>(callback: F) -> TickFn
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: Display,
{
    Arc::new(move || callback().map_err(|e| e.to_string()))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn run_tick(name: &str, callback: &TickFn) {
    match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("poller {}: tick failed: {}", name, e),
        Err(payload) => error!("poller {}: tick panicked: {}", name, panic_message(&*payload)),
    }
}

fn spawn_schedule(name: &'static str, callback: TickFn, interval: Duration) -> Option<Schedule> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let stopped = Arc::new(AtomicBool::new(false));
    let flag = stopped.clone();
    let spawned = thread::Builder::new()
        .name(format!("poll-{}", name))
        .spawn(move || loop {
            if flag.load(Ordering::SeqCst) {
                break;
            }
            run_tick(name, &callback);
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                _ => break,
            }
        });
    match spawned {
        Ok(_) => {
            debug!("poller {}: scheduled every {:?}", name, interval);
            Some(Schedule { stop_tx, stopped })
        }
        Err(e) => {
            error!("poller {}: failed to start thread: {}", name, e);
            None
        }
    }
}
