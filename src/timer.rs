//! Per-session turn timers.
//!
//! A timer is a tokio task that sleeps for the turn timeout and then runs a
//! callback on the blocking pool. Arming a slot aborts the task it held.
//! Without a tokio runtime timers are disabled.

use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Holds the pending timer task of one session.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TimerSlot {
    /// Schedules `fire` after `timeout`, replacing any pending timer.
    ///
    /// Returns false if no tokio runtime is available.
    pub fn arm<F>(&self, timeout: Duration, fire: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            debug!("No tokio runtime, turn timer disabled");
            self.cancel();
            return false;
        };
        let handle = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Err(e) = tokio::task::spawn_blocking(fire).await {
                warn!(error = %e, "Turn timer callback failed");
            }
        });
        self.replace(Some(handle));
        true
    }

    /// Aborts the pending timer, if any.
    pub fn cancel(&self) {
        self.replace(None);
    }

    /// Returns true while a timer task is pending.
    pub fn is_armed(&self) -> bool {
        self.handle
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    fn replace(&self, next: Option<JoinHandle<()>>) {
        match self.handle.lock() {
            Ok(mut slot) => {
                if let Some(previous) = std::mem::replace(&mut *slot, next) {
                    previous.abort();
                }
            }
            Err(_) => warn!("Timer slot lock poisoned"),
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
