// src/background/signal.rs
// Settable force-translate signal with a timed wait

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Level-triggered flag plus a wakeup.
///
/// Raising is idempotent until the worker takes it. Checking with
/// `is_raised` leaves the flag set for the next `wait_timeout`.
#[derive(Debug, Default)]
pub struct ForceSignal {
    raised: AtomicBool,
    notify: Notify,
}

impl ForceSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Clear the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }

    /// Wait until raised or `timeout` elapses. Returns true (and clears the
    /// flag) if it was raised.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.take() {
                return true;
            }
            tokio::select! {
                // A leftover permit from an already-taken raise lands here too
                _ = self.notify.notified() => continue,
                _ = tokio::time::sleep_until(deadline) => return self.take(),
            }
        }
    }
}
