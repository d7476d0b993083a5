//! One-shot broadcast flag shared by the runner and its worker threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A flag that goes from unset to set exactly once and is observed by every
/// thread holding a reference.
///
/// `is_set` is a single atomic load so workers can poll it between operations.
/// `wait_timeout` lets the coordinating thread sleep out a phase but wake as
/// soon as the flag fires.
#[derive(Debug, Default)]
pub struct Signal {
    fired: AtomicBool,
    lock: Mutex<()>,
    cvar: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Sets the flag and wakes all waiters. Returns `true` for the call that
    /// actually fired it.
    pub fn fire(&self) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let first = !self.fired.swap(true, Ordering::AcqRel);
        self.cvar.notify_all();
        first
    }

    /// Blocks until the flag is set or `timeout` elapses.
    ///
    /// Returns `true` if the flag was set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        while !self.is_set() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = match self.cvar.wait_timeout(guard, deadline - now) {
                Ok((g, _)) => g,
                Err(e) => e.into_inner().0,
            };
        }
        true
    }
}
