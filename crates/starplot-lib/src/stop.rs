//! Cooperative cancellation shared between a plotting worker and its owner.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A cloneable stop flag.
///
/// The plotter polls it at suspension points; rate-limit waits block on it so
/// that [`StopToken::stop`] wakes them immediately instead of after the full
/// interval.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn stop(&self) {
        let (lock, condvar) = &*self.inner;
        *lock_flag(lock) = true;
        condvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *lock_flag(&self.inner.0)
    }

    /// Sleep for up to `timeout`, returning early with `true` if stopped.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut stopped = lock_flag(lock);
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            stopped = match condvar.wait_timeout(stopped, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

fn lock_flag(lock: &Mutex<bool>) -> MutexGuard<'_, bool> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
