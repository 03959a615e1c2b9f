//! Minimum-interval gate for external directory calls.
//!
//! Each backend gets its own gate keyed by name. A caller holds the gate for
//! the whole read-sleep-stamp sequence, so two plotters sharing a limiter can
//! never both observe a stale "last call" time and burst through together.
//! The limiter never queues or reorders; it only delays the current caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::stop::StopToken;

/// Time source used by the limiter.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Block for `duration`, returning `true` if `stop` fired first.
    fn sleep(&self, duration: Duration, stop: &StopToken) -> bool;
}

/// Wall-clock time with interruptible sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration, stop: &StopToken) -> bool {
        stop.wait_timeout(duration)
    }
}

/// Deterministic clock for tests: sleeping advances time instantly and is
/// recorded.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        self.state().offset += by;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state().sleeps.clone()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.state().offset
    }

    fn sleep(&self, duration: Duration, stop: &StopToken) -> bool {
        if stop.is_stopped() {
            return true;
        }
        let mut state = self.state();
        state.offset += duration;
        state.sleeps.push(duration);
        false
    }
}

type Gate = Arc<Mutex<Option<Instant>>>;

/// Per-backend minimum-interval limiter.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    gates: Mutex<HashMap<String, Gate>>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// A limiter backed by the wall clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Wait until `backend` may be called again, then stamp the call start.
    ///
    /// Returns `false` without stamping when `stop` fires before or during the
    /// wait; the caller must then skip the request.
    pub fn acquire(&self, backend: &str, min_interval: Duration, stop: &StopToken) -> bool {
        if stop.is_stopped() {
            return false;
        }

        let gate = self.gate(backend);
        let mut last_call = gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(last) = *last_call {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < min_interval {
                let remaining = min_interval - elapsed;
                debug!(
                    backend,
                    wait_ms = remaining.as_millis() as u64,
                    "rate limiting directory call"
                );
                if self.clock.sleep(remaining, stop) {
                    return false;
                }
            }
        }

        if stop.is_stopped() {
            return false;
        }
        *last_call = Some(self.clock.now());
        true
    }

    fn gate(&self, backend: &str) -> Gate {
        let mut gates = self
            .gates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        gates.entry(backend.to_string()).or_default().clone()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backends = self
            .gates
            .lock()
            .map(|gates| gates.len())
            .unwrap_or_default();
        f.debug_struct("RateLimiter")
            .field("backends", &backends)
            .finish()
    }
}
