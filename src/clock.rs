//! Time sources for the caches.
//!
//! Every timestamp in this crate is a [Millis] read from a [Clock].  The engine usually drives a [ManualClock] from
//! its own tick counter so that eviction follows game time rather than wall time.
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic milliseconds.
pub type Millis = u64;

pub trait Clock {
    fn now(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

/// A clock which only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Millis) -> ManualClock {
        ManualClock {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::Relaxed);
    }

    /// Move the clock forward, returning the new time.
    pub fn advance(&self, by: Duration) -> Millis {
        let by = duration_millis(by);
        self.now.fetch_add(by, Ordering::Relaxed) + by
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.load(Ordering::Relaxed)
    }
}

/// Milliseconds elapsed since the clock was constructed.
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> MonotonicClock {
        MonotonicClock {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Millis {
        duration_millis(self.start.elapsed())
    }
}

pub(crate) fn duration_millis(d: Duration) -> Millis {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// The latest timestamp which is at least `horizon` in the past, or `None` if the clock hasn't run that long yet.
pub(crate) fn cutoff_before(now: Millis, horizon: Duration) -> Option<Millis> {
    now.checked_sub(duration_millis(horizon))
}
