//! Batched, time-based reclamation.
//!
//! Nothing in this crate frees a cached record the moment it becomes unused.  Instead the engine calls
//! [Sweep::sweep_expired] on a cadence of its own (a [SweepSchedule] helps with that), and every record which has been
//! idle for longer than its horizon is freed in one pass.
use std::time::Duration;

use crate::clock::{duration_millis, Millis};
use crate::{Handle, Pool};

/// A pool record which can decide whether it may be freed.
pub trait Reclaim {
    /// May this record be freed if everything at or before `cutoff` counts as stale?
    fn reclaimable(&self, cutoff: Millis) -> bool;
}

/// What a sweep did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Live records looked at.
    pub scanned: usize,
    pub freed: usize,
}

impl std::ops::Add for SweepReport {
    type Output = SweepReport;

    fn add(self, other: SweepReport) -> SweepReport {
        SweepReport {
            scanned: self.scanned + other.scanned,
            freed: self.freed + other.freed,
        }
    }
}

impl std::ops::AddAssign for SweepReport {
    fn add_assign(&mut self, other: SweepReport) {
        *self = *self + other;
    }
}

/// Free every reclaimable record of `pool`, returning the freed records so the caller can drop their names.
pub fn sweep<T: Reclaim>(pool: &mut Pool<T>, cutoff: Millis) -> (SweepReport, Vec<(Handle<T>, T)>) {
    let scanned = pool.len();
    let freed = pool.drain_where(|r| r.reclaimable(cutoff));
    (
        SweepReport {
            scanned,
            freed: freed.len(),
        },
        freed,
    )
}

/// Implemented by every cache so that an engine can sweep all of them the same way.
pub trait Sweep {
    /// Free everything idle since at or before `cutoff`.
    fn sweep(&mut self, cutoff: Millis) -> SweepReport;

    /// Sweep against the cache's own configured horizons and clock.
    fn sweep_expired(&mut self) -> SweepReport;
}

/// Decides which ticks should run a sweep.
#[derive(Debug, Clone)]
pub struct SweepSchedule {
    interval: Millis,
    last: Option<Millis>,
}

impl SweepSchedule {
    pub fn new(interval: Duration) -> SweepSchedule {
        SweepSchedule {
            interval: duration_millis(interval),
            last: None,
        }
    }

    /// Returns true, and starts a new interval, if a sweep is due at `now`.  The first call is always due.
    pub fn due(&mut self, now: Millis) -> bool {
        match self.last {
            Some(last) if now.saturating_sub(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
