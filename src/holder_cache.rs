//! The [HolderCache] drives a [BlobLoader] and a [Decoder], handing out pooled records by [Handle] and counting who
//! holds them.
//!
//! This is the policy for resources which stay in use continuously for many frames, such as an image on screen:
//!
//! - [HolderCache::load] returns the same handle for the same name and bumps the holder count.
//! - [HolderCache::release] drops the count, and stamps the time when it reaches zero.  It never frees anything.
//! - [HolderCache::sweep] frees records which have had no holders since at or before a cutoff.
//!
//! A name which failed to load is remembered as a miss so that the loader isn't hammered every frame; see
//! [MissPolicy] for when it's retried.  Any record which must never be unloaded may be pinned with
//! [HolderCache::pin], at which point only [HolderCache::invalidate] removes it.
use std::sync::Arc;

use tracing::{debug, trace};

use crate::clock::cutoff_before;
use crate::resource_cache::fetch_logged;
use crate::*;

pub(crate) struct HeldRecord<T> {
    /// `None` once the name was invalidated, or when caching is disabled.
    key: Option<Arc<str>>,
    value: T,
    holders: u32,
    /// Only meaningful while `holders` is zero.
    last_release: Millis,
    /// Derived views aliasing this record's storage.
    borrowers: u32,
    pinned: bool,
}

impl<T> HeldRecord<T> {
    fn idle(&self) -> bool {
        self.holders == 0 && self.borrowers == 0
    }
}

impl<T> Reclaim for HeldRecord<T> {
    fn reclaimable(&self, cutoff: Millis) -> bool {
        self.idle() && !self.pinned && self.last_release <= cutoff
    }
}

pub struct HolderCache<L, D: Decoder, C> {
    config: CacheConfig,
    loader: L,
    decoder: D,
    clock: C,
    index: NameIndex<D::Output>,
    pool: Pool<HeldRecord<D::Output>>,
    stats: CacheStats,
}

impl<L: BlobLoader, D: Decoder, C: Clock> HolderCache<L, D, C> {
    pub fn new(loader: L, decoder: D, clock: C, config: CacheConfig) -> HolderCache<L, D, C> {
        HolderCache {
            config,
            loader,
            decoder,
            clock,
            index: NameIndex::new(),
            pool: Pool::new(),
            stats: Default::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of live records, held or not.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    fn record(&self, handle: Handle<D::Output>) -> Option<&HeldRecord<D::Output>> {
        self.pool.get(handle.cast())
    }

    fn record_mut(&mut self, handle: Handle<D::Output>) -> Option<&mut HeldRecord<D::Output>> {
        self.pool.get_mut(handle.cast())
    }

    /// Load a resource which needs no parameters.
    pub fn load(&mut self, name: &str) -> Handle<D::Output>
    where
        D::Params: Default,
    {
        self.load_with(name, &Default::default())
    }

    /// Find or decode `name`, becoming one of its holders.
    ///
    /// Returns [Handle::INVALID] if the name can't be loaded now or couldn't be loaded before.  The caller must
    /// eventually [release](Self::release) every valid handle it gets from here, or the record is never swept.
    ///
    /// `params` only matter when this call decodes; a cached record is returned as is.
    pub fn load_with(&mut self, name: &str, params: &D::Params) -> Handle<D::Output> {
        let now = self.clock.now();

        if self.config.enabled {
            match self.index.lookup(name, now, &self.config.miss_policy) {
                Lookup::Hit(h) => {
                    if let Some(rec) = self.pool.get_mut(h.cast()) {
                        rec.holders += 1;
                        self.stats.hits += 1;
                        trace!(key = name, holders = rec.holders, "Cache hit");
                        return h;
                    }
                    // Index and pool disagree; decode again.
                    self.index.remove(name);
                }
                Lookup::Miss => {
                    self.stats.misses += 1;
                    trace!(key = name, "Cached miss");
                    return Handle::INVALID;
                }
                Lookup::Absent => {}
            }
        }

        match fetch_logged(
            &self.loader,
            &self.decoder,
            name,
            params,
            &mut self.stats,
        ) {
            Some(value) => self.install(name, value, 1, false, now),
            None => {
                if self.config.enabled && self.config.miss_policy != MissPolicy::Uncached {
                    self.index.insert_miss(name.into(), now);
                }
                Handle::INVALID
            }
        }
    }

    fn install(
        &mut self,
        name: &str,
        value: D::Output,
        holders: u32,
        pinned: bool,
        now: Millis,
    ) -> Handle<D::Output> {
        let key: Option<Arc<str>> = if self.config.enabled {
            Some(name.into())
        } else {
            None
        };
        if key.is_some() {
            if let Some(old) = self.index.remove(name) {
                self.orphan(old);
            }
        }

        let handle = self
            .pool
            .allocate(HeldRecord {
                key: key.clone(),
                value,
                holders,
                last_release: now,
                borrowers: 0,
                pinned: pinned && key.is_some(),
            })
            .cast();
        if let Some(k) = key {
            self.index.insert_hit(k, handle);
        }
        handle
    }

    /// Detach a record from its name, freeing it right away if nothing uses it.
    fn orphan(&mut self, handle: Handle<D::Output>) {
        let idle = match self.record_mut(handle) {
            Some(rec) => {
                rec.key = None;
                rec.pinned = false;
                rec.idle()
            }
            None => return,
        };
        if idle {
            self.free(handle);
        }
    }

    fn free(&mut self, handle: Handle<D::Output>) {
        if self.pool.release(handle.cast()).is_some() {
            self.stats.freed += 1;
        }
    }

    /// Stop holding a record.
    ///
    /// Releasing [Handle::INVALID] does nothing, so misses may be released like anything else.  A record whose last
    /// holder left stays cached until a sweep decides it's stale, unless it has no name, in which case nothing could
    /// ever find it again and it's freed immediately.
    pub fn release(&mut self, handle: Handle<D::Output>) -> Result<(), CacheError> {
        if !handle.is_valid() {
            return Ok(());
        }

        let now = self.clock.now();
        let rec = self.record_mut(handle).ok_or(CacheError::InvalidHandle)?;
        if rec.holders == 0 {
            return Err(CacheError::Unheld);
        }

        rec.holders -= 1;
        if rec.holders == 0 {
            rec.last_release = now;
            if rec.key.is_none() && rec.idle() && !rec.pinned {
                self.free(handle);
            }
        }
        Ok(())
    }

    pub fn get(&self, handle: Handle<D::Output>) -> Option<&D::Output> {
        self.record(handle).map(|r| &r.value)
    }

    pub fn holders(&self, handle: Handle<D::Output>) -> Option<u32> {
        self.record(handle).map(|r| r.holders)
    }

    /// When the last holder left, if there are no holders now.
    pub fn last_release(&self, handle: Handle<D::Output>) -> Option<Millis> {
        self.record(handle)
            .filter(|r| r.holders == 0)
            .map(|r| r.last_release)
    }

    /// The handle cached under `name`, without becoming a holder.
    pub fn peek(&self, name: &str) -> Option<Handle<D::Output>> {
        self.index.handle(name)
    }

    /// Install an already decoded value under `name` with no holders, replacing whatever was cached there.
    pub fn insert(&mut self, name: &str, value: D::Output) -> Handle<D::Output> {
        let now = self.clock.now();
        self.install(name, value, 0, false, now)
    }

    /// Like [Self::insert], but the record is never swept.
    ///
    /// With caching disabled there is no name to invalidate it by, so the record is installed unpinned and
    /// sweeps like any other.
    pub fn pin(&mut self, name: &str, value: D::Output) -> Handle<D::Output> {
        let now = self.clock.now();
        self.install(name, value, 0, true, now)
    }

    /// Forget `name`, whether it was a record or a miss.  Returns whether anything was known about it.
    ///
    /// A record which is still held or borrowed stays alive for its holders and is freed once they're done.  The next
    /// load of `name` decodes again.
    pub fn invalidate(&mut self, name: &str) -> bool {
        let known = self.index.contains(name);
        if let Some(h) = self.index.remove(name) {
            self.orphan(h);
        }
        known
    }

    /// Forget every cached miss so those names are retried on their next load.
    pub fn invalidate_misses(&mut self) -> usize {
        self.index.clear_misses()
    }

    /// Mark that a derived view now aliases this record's storage, returning the storage.
    pub(crate) fn lend(&mut self, handle: Handle<D::Output>) -> Result<&D::Output, CacheError> {
        let rec = self.record_mut(handle).ok_or(CacheError::InvalidHandle)?;
        rec.borrowers += 1;
        Ok(&rec.value)
    }

    pub(crate) fn unlend(&mut self, handle: Handle<D::Output>) -> Result<(), CacheError> {
        let now = self.clock.now();
        let rec = self.record_mut(handle).ok_or(CacheError::InvalidHandle)?;
        if rec.borrowers == 0 {
            return Err(CacheError::Unheld);
        }

        rec.borrowers -= 1;
        if rec.idle() {
            // The last view going away counts as the last use.
            rec.last_release = now;
            if rec.key.is_none() && !rec.pinned {
                self.free(handle);
            }
        }
        Ok(())
    }

    pub(crate) fn borrowers(&self, handle: Handle<D::Output>) -> Option<u32> {
        self.record(handle).map(|r| r.borrowers)
    }

    /// Free every record with no holders or views which was last released at or before `cutoff`.
    pub fn sweep(&mut self, cutoff: Millis) -> SweepReport {
        let (report, freed) = crate::sweep::sweep(&mut self.pool, cutoff);
        for (h, rec) in freed {
            if let Some(k) = rec.key {
                self.index.remove_hit(&k, h.cast());
            }
        }

        self.stats.freed += report.freed as u64;
        if report.freed > 0 {
            debug!(
                kind = self.decoder.kind(),
                cutoff,
                scanned = report.scanned,
                freed = report.freed,
                "Swept holder-counted cache"
            );
        }
        report
    }

    /// Sweep everything released more than the configured TTL ago.
    pub fn sweep_expired(&mut self) -> SweepReport {
        match cutoff_before(self.clock.now(), self.config.ttl) {
            Some(cutoff) => self.sweep(cutoff),
            None => SweepReport::default(),
        }
    }
}

impl<L: BlobLoader, D: Decoder, C: Clock> Sweep for HolderCache<L, D, C> {
    fn sweep(&mut self, cutoff: Millis) -> SweepReport {
        HolderCache::sweep(self, cutoff)
    }

    fn sweep_expired(&mut self) -> SweepReport {
        HolderCache::sweep_expired(self)
    }
}
