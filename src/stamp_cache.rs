//! The [StampCache] is the access-timestamped policy, for resources which are fetched, used briefly, and maybe asked
//! for again later, such as a parsed document or a sound clip.
//!
//! There is no release: every request stamps the record with the current time, and sweeps free whatever hasn't been
//! requested for longer than its horizon.  Requests say whether they expect to come back for the resource all session
//! ([Lifetime::Session], the configured `ttl`) or only for a short while such as a screen transition
//! ([Lifetime::Momentary], the configured `momentary_ttl`).
use std::sync::Arc;

use tracing::{debug, trace};

use crate::clock::cutoff_before;
use crate::resource_cache::fetch_logged;
use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifetime {
    Momentary,
    Session,
}

pub(crate) struct StampedRecord<T> {
    key: Arc<str>,
    value: Arc<T>,
    last_used: Millis,
    lifetime: Lifetime,
}

impl<T> Reclaim for StampedRecord<T> {
    fn reclaimable(&self, cutoff: Millis) -> bool {
        self.last_used <= cutoff
    }
}

pub struct StampCache<L, D: Decoder, C> {
    config: CacheConfig,
    loader: L,
    decoder: D,
    clock: C,
    index: NameIndex<StampedRecord<D::Output>>,
    pool: Pool<StampedRecord<D::Output>>,
    stats: CacheStats,
}

impl<L: BlobLoader, D: Decoder, C: Clock> StampCache<L, D, C> {
    pub fn new(loader: L, decoder: D, clock: C, config: CacheConfig) -> StampCache<L, D, C> {
        StampCache {
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

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn request(&mut self, name: &str, lifetime: Lifetime) -> Option<Arc<D::Output>>
    where
        D::Params: Default,
    {
        self.request_with(name, &Default::default(), lifetime)
    }

    /// Find or decode `name`, refreshing its timestamp.  Returns `None` for a miss, new or cached.
    ///
    /// A session request for something first requested as momentary keeps it for the session from then on.
    pub fn request_with(
        &mut self,
        name: &str,
        params: &D::Params,
        lifetime: Lifetime,
    ) -> Option<Arc<D::Output>> {
        let now = self.clock.now();

        if self.config.enabled {
            match self.index.lookup(name, now, &self.config.miss_policy) {
                Lookup::Hit(h) => {
                    if let Some(rec) = self.pool.get_mut(h) {
                        rec.last_used = now;
                        rec.lifetime = rec.lifetime.max(lifetime);
                        self.stats.hits += 1;
                        trace!(key = name, "Cache hit");
                        return Some(rec.value.clone());
                    }
                    self.index.remove(name);
                }
                Lookup::Miss => {
                    self.stats.misses += 1;
                    trace!(key = name, "Cached miss");
                    return None;
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
            Some(value) => Some(self.put(name, value, lifetime)),
            None => {
                if self.config.enabled && self.config.miss_policy != MissPolicy::Uncached {
                    self.index.insert_miss(name.into(), now);
                }
                None
            }
        }
    }

    /// Install an already decoded value under `name`, replacing whatever was there.
    ///
    /// With caching disabled this only wraps the value.
    pub fn put(&mut self, name: &str, value: D::Output, lifetime: Lifetime) -> Arc<D::Output> {
        let value = Arc::new(value);
        if !self.config.enabled {
            return value;
        }

        if let Some(old) = self.index.remove(name) {
            self.free(old);
        }
        let key: Arc<str> = name.into();
        let handle = self.pool.allocate(StampedRecord {
            key: key.clone(),
            value: value.clone(),
            last_used: self.clock.now(),
            lifetime,
        });
        self.index.insert_hit(key, handle);
        value
    }

    fn free(&mut self, handle: Handle<StampedRecord<D::Output>>) {
        if self.pool.release(handle).is_some() {
            self.stats.freed += 1;
        }
    }

    /// Whether `name` currently has a record, without refreshing it.
    pub fn contains(&self, name: &str) -> bool {
        self.index.handle(name).is_some()
    }

    /// Forget `name`, whether it was a record or a miss.  Outstanding `Arc`s stay valid.
    pub fn invalidate(&mut self, name: &str) -> bool {
        let known = self.index.contains(name);
        if let Some(h) = self.index.remove(name) {
            self.free(h);
        }
        known
    }

    pub fn invalidate_misses(&mut self) -> usize {
        self.index.clear_misses()
    }

    fn finish_sweep(
        &mut self,
        report: SweepReport,
        freed: Vec<(Handle<StampedRecord<D::Output>>, StampedRecord<D::Output>)>,
        cutoff: Millis,
    ) -> SweepReport {
        for (h, rec) in freed {
            self.index.remove_hit(&rec.key, h);
        }
        self.stats.freed += report.freed as u64;
        if report.freed > 0 {
            debug!(
                kind = self.decoder.kind(),
                cutoff,
                scanned = report.scanned,
                freed = report.freed,
                "Swept timestamped cache"
            );
        }
        report
    }

    /// Free every record last requested at or before `cutoff`, whatever its lifetime.
    pub fn sweep(&mut self, cutoff: Millis) -> SweepReport {
        let (report, freed) = crate::sweep::sweep(&mut self.pool, cutoff);
        self.finish_sweep(report, freed, cutoff)
    }

    /// Free momentary records idle for longer than `momentary_ttl` and session records idle for longer than `ttl`.
    pub fn sweep_expired(&mut self) -> SweepReport {
        let now = self.clock.now();
        let momentary = cutoff_before(now, self.config.momentary_ttl);
        let session = cutoff_before(now, self.config.ttl);

        let scanned = self.pool.len();
        let freed = self.pool.drain_where(|r| {
            let cutoff = match r.lifetime {
                Lifetime::Momentary => momentary,
                Lifetime::Session => session,
            };
            cutoff.map_or(false, |c| r.reclaimable(c))
        });
        let report = SweepReport {
            scanned,
            freed: freed.len(),
        };
        self.finish_sweep(report, freed, momentary.unwrap_or(0))
    }
}

impl<L: BlobLoader, D: Decoder, C: Clock> Sweep for StampCache<L, D, C> {
    fn sweep(&mut self, cutoff: Millis) -> SweepReport {
        StampCache::sweep(self, cutoff)
    }

    fn sweep_expired(&mut self) -> SweepReport {
        StampCache::sweep_expired(self)
    }
}
