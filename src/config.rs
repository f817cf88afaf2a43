use std::time::Duration;

/// What to do about names which failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    /// Remember the miss until it is explicitly invalidated.
    Permanent,
    /// Forget the miss once it is older than the given duration, so the loader is consulted again.
    RetryAfter(Duration),
    /// Don't remember misses at all.
    Uncached,
}

impl Default for MissPolicy {
    fn default() -> Self {
        MissPolicy::Permanent
    }
}

#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct CacheConfig {
    /// If false, nothing is indexed by name and every load decodes afresh.
    pub enabled: bool,
    /// How long a released (or, for the timestamped cache, last used) record survives sweeps.
    pub ttl: Duration,
    /// The shorter horizon for momentary requests to the timestamped cache.  May not exceed `ttl`.
    pub momentary_ttl: Duration,
    pub miss_policy: MissPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            ttl: Duration::from_secs(300),
            momentary_ttl: Duration::from_secs(10),
            miss_policy: MissPolicy::Permanent,
        }
    }
}

impl CacheConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let defaults = CacheConfig::default();
        let ttl = self.ttl.unwrap_or(defaults.ttl);
        let momentary_ttl = self.momentary_ttl.unwrap_or(defaults.momentary_ttl);
        if momentary_ttl > ttl {
            return Err(format!(
                "momentary_ttl ({:?}) may not exceed ttl ({:?})",
                momentary_ttl, ttl
            ));
        }
        Ok(())
    }
}
