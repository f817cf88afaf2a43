//! The [NameIndex] maps lookup names to pool handles, and remembers names which failed to load.
use std::sync::Arc;

use crate::clock::{duration_millis, Millis};
use crate::{Handle, MissPolicy};

type CacheHashMap<V> = std::collections::HashMap<Arc<str>, V, ahash::RandomState>;

#[derive(Debug)]
enum IndexEntry<T> {
    Hit(Handle<T>),
    Miss { since: Millis },
}

/// Result of a [NameIndex::lookup].
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Hit(Handle<T>),
    /// The name failed to load before, and the miss hasn't expired.
    Miss,
    /// Nothing is known about the name.
    Absent,
}

pub struct NameIndex<T> {
    entries: CacheHashMap<IndexEntry<T>>,
}

impl<T> NameIndex<T> {
    pub fn new() -> NameIndex<T> {
        NameIndex {
            entries: Default::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&mut self, key: &str, now: Millis, policy: &MissPolicy) -> Lookup<T> {
        let since = match self.entries.get(key) {
            None => return Lookup::Absent,
            Some(IndexEntry::Hit(h)) => return Lookup::Hit(*h),
            Some(IndexEntry::Miss { since }) => *since,
        };

        let expired = match policy {
            MissPolicy::Permanent => false,
            MissPolicy::RetryAfter(d) => now.saturating_sub(since) >= duration_millis(*d),
            MissPolicy::Uncached => true,
        };
        if expired {
            self.entries.remove(key);
            return Lookup::Absent;
        }
        Lookup::Miss
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The handle indexed under `key`, if it is a hit.
    pub fn handle(&self, key: &str) -> Option<Handle<T>> {
        match self.entries.get(key)? {
            IndexEntry::Hit(h) => Some(*h),
            IndexEntry::Miss { .. } => None,
        }
    }

    pub fn insert_hit(&mut self, key: Arc<str>, handle: Handle<T>) {
        self.entries.insert(key, IndexEntry::Hit(handle));
    }

    pub fn insert_miss(&mut self, key: Arc<str>, now: Millis) {
        self.entries.insert(key, IndexEntry::Miss { since: now });
    }

    /// Remove whatever is indexed under `key`, returning the handle if it was a hit.
    pub fn remove(&mut self, key: &str) -> Option<Handle<T>> {
        match self.entries.remove(key)? {
            IndexEntry::Hit(h) => Some(h),
            IndexEntry::Miss { .. } => None,
        }
    }

    /// Remove `key` only if it still points at `handle`.
    pub fn remove_hit(&mut self, key: &str, handle: Handle<T>) -> bool {
        if self.handle(key) == Some(handle) {
            self.entries.remove(key);
            return true;
        }
        false
    }

    /// Forget every cached miss, returning how many there were.
    pub fn clear_misses(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| matches!(e, IndexEntry::Hit(_)));
        before - self.entries.len()
    }
}

impl<T> Default for NameIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
