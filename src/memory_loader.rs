use std::collections::HashMap;
use std::io::{Error, ErrorKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::*;

/// A loader wrapping a `HashMap`, for embedded assets and tests.
///
/// Counts how many times it was asked for something, found or not.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    loads: AtomicU64,
}

impl MemoryLoader {
    pub fn new() -> MemoryLoader {
        Default::default()
    }

    pub fn insert(&self, key: &str, value: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.lock().insert(key.to_string(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().remove(key)
    }

    /// Number of calls to [BlobLoader::load] so far.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map is still a consistent map.
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BlobLoader for MemoryLoader {
    fn load(&self, key: &str) -> Result<Vec<u8>, Error> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("{}: entry not found", key)))
    }
}
