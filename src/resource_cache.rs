//! Pieces shared by both cache policies: the loader/decoder pipeline and hit/miss bookkeeping.
use std::time::Instant;

use tracing::{debug, warn};

use crate::*;

/// Counters kept by every cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from the index without decoding.
    pub hits: u64,
    /// Requests answered with a previously cached miss.
    pub misses: u64,
    /// Successful decodes.
    pub decodes: u64,
    /// Loads which failed in either the loader or the decoder.
    pub failures: u64,
    /// Records freed, by sweeps or eager release.
    pub freed: u64,
}

/// Read `key` from the loader and decode it.
pub(crate) fn fetch<L: BlobLoader, D: Decoder>(
    loader: &L,
    decoder: &D,
    key: &str,
    params: &D::Params,
) -> Result<D::Output, LoadError<D::Error>> {
    let bytes = loader.load(key).map_err(|source| LoadError::NotFound {
        key: key.to_string(),
        source,
    })?;

    let started = Instant::now();
    let decoded = decoder
        .decode(&bytes, params)
        .map_err(|source| LoadError::DecodeFailed {
            key: key.to_string(),
            source,
        })?;
    debug!(
        key,
        kind = decoder.kind(),
        bytes = bytes.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Constructed resource"
    );
    Ok(decoded)
}

/// Like [fetch], but logs the failure and counts the outcome.
pub(crate) fn fetch_logged<L: BlobLoader, D: Decoder>(
    loader: &L,
    decoder: &D,
    key: &str,
    params: &D::Params,
    stats: &mut CacheStats,
) -> Option<D::Output> {
    match fetch(loader, decoder, key, params) {
        Ok(x) => {
            stats.decodes += 1;
            Some(x)
        }
        Err(e) => {
            stats.failures += 1;
            let cause = std::error::Error::source(&e)
                .map(|s| s.to_string())
                .unwrap_or_default();
            warn!(key, kind = decoder.kind(), cause = %cause, "{}", e);
            None
        }
    }
}
