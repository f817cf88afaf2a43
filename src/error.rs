use std::io::Error as IoError;

/// Errors which indicate a lifetime bug in the caller rather than a data problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("handle does not refer to a live record")]
    InvalidHandle,
    #[error("tile {index} is out of range for a sheet of {tile_count} tiles")]
    SliceOutOfRange { index: u32, tile_count: u32 },
    #[error("released a record with no holders")]
    Unheld,
}

/// Why a load produced a miss.
///
/// The caches collapse both variants into a cached miss after logging them.
#[derive(Debug, thiserror::Error)]
pub enum LoadError<DecoderError> {
    #[error("{key}: blob not found")]
    NotFound {
        key: String,
        #[source]
        source: IoError,
    },
    #[error("{key}: decode failed")]
    DecodeFailed {
        key: String,
        #[source]
        source: DecoderError,
    },
}
