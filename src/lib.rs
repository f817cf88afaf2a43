//! Caches which turn expensive, externally sourced blobs into long-lived, handle-addressed resources.
//!
//! A real-time loop asks for the same named image or sound every frame.  Decoding it every frame is out of the
//! question, but so is keeping everything forever, and reference counting down to zero would unload a resource the
//! moment it scrolls off screen only to decode it again a second later.  This crate sits in between: records are kept
//! in a [Pool] and found by name through a [NameIndex], and they are only reclaimed in batches by a periodic sweep once
//! they have sat unused for longer than a configured TTL.
//!
//! There are two lifetime policies:
//!
//! - [HolderCache] counts holders explicitly.  `load` and `release` come in pairs, and a record becomes eligible for
//!   sweeping when its last holder releases it.  Use this for things held across many frames, such as images.
//! - [StampCache] has no release.  Every request stamps the record, and sweeps free what hasn't been requested for a
//!   while.  Use this for things fetched and used briefly, such as documents and sound clips.
//!
//! Sheets of tiles get special treatment.  A [Sheet] is cached like any other record, but the tiles cut from it with
//! [DerivedViewRegistry::slice] are cheap views which alias the sheet's storage, are never cached by name, and are
//! freed the moment they're released.  [Images] puts all of this behind one surface for renderers.
//!
//! Failure to load is a normal outcome rather than an error: the caller gets [Handle::INVALID] (or `None`) and the
//! miss is remembered, so a broken name isn't retried every frame.  See [MissPolicy].
//!
//! To use this crate, implement [BlobLoader] (or use [FilesystemLoader] or [MemoryLoader]) and [Decoder] for each
//! resource kind, then construct the caches with a [Clock] and a [CacheConfig].  Everything is single-threaded: one
//! owner drives loads, releases and sweeps.
mod clock;
mod config;
mod decoders;
mod derived;
mod error;
mod filesystem_loader;
mod handle;
mod holder_cache;
mod images;
mod memory_loader;
mod name_index;
mod pool;
mod resource_cache;
mod sheet;
mod stamp_cache;
mod sweep;
mod traits;

#[cfg(test)]
mod test_util;

pub use clock::{Clock, ManualClock, Millis, MonotonicClock};
pub use config::*;
pub use decoders::*;
pub use derived::*;
pub use error::*;
pub use filesystem_loader::*;
pub use handle::*;
pub use holder_cache::*;
pub use images::*;
pub use memory_loader::*;
pub use name_index::*;
pub use pool::*;
pub use resource_cache::CacheStats;
pub use sheet::*;
pub use stamp_cache::*;
pub use sweep::*;
pub use traits::*;
