//! The [BlobLoader] trait is responsible for converting string keys to raw bytes.
//!
//! The caches never interpret those bytes themselves; a [Decoder] per resource kind turns them into the in-memory
//! representation which is then pooled and handed out by handle.
use std::io::Error;
use std::rc::Rc;
use std::sync::Arc;

/// "open" a named blob and return its full contents.
///
/// Must be safe to call repeatedly for the same key.  Any error, not only [std::io::ErrorKind::NotFound], is treated
/// as the blob being unavailable.
pub trait BlobLoader {
    fn load(&self, key: &str) -> Result<Vec<u8>, Error>;
}

impl<T: BlobLoader + ?Sized> BlobLoader for &T {
    fn load(&self, key: &str) -> Result<Vec<u8>, Error> {
        (**self).load(key)
    }
}

impl<T: BlobLoader + ?Sized> BlobLoader for Rc<T> {
    fn load(&self, key: &str) -> Result<Vec<u8>, Error> {
        (**self).load(key)
    }
}

impl<T: BlobLoader + ?Sized> BlobLoader for Arc<T> {
    fn load(&self, key: &str) -> Result<Vec<u8>, Error> {
        (**self).load(key)
    }
}

/// A `Decoder` knows how to get from a byte blob to a decoded representation in memory.
///
/// `Params` carries per-kind knobs, for example the tile size of a sheet.  Kinds without any use `()`.
pub trait Decoder {
    type Output;
    type Params;
    type Error: std::error::Error + 'static;

    fn decode(&self, bytes: &[u8], params: &Self::Params) -> Result<Self::Output, Self::Error>;

    /// Short name of the resource kind, used in log lines.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self::Output>()
    }
}

/// Pixel extent of an image-like resource.
pub trait Dimensions {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}
