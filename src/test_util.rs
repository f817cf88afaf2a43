//! Fakes shared by the unit tests.
use std::cell::Cell;
use std::rc::Rc;

use crate::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl FakeImage {
    pub(crate) fn new(width: u32, height: u32) -> FakeImage {
        FakeImage { width, height }
    }
}

impl Dimensions for FakeImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Debug, thiserror::Error)]
#[error("not a WxH image")]
pub(crate) struct FakeImageError;

/// Decodes payloads like `32x16` into a [FakeImage], counting every attempt.
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeImageDecoder {
    decodes: Rc<Cell<usize>>,
}

impl FakeImageDecoder {
    pub(crate) fn decode_count(&self) -> usize {
        self.decodes.get()
    }
}

impl Decoder for FakeImageDecoder {
    type Output = FakeImage;
    type Params = ();
    type Error = FakeImageError;

    fn decode(&self, bytes: &[u8], _params: &()) -> Result<FakeImage, FakeImageError> {
        self.decodes.set(self.decodes.get() + 1);
        let text = std::str::from_utf8(bytes).map_err(|_| FakeImageError)?;
        let (w, h) = text.trim().split_once('x').ok_or(FakeImageError)?;
        Ok(FakeImage {
            width: w.parse().map_err(|_| FakeImageError)?,
            height: h.parse().map_err(|_| FakeImageError)?,
        })
    }

    fn kind(&self) -> &'static str {
        "fake image"
    }
}
