//! Tiled image sheets: one decoded image cut into a grid of equally sized tiles.
//!
//! Row-major tile `i` of a sheet with `columns` tiles per row sits at `((i % columns) * tile_width, (i / columns) *
//! tile_height)`.  Partial tiles at the right and bottom edges are not part of the grid.
use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    pub fn new(width: u32, height: u32) -> TileSize {
        TileSize { width, height }
    }
}

/// A rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Something which can be sliced into numbered tiles.
pub trait Tiled {
    fn tile_count(&self) -> u32;

    /// Where tile `index` lies, or `None` if out of range.
    fn tile_region(&self, index: u32) -> Option<Region>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet<I> {
    image: I,
    tile: TileSize,
    columns: u32,
    rows: u32,
}

impl<I: Dimensions> Sheet<I> {
    /// Returns `None` if either tile dimension is zero.
    pub fn new(image: I, tile: TileSize) -> Option<Sheet<I>> {
        if tile.width == 0 || tile.height == 0 {
            return None;
        }
        let columns = image.width() / tile.width;
        let rows = image.height() / tile.height;
        Some(Sheet {
            image,
            tile,
            columns,
            rows,
        })
    }

    pub fn image(&self) -> &I {
        &self.image
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }
}

impl<I: Dimensions> Dimensions for Sheet<I> {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }
}

impl<I: Dimensions> Tiled for Sheet<I> {
    fn tile_count(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    fn tile_region(&self, index: u32) -> Option<Region> {
        if index >= self.tile_count() {
            return None;
        }
        Some(Region {
            x: (index % self.columns) * self.tile.width,
            y: (index / self.columns) * self.tile.height,
            width: self.tile.width,
            height: self.tile.height,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SheetError<ImageError> {
    #[error("could not decode the sheet image")]
    Image(#[source] ImageError),
    #[error("tile size {0:?} has a zero dimension")]
    ZeroTileSize(TileSize),
}

/// Wraps an image decoder so that it produces [Sheet]s cut to the tile size given as parameter.
#[derive(Debug, Default, Clone)]
pub struct SheetDecoder<D>(pub D);

impl<D> Decoder for SheetDecoder<D>
where
    D: Decoder,
    D::Output: Dimensions,
    D::Params: Default,
{
    type Output = Sheet<D::Output>;
    type Params = TileSize;
    type Error = SheetError<D::Error>;

    fn decode(&self, bytes: &[u8], tile: &TileSize) -> Result<Self::Output, Self::Error> {
        if tile.width == 0 || tile.height == 0 {
            return Err(SheetError::ZeroTileSize(*tile));
        }
        let image = self
            .0
            .decode(bytes, &Default::default())
            .map_err(SheetError::Image)?;
        Sheet::new(image, *tile).ok_or(SheetError::ZeroTileSize(*tile))
    }

    fn kind(&self) -> &'static str {
        "sheet"
    }
}
