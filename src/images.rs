//! [Images] is the surface renderers use for image kinds.
//!
//! It ties together a holder-counted cache of standalone images, a holder-counted cache of tiled sheets, and the
//! registry of tiles sliced out of those sheets.  An [ImageRef] is either kind of drawable image; releasing one does
//! the right thing for its origin.
use std::fmt;

use crate::*;

/// A drawable image: a standalone record which owns its pixels, or a tile which aliases a sheet's.
pub enum ImageRef<I> {
    Standalone(Handle<I>),
    Tile(ViewHandle<Sheet<I>>),
}

impl<I> ImageRef<I> {
    pub const INVALID: ImageRef<I> = ImageRef::Standalone(Handle::INVALID);

    pub fn is_valid(&self) -> bool {
        match self {
            ImageRef::Standalone(h) => h.is_valid(),
            ImageRef::Tile(h) => h.is_valid(),
        }
    }
}

impl<I> Clone for ImageRef<I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for ImageRef<I> {}

impl<I> PartialEq for ImageRef<I> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ImageRef::Standalone(a), ImageRef::Standalone(b)) => a == b,
            (ImageRef::Tile(a), ImageRef::Tile(b)) => a == b,
            _ => false,
        }
    }
}

impl<I> Eq for ImageRef<I> {}

impl<I> fmt::Debug for ImageRef<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Standalone(h) => f.debug_tuple("Standalone").field(h).finish(),
            ImageRef::Tile(h) => f.debug_tuple("Tile").field(h).finish(),
        }
    }
}

/// What a renderer needs to draw an image: the decoded pixels and the part of them to use.
#[derive(Debug)]
pub struct ImageSource<'a, I> {
    pub image: &'a I,
    pub region: Region,
}

pub struct Images<L, D, C>
where
    D: Decoder,
    D::Output: Dimensions,
    D::Params: Default,
{
    images: HolderCache<L, D, C>,
    sheets: HolderCache<L, SheetDecoder<D>, C>,
    tiles: DerivedViewRegistry<Sheet<D::Output>>,
}

impl<L, D, C> Images<L, D, C>
where
    L: BlobLoader + Clone,
    D: Decoder + Clone,
    D::Output: Dimensions,
    D::Params: Default,
    C: Clock + Clone,
{
    /// Both caches share the loader, clock and configuration.
    pub fn new(loader: L, decoder: D, clock: C, config: CacheConfig) -> Images<L, D, C> {
        Images {
            images: HolderCache::new(
                loader.clone(),
                decoder.clone(),
                clock.clone(),
                config.clone(),
            ),
            sheets: HolderCache::new(loader, SheetDecoder(decoder), clock, config),
            tiles: DerivedViewRegistry::new(),
        }
    }
}

impl<L, D, C> Images<L, D, C>
where
    L: BlobLoader,
    D: Decoder,
    D::Output: Dimensions,
    D::Params: Default,
    C: Clock,
{
    pub fn images(&self) -> &HolderCache<L, D, C> {
        &self.images
    }

    pub fn sheets(&self) -> &HolderCache<L, SheetDecoder<D>, C> {
        &self.sheets
    }

    /// Number of live tiles.
    pub fn tile_views(&self) -> usize {
        self.tiles.len()
    }

    pub fn load(&mut self, name: &str) -> ImageRef<D::Output> {
        ImageRef::Standalone(self.images.load(name))
    }

    /// Load `name` as a sheet of `tile`-sized tiles.  A sheet already cached keeps the tile size it was loaded with.
    pub fn load_sheet(&mut self, name: &str, tile: TileSize) -> Handle<Sheet<D::Output>> {
        self.sheets.load_with(name, &tile)
    }

    /// Release a standalone image or a tile.
    pub fn release(&mut self, image: ImageRef<D::Output>) -> Result<(), CacheError> {
        match image {
            ImageRef::Standalone(h) => self.images.release(h),
            ImageRef::Tile(h) => self.tiles.release(&mut self.sheets, h),
        }
    }

    pub fn release_sheet(&mut self, sheet: Handle<Sheet<D::Output>>) -> Result<(), CacheError> {
        self.sheets.release(sheet)
    }

    pub fn tile_count(&self, sheet: Handle<Sheet<D::Output>>) -> Result<u32, CacheError> {
        self.sheets
            .get(sheet)
            .map(|s| s.tile_count())
            .ok_or(CacheError::InvalidHandle)
    }

    /// Cut tile `index` out of `sheet`.  The tile must be released on its own; it doesn't hold the sheet.
    pub fn slice(
        &mut self,
        sheet: Handle<Sheet<D::Output>>,
        index: u32,
    ) -> Result<ImageRef<D::Output>, CacheError> {
        self.tiles
            .slice(&mut self.sheets, sheet, index)
            .map(ImageRef::Tile)
    }

    pub fn source(&self, image: ImageRef<D::Output>) -> Result<ImageSource<'_, D::Output>, CacheError> {
        match image {
            ImageRef::Standalone(h) => {
                let image = self.images.get(h).ok_or(CacheError::InvalidHandle)?;
                Ok(ImageSource {
                    image,
                    region: Region {
                        x: 0,
                        y: 0,
                        width: image.width(),
                        height: image.height(),
                    },
                })
            }
            ImageRef::Tile(h) => {
                let view = self.tiles.view(h).ok_or(CacheError::InvalidHandle)?;
                let sheet = self
                    .sheets
                    .get(view.parent())
                    .ok_or(CacheError::InvalidHandle)?;
                Ok(ImageSource {
                    image: sheet.image(),
                    region: view.region(),
                })
            }
        }
    }

    pub fn width(&self, image: ImageRef<D::Output>) -> Result<u32, CacheError> {
        Ok(self.source(image)?.region.width)
    }

    pub fn height(&self, image: ImageRef<D::Output>) -> Result<u32, CacheError> {
        Ok(self.source(image)?.region.height)
    }

    pub fn sweep(&mut self, cutoff: Millis) -> SweepReport {
        self.images.sweep(cutoff) + self.sheets.sweep(cutoff)
    }

    pub fn sweep_expired(&mut self) -> SweepReport {
        self.images.sweep_expired() + self.sheets.sweep_expired()
    }
}

impl<L, D, C> Sweep for Images<L, D, C>
where
    L: BlobLoader,
    D: Decoder,
    D::Output: Dimensions,
    D::Params: Default,
    C: Clock,
{
    fn sweep(&mut self, cutoff: Millis) -> SweepReport {
        Images::sweep(self, cutoff)
    }

    fn sweep_expired(&mut self) -> SweepReport {
        Images::sweep_expired(self)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::test_util::*;

    type FakeImages = Images<Rc<MemoryLoader>, FakeImageDecoder, Rc<ManualClock>>;

    fn build() -> (Rc<MemoryLoader>, FakeImageDecoder, Rc<ManualClock>, FakeImages) {
        let loader = Rc::new(MemoryLoader::new());
        loader.insert("hero.png", "16x24");
        loader.insert("tiles.png", "64x64");
        let decoder = FakeImageDecoder::default();
        let clock = Rc::new(ManualClock::new(0));
        let cfg = CacheConfigBuilder::default()
            .ttl(Duration::from_millis(100))
            .momentary_ttl(Duration::from_millis(100))
            .build()
            .unwrap();
        let images = Images::new(loader.clone(), decoder.clone(), clock.clone(), cfg);
        (loader, decoder, clock, images)
    }

    #[test]
    fn standalone_images() {
        let (_, decoder, _, mut images) = build();
        let a = images.load("hero.png");
        let b = images.load("hero.png");
        assert_eq!(a, b);
        assert_eq!(images.width(a), Ok(16));
        assert_eq!(images.height(a), Ok(24));
        assert_eq!(decoder.decode_count(), 1);

        let missing = images.load("nope.png");
        assert!(!missing.is_valid());
        assert_eq!(missing, ImageRef::INVALID);
        assert_eq!(images.width(missing), Err(CacheError::InvalidHandle));
        images.release(missing).unwrap();

        images.release(a).unwrap();
        images.release(b).unwrap();
        assert_eq!(images.release(a), Err(CacheError::Unheld));
    }

    #[test]
    fn tiles_alias_their_sheet() {
        let (_, _, _, mut images) = build();
        let sheet = images.load_sheet("tiles.png", TileSize::new(16, 32));
        assert_eq!(images.tile_count(sheet), Ok(8));

        let tile = images.slice(sheet, 6).unwrap();
        assert_eq!(images.width(tile), Ok(16));
        assert_eq!(images.height(tile), Ok(32));
        let src = images.source(tile).unwrap();
        assert_eq!((src.region.x, src.region.y), (32, 32));
        assert_eq!(src.image, &FakeImage::new(64, 64));

        assert_eq!(
            images.slice(sheet, 8),
            Err(CacheError::SliceOutOfRange {
                index: 8,
                tile_count: 8
            })
        );

        images.release(tile).unwrap();
        assert_eq!(images.tile_views(), 0);
        assert_eq!(images.sheets().holders(sheet), Some(1));
        assert_eq!(images.release(tile), Err(CacheError::InvalidHandle));
    }

    #[test]
    fn sweeping_spares_sheets_with_tiles() {
        let (_, decoder, clock, mut images) = build();
        let hero = images.load("hero.png");
        let sheet = images.load_sheet("tiles.png", TileSize::new(32, 32));
        let tile = images.slice(sheet, 3).unwrap();
        images.release(hero).unwrap();
        images.release_sheet(sheet).unwrap();

        clock.set(500);
        assert_eq!(
            Sweep::sweep_expired(&mut images),
            SweepReport {
                scanned: 2,
                freed: 1
            }
        );
        assert_eq!(images.width(tile), Ok(32));

        images.release(tile).unwrap();
        clock.set(600);
        assert_eq!(images.sweep_expired().freed, 1);
        assert!(images.sheets().is_empty());
        assert!(images.images().is_empty());

        // Everything decodes again afterwards.
        assert!(images.load("hero.png").is_valid());
        assert_eq!(decoder.decode_count(), 3);
    }
}
