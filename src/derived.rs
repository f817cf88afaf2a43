//! Derived views: pool records which alias part of another record's storage instead of owning any.
//!
//! Slicing tile `i` out of a sheet only costs some arithmetic, so views aren't cached by name.  Every
//! [DerivedViewRegistry::slice] allocates a fresh view and every [DerivedViewRegistry::release] frees one on the spot,
//! with no sweep involved.  While a view exists its parent counts as borrowed and is never swept, but the parent's
//! holder count is left alone.
use tracing::trace;

use crate::*;

#[derive(Debug)]
pub struct TileView<S> {
    parent: Handle<S>,
    region: Region,
}

impl<S> TileView<S> {
    pub fn parent(&self) -> Handle<S> {
        self.parent
    }

    pub fn region(&self) -> Region {
        self.region
    }
}

pub type ViewHandle<S> = Handle<TileView<S>>;

pub struct DerivedViewRegistry<S> {
    views: Pool<TileView<S>>,
}

impl<S: Tiled> DerivedViewRegistry<S> {
    pub fn new() -> DerivedViewRegistry<S> {
        DerivedViewRegistry { views: Pool::new() }
    }

    /// Number of live views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Make a view of tile `index` of `parent`.
    ///
    /// The caller owns the returned handle and must [release](Self::release) it before the parent can be swept.
    pub fn slice<L, D, C>(
        &mut self,
        parents: &mut HolderCache<L, D, C>,
        parent: Handle<S>,
        index: u32,
    ) -> Result<ViewHandle<S>, CacheError>
    where
        L: BlobLoader,
        D: Decoder<Output = S>,
        C: Clock,
    {
        let sheet = parents.get(parent).ok_or(CacheError::InvalidHandle)?;
        let region = sheet
            .tile_region(index)
            .ok_or(CacheError::SliceOutOfRange {
                index,
                tile_count: sheet.tile_count(),
            })?;

        parents.lend(parent)?;
        let handle = self.views.allocate(TileView { parent, region });
        trace!(?parent, index, ?handle, "Sliced tile");
        Ok(handle)
    }

    /// Free a view immediately and return its parent's borrow.  Releasing [Handle::INVALID] does nothing.
    ///
    /// `parents` must be the cache the view was sliced from.  If it refuses the borrow back, nothing changes.
    pub fn release<L, D, C>(
        &mut self,
        parents: &mut HolderCache<L, D, C>,
        handle: ViewHandle<S>,
    ) -> Result<(), CacheError>
    where
        L: BlobLoader,
        D: Decoder<Output = S>,
        C: Clock,
    {
        if !handle.is_valid() {
            return Ok(());
        }
        let parent = self.view(handle).ok_or(CacheError::InvalidHandle)?.parent;
        // The view stays live unless the parent accepts the return.
        parents.unlend(parent)?;
        self.views.release(handle);
        trace!(?parent, ?handle, "Released tile");
        Ok(())
    }

    pub fn view(&self, handle: ViewHandle<S>) -> Option<&TileView<S>> {
        self.views.get(handle)
    }

    fn region(&self, handle: ViewHandle<S>) -> Result<Region, CacheError> {
        self.view(handle)
            .map(|v| v.region)
            .ok_or(CacheError::InvalidHandle)
    }

    pub fn width(&self, handle: ViewHandle<S>) -> Result<u32, CacheError> {
        Ok(self.region(handle)?.width)
    }

    pub fn height(&self, handle: ViewHandle<S>) -> Result<u32, CacheError> {
        Ok(self.region(handle)?.height)
    }

    /// Pixel offset of the view within its parent.
    pub fn offset(&self, handle: ViewHandle<S>) -> Result<(u32, u32), CacheError> {
        let r = self.region(handle)?;
        Ok((r.x, r.y))
    }
}

impl<S: Tiled> Default for DerivedViewRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::test_util::*;

    type Sheets = HolderCache<Rc<MemoryLoader>, SheetDecoder<FakeImageDecoder>, Rc<ManualClock>>;

    fn build() -> (Rc<ManualClock>, Sheets, DerivedViewRegistry<Sheet<FakeImage>>) {
        let loader = Rc::new(MemoryLoader::new());
        loader.insert("tiles.png", "96x64");
        let clock = Rc::new(ManualClock::new(0));
        let cfg = CacheConfigBuilder::default()
            .ttl(Duration::from_millis(100))
            .momentary_ttl(Duration::from_millis(100))
            .build()
            .unwrap();
        let sheets = HolderCache::new(
            loader,
            SheetDecoder(FakeImageDecoder::default()),
            clock.clone(),
            cfg,
        );
        (clock, sheets, DerivedViewRegistry::new())
    }

    #[test]
    fn slices_have_tile_geometry() {
        let (_, mut sheets, mut views) = build();
        let parent = sheets.load_with("tiles.png", &TileSize::new(32, 16));
        assert_eq!(sheets.get(parent).unwrap().tile_count(), 12);

        for i in 0..12 {
            let v = views.slice(&mut sheets, parent, i).unwrap();
            assert_eq!(views.width(v), Ok(32));
            assert_eq!(views.height(v), Ok(16));
            assert_eq!(views.offset(v), Ok(((i % 3) * 32, (i / 3) * 16)));
            assert_eq!(views.view(v).unwrap().parent(), parent);
            views.release(&mut sheets, v).unwrap();
        }
        // Each view was freed on release and its slot reused.
        assert!(views.is_empty());
    }

    #[test]
    fn slicing_twice_gives_distinct_views() {
        let (_, mut sheets, mut views) = build();
        let parent = sheets.load_with("tiles.png", &TileSize::new(32, 32));
        let a = views.slice(&mut sheets, parent, 1).unwrap();
        let b = views.slice(&mut sheets, parent, 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(views.offset(a), views.offset(b));
        assert_eq!(views.len(), 2);
    }

    #[test]
    fn out_of_range_and_stale_parents() {
        let (_, mut sheets, mut views) = build();
        let parent = sheets.load_with("tiles.png", &TileSize::new(32, 32));
        assert_eq!(
            views.slice(&mut sheets, parent, 6),
            Err(CacheError::SliceOutOfRange {
                index: 6,
                tile_count: 6
            })
        );
        assert_eq!(
            views.slice(&mut sheets, Handle::INVALID, 0),
            Err(CacheError::InvalidHandle)
        );
        assert_eq!(sheets.borrowers(parent), Some(0));
    }

    #[test]
    fn releasing_views_never_touches_parent_holders() {
        let (_, mut sheets, mut views) = build();
        let parent = sheets.load_with("tiles.png", &TileSize::new(32, 32));
        let tiles = (0..6)
            .map(|i| views.slice(&mut sheets, parent, i).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(sheets.borrowers(parent), Some(6));

        for t in tiles.iter() {
            views.release(&mut sheets, *t).unwrap();
        }
        assert_eq!(sheets.holders(parent), Some(1));
        assert_eq!(sheets.borrowers(parent), Some(0));

        // Double release is caught.
        assert_eq!(
            views.release(&mut sheets, tiles[0]),
            Err(CacheError::InvalidHandle)
        );
        assert_eq!(views.width(tiles[0]), Err(CacheError::InvalidHandle));
        views.release(&mut sheets, Handle::INVALID).unwrap();
    }

    #[test]
    fn failed_release_changes_nothing() {
        let (clock, mut sheets, mut views) = build();
        let (_, mut others, _) = build();
        let parent = sheets.load_with("tiles.png", &TileSize::new(32, 32));
        let unrelated = others.load_with("tiles.png", &TileSize::new(32, 32));
        assert_eq!(parent, unrelated);
        let tile = views.slice(&mut sheets, parent, 0).unwrap();

        assert_eq!(views.release(&mut others, tile), Err(CacheError::Unheld));
        assert_eq!(views.len(), 1);
        assert_eq!(views.width(tile), Ok(32));
        assert_eq!(sheets.borrowers(parent), Some(1));
        assert_eq!(others.borrowers(unrelated), Some(0));

        // Released against the right cache, the parent can go.
        views.release(&mut sheets, tile).unwrap();
        assert_eq!(sheets.borrowers(parent), Some(0));
        sheets.release(parent).unwrap();
        clock.set(1000);
        assert_eq!(sheets.sweep(u64::MAX).freed, 1);
    }

    #[test]
    fn borrowed_parents_are_not_swept() {
        let (clock, mut sheets, mut views) = build();
        let parent = sheets.load_with("tiles.png", &TileSize::new(32, 32));
        let tile = views.slice(&mut sheets, parent, 0).unwrap();
        sheets.release(parent).unwrap();

        clock.set(1000);
        assert_eq!(sheets.sweep_expired().freed, 0);
        assert!(sheets.get(parent).is_some());

        // The last view going away restarts the clock.
        views.release(&mut sheets, tile).unwrap();
        assert_eq!(sheets.sweep_expired().freed, 0);
        clock.set(1100);
        assert_eq!(sheets.sweep_expired().freed, 1);
        assert!(sheets.get(parent).is_none());
    }
}
