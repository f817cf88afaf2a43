//! Typed, generation-checked slot handles.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// An opaque reference to a slot in a [crate::Pool].
///
/// Copying a handle does not count as holding the resource; holding is explicit through the cache that issued it.
/// The generation changes every time the slot is freed, so a handle which outlived its record is detected rather
/// than silently aliasing whatever reused the slot.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The "not present" handle returned for misses.
    pub const INVALID: Handle<T> = Handle {
        index: u32::MAX,
        generation: 0,
        _marker: PhantomData,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Handle<T> {
        Handle {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.index != u32::MAX
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Reinterpret the handle as pointing at a different payload type stored in the same slot.
    pub(crate) fn cast<U>(self) -> Handle<U> {
        Handle::new(self.index, self.generation)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Handle({}v{})", self.index, self.generation)
        } else {
            f.write_str("Handle(INVALID)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handle() {
        let h = Handle::<String>::INVALID;
        assert!(!h.is_valid());
        assert_eq!(h, Handle::default());
        assert_eq!(format!("{:?}", h), "Handle(INVALID)");

        let live = Handle::<String>::new(3, 7);
        assert!(live.is_valid());
        assert_ne!(live, Handle::new(3, 8));
        assert_eq!(live.cast::<u8>().index(), 3);
        assert_eq!(format!("{:?}", live), "Handle(3v7)");
    }
}
