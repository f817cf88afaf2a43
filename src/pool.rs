//! A [Pool] is contiguous, handle-indexed storage for live records.
//!
//! This is implemented as a vec of slots where the vacant slots form an intrusive singly-linked free list, so that the
//! most recently released slot is the first one reused.  Steady load/release churn therefore doesn't grow the backing
//! vec.
use crate::Handle;

struct Slot<T> {
    generation: u32,
    entry: SlotEntry<T>,
}

enum SlotEntry<T> {
    /// This slot is free, possibly with a pointer at the next free slot.
    Vacant { next_free: Option<u32> },
    Occupied(T),
}

pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Pool<T> {
    pub fn new() -> Pool<T> {
        Pool {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever created, occupied or not.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        let slot = self.slots.get(handle.index() as usize)?;
        (slot.generation == handle.generation()).then(|| slot)
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        matches!(
            self.slot(handle),
            Some(Slot {
                entry: SlotEntry::Occupied(_),
                ..
            })
        )
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        match &self.slot(handle)?.entry {
            SlotEntry::Occupied(x) => Some(x),
            SlotEntry::Vacant { .. } => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        match &mut slot.entry {
            SlotEntry::Occupied(x) => Some(x),
            SlotEntry::Vacant { .. } => None,
        }
    }

    /// Store a value, reusing a free slot if there is one.
    pub fn allocate(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            self.free_head = match slot.entry {
                SlotEntry::Vacant { next_free } => next_free,
                SlotEntry::Occupied(_) => panic!("Free list points at an occupied slot"),
            };
            slot.entry = SlotEntry::Occupied(value);
            return Handle::new(index, slot.generation);
        }

        // u32::MAX is reserved for the invalid handle.
        let index = u32::try_from(self.slots.len())
            .ok()
            .filter(|i| *i != u32::MAX)
            .unwrap_or_else(|| panic!("Pool exhausted its handle space"));
        self.slots.push(Slot {
            generation: 0,
            entry: SlotEntry::Occupied(value),
        });
        Handle::new(index, 0)
    }

    /// Free a slot, returning its value.  Returns `None` if the handle is stale or already free.
    pub fn release(&mut self, handle: Handle<T>) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }

        let index = handle.index();
        let slot = &mut self.slots[index as usize];
        let old = std::mem::replace(
            &mut slot.entry,
            SlotEntry::Vacant {
                next_free: self.free_head,
            },
        );
        slot.generation = slot.generation.wrapping_add(1);
        self.free_head = Some(index);
        self.len -= 1;
        match old {
            SlotEntry::Occupied(x) => Some(x),
            SlotEntry::Vacant { .. } => None,
        }
    }

    /// Iterator over occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match &slot.entry {
            SlotEntry::Occupied(x) => Some((Handle::new(i as u32, slot.generation), x)),
            SlotEntry::Vacant { .. } => None,
        })
    }

    /// Free every record matching the predicate in one pass, returning what was freed.
    pub fn drain_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<(Handle<T>, T)> {
        let doomed = self
            .iter()
            .filter(|(_, x)| pred(*x))
            .map(|(h, _)| h)
            .collect::<Vec<_>>();

        doomed
            .into_iter()
            .filter_map(|h| self.release(h).map(|x| (h, x)))
            .collect()
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<Handle<T>> for Pool<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(x) => x,
            None => panic!("{:?} does not refer to a live slot", handle),
        }
    }
}

impl<T> std::ops::IndexMut<Handle<T>> for Pool<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.get_mut(handle) {
            Some(x) => x,
            None => panic!("{:?} does not refer to a live slot", handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    use proptest::prelude::*;

    #[test]
    fn reuses_most_recently_released_slot() {
        let mut pool = Pool::new();
        let a = pool.allocate("a");
        let b = pool.allocate("b");
        let c = pool.allocate("c");
        assert_eq!(pool.len(), 3);

        assert_eq!(pool.release(a), Some("a"));
        assert_eq!(pool.release(c), Some("c"));

        // c went last, so it comes back first.
        let d = pool.allocate("d");
        assert_eq!(d.index(), c.index());
        assert_ne!(d, c);
        let e = pool.allocate("e");
        assert_eq!(e.index(), a.index());

        // No growth under churn.
        assert_eq!(pool.slot_count(), 3);
        assert_eq!(pool[b], "b");
        assert_eq!(pool[d], "d");
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut pool = Pool::new();
        let a = pool.allocate(1u32);
        pool.release(a);
        let b = pool.allocate(2u32);

        assert_eq!(a.index(), b.index());
        assert!(pool.get(a).is_none());
        assert!(pool.get_mut(a).is_none());
        assert!(pool.release(a).is_none());
        assert!(pool.get(Handle::INVALID).is_none());
        assert_eq!(pool.get(b), Some(&2));
    }

    #[test]
    #[should_panic]
    fn indexing_a_free_slot_panics() {
        let mut pool = Pool::new();
        let a = pool.allocate(1u32);
        pool.release(a);
        let _value = pool[a];
    }

    #[test]
    fn drain_where_frees_matching() {
        let mut pool = Pool::new();
        let handles = (0..10u32).map(|i| pool.allocate(i)).collect::<Vec<_>>();

        let mut drained = pool.drain_where(|x| x % 3 == 0);
        drained.sort_by_key(|(_, x)| *x);
        assert_eq!(
            drained.iter().map(|(_, x)| *x).collect::<Vec<_>>(),
            vec![0, 3, 6, 9]
        );
        assert_eq!(pool.len(), 6);
        assert!(!pool.contains(handles[3]));
        assert!(pool.contains(handles[4]));
    }

    #[derive(Copy, Clone, Debug)]
    enum PoolCommand {
        Allocate(u64),
        /// Release the nth live handle, modulo the number of live handles.
        Release(usize),
        /// Release a handle which was already released.
        ReleaseStale(usize),
    }

    fn pool_command_strat() -> prop::strategy::BoxedStrategy<PoolCommand> {
        proptest::prop_oneof![
            any::<u64>().prop_map(PoolCommand::Allocate),
            any::<usize>().prop_map(PoolCommand::Release),
            any::<usize>().prop_map(PoolCommand::ReleaseStale),
        ]
        .boxed()
    }

    // Run the pool against a map of live handles.  The pool may never grow past the peak live count.
    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 500,
            ..Default::default()
        })]
        #[test]
        fn test_against_hash_map(commands in prop::collection::vec(pool_command_strat(), 0..2000)) {
            let mut pool = Pool::<u64>::new();
            let mut live: HashMap<Handle<u64>, u64> = HashMap::new();
            let mut order: Vec<Handle<u64>> = vec![];
            let mut dead: Vec<Handle<u64>> = vec![];
            let mut peak = 0;

            for c in commands {
                match c {
                    PoolCommand::Allocate(v) => {
                        let h = pool.allocate(v);
                        prop_assert!(live.insert(h, v).is_none());
                        order.push(h);
                    }
                    PoolCommand::Release(n) => {
                        if order.is_empty() {
                            continue;
                        }
                        let h = order.swap_remove(n % order.len());
                        prop_assert_eq!(pool.release(h), live.remove(&h));
                        dead.push(h);
                    }
                    PoolCommand::ReleaseStale(n) => {
                        if dead.is_empty() {
                            continue;
                        }
                        let h = dead[n % dead.len()];
                        prop_assert_eq!(pool.release(h), None);
                    }
                }

                peak = peak.max(live.len());
                prop_assert_eq!(pool.len(), live.len());
                prop_assert!(pool.slot_count() <= peak);
            }

            for (h, v) in live.iter() {
                prop_assert_eq!(pool.get(*h), Some(v));
            }
        }
    }
}
