//! Slot arena that owns every element of a container.
//!
//! Slots are addressed by [`SlotId`]; freed slots are recycled through a free
//! list, so ids stay stable for the lifetime of the value stored in them. Both
//! container indices link elements by `SlotId` and never own them.
//!
//! Growth goes through [`SlotArena::try_insert`], which reserves space before
//! touching any state and reports failure as [`AllocError`].

use std::mem;
use std::ops::{Index, IndexMut};

use crate::error::AllocError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Reserves room for `additional` more live values.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        let recycled = self.free_list.len().min(additional);
        self.slots.try_reserve(additional - recycled)?;
        Ok(())
    }

    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(value);
            idx
        } else {
            self.slots.push(Some(value));
            self.slots.len() - 1
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Inserts `value`, failing without side effects if no slot can be obtained.
    ///
    /// On failure the value is dropped and the arena is unchanged.
    pub fn try_insert(&mut self, value: T) -> Result<SlotId, AllocError> {
        if self.free_list.is_empty() {
            self.slots.try_reserve(1)?;
        }
        Ok(self.insert(value))
    }

    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.0)?;
        let value = slot.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.slots
            .get(id.0)
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Recovers the id of the occupied slot whose storage contains `addr`.
    ///
    /// Used to map a reference into a stored value (or one of its fields)
    /// back to its slot without a lookup. The caller must still confirm that
    /// the reference is the field it expects.
    pub fn id_containing(&self, addr: usize) -> Option<SlotId> {
        let stride = mem::size_of::<Option<T>>();
        if stride == 0 || self.slots.is_empty() {
            return None;
        }
        let base = self.slots.as_ptr() as usize;
        let offset = addr.checked_sub(base)?;
        let idx = offset / stride;
        if idx < self.slots.len() && self.slots[idx].is_some() {
            Some(SlotId(idx))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns an approximate memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        mem::size_of::<Self>()
            + self.slots.capacity() * mem::size_of::<Option<T>>()
            + self.free_list.capacity() * mem::size_of::<usize>()
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<SlotId> for SlotArena<T> {
    type Output = T;

    /// Panics if the slot is vacant.
    fn index(&self, id: SlotId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("vacant slot {}", id.0),
        }
    }
}

impl<T> IndexMut<SlotId> for SlotArena<T> {
    fn index_mut(&mut self, id: SlotId) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("vacant slot {}", id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_arena_insert_remove_reuse() {
        let mut arena = SlotArena::new();
        let id1 = arena.insert("a");
        let id2 = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id1), Some(&"a"));
        assert_eq!(arena.get(id2), Some(&"b"));

        assert_eq!(arena.remove(id1), Some("a"));
        assert_eq!(arena.len(), 1);

        let id3 = arena.insert("c");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id3), Some(&"c"));
        assert_eq!(id1.index(), id3.index());
    }

    #[test]
    fn slot_arena_try_insert_reuses_free_slots() {
        let mut arena = SlotArena::with_capacity(2);
        let a = arena.try_insert(1u32).unwrap();
        let _b = arena.try_insert(2u32).unwrap();
        arena.remove(a);
        let c = arena.try_insert(3u32).unwrap();
        assert_eq!(a, c);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn slot_arena_remove_twice_is_none() {
        let mut arena = SlotArena::new();
        let id = arena.insert(5u8);
        assert_eq!(arena.remove(id), Some(5));
        assert_eq!(arena.remove(id), None);
        assert!(!arena.contains(id));
        assert!(arena.is_empty());
    }

    #[test]
    fn slot_arena_clear_resets_len_and_free_list() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1u32);
        arena.insert(2u32);
        arena.remove(a);
        arena.clear();
        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        arena.clear();
        assert_eq!(arena.len(), 0);
        let id = arena.insert(3u32);
        assert_eq!(id.index(), 0);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn slot_arena_id_containing_recovers_slot() {
        let mut arena = SlotArena::new();
        let ids: Vec<_> = (0..8u64).map(|i| arena.insert((i, i * 10))).collect();
        for id in &ids {
            let value = arena.get(*id).unwrap();
            let field = &value.1;
            assert_eq!(arena.id_containing(field as *const u64 as usize), Some(*id));
        }
        let outside = 7u64;
        assert_eq!(arena.id_containing(&outside as *const u64 as usize), None);
    }

    #[test]
    fn slot_arena_id_containing_ignores_vacant_slots() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1u64);
        let addr = arena.get(a).unwrap() as *const u64 as usize;
        arena.remove(a);
        assert_eq!(arena.id_containing(addr), None);
    }
}
