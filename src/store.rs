//! Element store: sole owner of element storage and lifetime.
//!
//! Every element is one arena [`Node`] holding the user-visible [`Element`]
//! plus its link positions in both indices. The store only allocates and
//! frees; linking and unlinking is the container's job, and an element is
//! always unlinked from both indices before [`ElementStore::destroy`] runs.

use std::fmt;

use crate::ds::chrono_list::{ChronoLinks, ChronoNode};
use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::AllocError;
use crate::index::IndexNode;

/// A stored `(key, value, when)` record.
///
/// Set-shaped containers use `V = ()`. The key is never mutated in place;
/// `when` changes only through `touch`.
#[derive(Clone, PartialEq, Eq)]
pub struct Element<K, V, I> {
    key: K,
    value: V,
    when: I,
}

impl<K, V, I> Element<K, V, I> {
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (K, V, I) {
        (self.key, self.value, self.when)
    }
}

impl<K, V, I: Copy> Element<K, V, I> {
    /// Time of insertion or last touch.
    #[inline]
    pub fn when(&self) -> I {
        self.when
    }
}

impl<K: fmt::Debug, V: fmt::Debug, I: fmt::Debug> fmt::Debug for Element<K, V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("when", &self.when)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node<K, V, I, L> {
    pub(crate) element: Element<K, V, I>,
    chrono: ChronoLinks,
    primary: L,
}

impl<K, V, I, L> ChronoNode for Node<K, V, I, L> {
    #[inline]
    fn chrono(&self) -> &ChronoLinks {
        &self.chrono
    }

    #[inline]
    fn chrono_mut(&mut self) -> &mut ChronoLinks {
        &mut self.chrono
    }
}

impl<K, V, I, L> IndexNode<K, L> for Node<K, V, I, L> {
    #[inline]
    fn key(&self) -> &K {
        &self.element.key
    }

    #[inline]
    fn link(&self) -> &L {
        &self.primary
    }

    #[inline]
    fn link_mut(&mut self) -> &mut L {
        &mut self.primary
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ElementStore<K, V, I, L> {
    arena: SlotArena<Node<K, V, I, L>>,
}

impl<K, V, I, L> ElementStore<K, V, I, L> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
        }
    }

    /// Allocates one unlinked element stamped `when`.
    ///
    /// On failure nothing is allocated and the arguments are dropped.
    pub(crate) fn create(&mut self, key: K, value: V, when: I, primary: L) -> Result<SlotId, AllocError> {
        self.arena.try_insert(Node {
            element: Element { key, value, when },
            chrono: ChronoLinks::default(),
            primary,
        })
    }

    /// Releases an element that is no longer linked into either index.
    pub(crate) fn destroy(&mut self, id: SlotId) -> Option<Element<K, V, I>> {
        let node = self.arena.remove(id)?;
        debug_assert_eq!(
            node.chrono,
            ChronoLinks::default(),
            "destroying an element still linked chronologically"
        );
        Some(node.element)
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        self.arena.try_reserve(additional)
    }

    #[inline]
    pub(crate) fn arena(&self) -> &SlotArena<Node<K, V, I, L>> {
        &self.arena
    }

    #[inline]
    pub(crate) fn arena_mut(&mut self) -> &mut SlotArena<Node<K, V, I, L>> {
        &mut self.arena
    }

    #[inline]
    pub(crate) fn element(&self, id: SlotId) -> Option<&Element<K, V, I>> {
        self.arena.get(id).map(|node| &node.element)
    }

    #[inline]
    pub(crate) fn element_mut(&mut self, id: SlotId) -> Option<&mut Element<K, V, I>> {
        self.arena.get_mut(id).map(|node| &mut node.element)
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, id: SlotId) -> Option<&mut V> {
        self.element_mut(id).map(|element| &mut element.value)
    }

    /// Value of a live element. Panics if `id` is vacant.
    #[inline]
    pub(crate) fn value_mut_at(&mut self, id: SlotId) -> &mut V {
        &mut self.arena[id].element.value
    }

    #[inline]
    pub(crate) fn stamp(&mut self, id: SlotId, when: I) {
        if let Some(element) = self.element_mut(id) {
            element.when = when;
        }
    }

    /// Recovers the element whose key lives at `key`.
    pub(crate) fn id_of_key(&self, key: &K) -> Option<SlotId> {
        let id = self.arena.id_containing(key as *const K as usize)?;
        let element = self.element(id)?;
        std::ptr::eq(&element.key, key).then_some(id)
    }

    /// Recovers the element whose value lives at `value`.
    pub(crate) fn id_of_value(&self, value: &V) -> Option<SlotId> {
        let id = self.arena.id_containing(value as *const V as usize)?;
        let element = self.element(id)?;
        std::ptr::eq(&element.value, value).then_some(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    /// Frees every element. Both indices must be cleared alongside.
    pub(crate) fn clear(&mut self) {
        self.arena.clear();
    }

    pub(crate) fn approx_bytes(&self) -> usize {
        self.arena.approx_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_create_and_destroy() {
        let mut store: ElementStore<u32, &str, u64, ()> = ElementStore::with_capacity(4);
        let id = store.create(1, "one", 7, ()).unwrap();
        assert_eq!(store.len(), 1);
        let element = store.element(id).unwrap();
        assert_eq!((element.key(), element.value(), element.when()), (&1, &"one", 7));

        let element = store.destroy(id).unwrap();
        assert_eq!(element.into_parts(), (1, "one", 7));
        assert_eq!(store.len(), 0);
        assert!(store.destroy(id).is_none());
    }

    #[test]
    fn store_stamp_updates_when() {
        let mut store: ElementStore<u32, (), u64, ()> = ElementStore::with_capacity(1);
        let id = store.create(1, (), 3, ()).unwrap();
        store.stamp(id, 9);
        assert_eq!(store.element(id).unwrap().when(), 9);
    }

    #[test]
    fn store_recovers_ids_from_references() {
        let mut store: ElementStore<u32, String, u64, ()> = ElementStore::with_capacity(8);
        let ids: Vec<_> = (0..8)
            .map(|k| store.create(k, format!("v{}", k), 0, ()).unwrap())
            .collect();
        for id in ids {
            let element = store.element(id).unwrap();
            assert_eq!(store.id_of_key(element.key()), Some(id));
            assert_eq!(store.id_of_value(element.value()), Some(id));
        }
        let stranger = String::from("v1");
        assert_eq!(store.id_of_value(&stranger), None);
    }

    #[test]
    fn store_key_reference_is_not_a_value_reference() {
        let mut store: ElementStore<u64, u64, u64, ()> = ElementStore::with_capacity(1);
        let id = store.create(5, 6, 0, ()).unwrap();
        let key = store.element(id).unwrap().key();
        assert_eq!(store.id_of_value(key), None);
    }
}
