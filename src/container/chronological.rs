//! Read view over the chronological index.
//!
//! This is the surface an eviction layer consumes: peek at the oldest
//! element, decide, erase, repeat. Ids returned here are the same ids the
//! primary-order operations accept.

use std::iter::FusedIterator;

use crate::ds::chrono_list::ChronoList;
use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::store::{Element, Node};

/// Elements ordered oldest to newest by last insert or touch.
pub struct Chronological<'a, K, V, I, L> {
    arena: &'a SlotArena<Node<K, V, I, L>>,
    list: &'a ChronoList,
}

impl<'a, K, V, I, L> Chronological<'a, K, V, I, L> {
    pub(crate) fn new(arena: &'a SlotArena<Node<K, V, I, L>>, list: &'a ChronoList) -> Self {
        Self { arena, list }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Oldest element.
    pub fn front(&self) -> Option<&'a Element<K, V, I>> {
        self.element(self.list.front()?)
    }

    /// Newest element.
    pub fn back(&self) -> Option<&'a Element<K, V, I>> {
        self.element(self.list.back()?)
    }

    pub fn front_id(&self) -> Option<SlotId> {
        self.list.front()
    }

    pub fn back_id(&self) -> Option<SlotId> {
        self.list.back()
    }

    /// Next newer element after `id`.
    pub fn next(&self, id: SlotId) -> Option<SlotId> {
        self.list.next(self.arena, id)
    }

    /// Next older element before `id`.
    pub fn prev(&self, id: SlotId) -> Option<SlotId> {
        self.list.prev(self.arena, id)
    }

    pub fn element(&self, id: SlotId) -> Option<&'a Element<K, V, I>> {
        self.arena.get(id).map(|node| &node.element)
    }

    /// Oldest to newest; `.rev()` walks newest to oldest.
    pub fn iter(&self) -> ChronoIter<'a, K, V, I, L> {
        ChronoIter {
            arena: self.arena,
            list: self.list,
            front: self.list.front(),
            back: self.list.back(),
            remaining: self.list.len(),
        }
    }
}

impl<'a, K, V, I, L> Clone for Chronological<'a, K, V, I, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, I, L> Copy for Chronological<'a, K, V, I, L> {}

impl<'a, K, V, I, L> IntoIterator for Chronological<'a, K, V, I, L> {
    type Item = &'a Element<K, V, I>;
    type IntoIter = ChronoIter<'a, K, V, I, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`Chronological`].
pub struct ChronoIter<'a, K, V, I, L> {
    arena: &'a SlotArena<Node<K, V, I, L>>,
    list: &'a ChronoList,
    front: Option<SlotId>,
    back: Option<SlotId>,
    remaining: usize,
}

impl<'a, K, V, I, L> Iterator for ChronoIter<'a, K, V, I, L> {
    type Item = &'a Element<K, V, I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        let node = self.arena.get(id)?;
        self.front = self.list.next(self.arena, id);
        self.remaining -= 1;
        Some(&node.element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, I, L> DoubleEndedIterator for ChronoIter<'a, K, V, I, L> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        let node = self.arena.get(id)?;
        self.back = self.list.prev(self.arena, id);
        self.remaining -= 1;
        Some(&node.element)
    }
}

impl<'a, K, V, I, L> ExactSizeIterator for ChronoIter<'a, K, V, I, L> {}

impl<'a, K, V, I, L> FusedIterator for ChronoIter<'a, K, V, I, L> {}
