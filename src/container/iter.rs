//! Iterators over the primary index.
//!
//! All of them yield `&Element` borrowed from the arena, so an element seen
//! here is the same object the chronological view yields.

use std::iter::FusedIterator;

use crate::ds::bucket_index::{BucketLink, HashedIndex};
use crate::ds::skip_index::{OrderedIndex, SkipLink};
use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::index::{Compare, PrimaryIndex};
use crate::store::{Element, Node};

type Arena<K, V, I, L> = SlotArena<Node<K, V, I, L>>;

// ---------------------------------------------------------------------------
// Iter
// ---------------------------------------------------------------------------

/// Elements in primary order. Double-ended for ordered containers.
pub struct Iter<'a, K, V, X: PrimaryIndex<K>, I> {
    arena: &'a Arena<K, V, I, X::Link>,
    index: &'a X,
    front: Option<SlotId>,
    /// Resolved to the last element on the first `next_back`.
    back: Option<SlotId>,
    remaining: usize,
}

impl<'a, K, V, X: PrimaryIndex<K>, I> Iter<'a, K, V, X, I> {
    pub(crate) fn new(
        arena: &'a Arena<K, V, I, X::Link>,
        index: &'a X,
        front: Option<SlotId>,
        len: usize,
    ) -> Self {
        Self {
            arena,
            index,
            front,
            back: None,
            remaining: len,
        }
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> Clone for Iter<'a, K, V, X, I> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            index: self.index,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> Iterator for Iter<'a, K, V, X, I> {
    type Item = &'a Element<K, V, I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        let node = self.arena.get(id)?;
        self.front = self.index.next(self.arena, id);
        self.remaining -= 1;
        Some(&node.element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, I, Cmp: Compare<K>> DoubleEndedIterator for Iter<'a, K, V, OrderedIndex<Cmp>, I> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back.or_else(|| self.index.last())?;
        let node = self.arena.get(id)?;
        self.back = self.index.prev::<K, _>(self.arena, id);
        self.remaining -= 1;
        Some(&node.element)
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> ExactSizeIterator for Iter<'a, K, V, X, I> {}

impl<'a, K, V, X: PrimaryIndex<K>, I> FusedIterator for Iter<'a, K, V, X, I> {}

// ---------------------------------------------------------------------------
// Keys / Values
// ---------------------------------------------------------------------------

/// Keys in primary order.
pub struct Keys<'a, K, V, X: PrimaryIndex<K>, I> {
    inner: Iter<'a, K, V, X, I>,
}

impl<'a, K, V, X: PrimaryIndex<K>, I> Keys<'a, K, V, X, I> {
    pub(crate) fn new(inner: Iter<'a, K, V, X, I>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> Iterator for Keys<'a, K, V, X, I> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(Element::key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V, I, Cmp: Compare<K>> DoubleEndedIterator for Keys<'a, K, V, OrderedIndex<Cmp>, I> {
    fn next_back(&mut self) -> Option<&'a K> {
        self.inner.next_back().map(Element::key)
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> ExactSizeIterator for Keys<'a, K, V, X, I> {}

/// Values in primary order.
pub struct Values<'a, K, V, X: PrimaryIndex<K>, I> {
    inner: Iter<'a, K, V, X, I>,
}

impl<'a, K, V, X: PrimaryIndex<K>, I> Values<'a, K, V, X, I> {
    pub(crate) fn new(inner: Iter<'a, K, V, X, I>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> Iterator for Values<'a, K, V, X, I> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(Element::value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V, I, Cmp: Compare<K>> DoubleEndedIterator for Values<'a, K, V, OrderedIndex<Cmp>, I> {
    fn next_back(&mut self) -> Option<&'a V> {
        self.inner.next_back().map(Element::value)
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> ExactSizeIterator for Values<'a, K, V, X, I> {}

// ---------------------------------------------------------------------------
// EqualRange
// ---------------------------------------------------------------------------

/// The contiguous run of elements sharing one key.
pub struct EqualRange<'a, K, V, X: PrimaryIndex<K>, I> {
    arena: &'a Arena<K, V, I, X::Link>,
    index: &'a X,
    next: Option<SlotId>,
    anchor: Option<&'a K>,
}

impl<'a, K, V, X: PrimaryIndex<K>, I> EqualRange<'a, K, V, X, I> {
    pub(crate) fn new(arena: &'a Arena<K, V, I, X::Link>, index: &'a X, first: Option<SlotId>) -> Self {
        let anchor = first
            .and_then(|id| arena.get(id))
            .map(|node| node.element.key());
        Self {
            arena,
            index,
            next: first,
            anchor,
        }
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> Iterator for EqualRange<'a, K, V, X, I> {
    type Item = &'a Element<K, V, I>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let anchor = self.anchor?;
        let node = self.arena.get(id)?;
        let arena = self.arena;
        let index = self.index;
        self.next = index.next(arena, id).filter(|&next| {
            arena
                .get(next)
                .map_or(false, |other| index.keys_equal(anchor, other.element.key()))
        });
        Some(&node.element)
    }
}

impl<'a, K, V, X: PrimaryIndex<K>, I> FusedIterator for EqualRange<'a, K, V, X, I> {}

// ---------------------------------------------------------------------------
// Range (ordered)
// ---------------------------------------------------------------------------

/// Elements of an ordered container whose keys fall in a key range.
pub struct Range<'a, K, V, Cmp, I> {
    arena: &'a Arena<K, V, I, SkipLink>,
    index: &'a OrderedIndex<Cmp>,
    front: Option<SlotId>,
    end: Option<SlotId>,
}

impl<'a, K, V, Cmp, I> Range<'a, K, V, Cmp, I> {
    pub(crate) fn new(
        arena: &'a Arena<K, V, I, SkipLink>,
        index: &'a OrderedIndex<Cmp>,
        front: Option<SlotId>,
        end: Option<SlotId>,
    ) -> Self {
        Self {
            arena,
            index,
            front,
            end,
        }
    }
}

impl<'a, K, V, Cmp: Compare<K>, I> Iterator for Range<'a, K, V, Cmp, I> {
    type Item = &'a Element<K, V, I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.end {
            return None;
        }
        let id = self.front?;
        let node = self.arena.get(id)?;
        self.front = PrimaryIndex::<K>::next(self.index, self.arena, id);
        Some(&node.element)
    }
}

impl<'a, K, V, Cmp: Compare<K>, I> FusedIterator for Range<'a, K, V, Cmp, I> {}

// ---------------------------------------------------------------------------
// BucketIter (hashed)
// ---------------------------------------------------------------------------

/// Elements chained in one bucket of a hashed container.
pub struct BucketIter<'a, K, V, S, E, I> {
    arena: &'a Arena<K, V, I, BucketLink>,
    index: &'a HashedIndex<S, E>,
    next: Option<SlotId>,
}

impl<'a, K, V, S, E, I> BucketIter<'a, K, V, S, E, I> {
    pub(crate) fn new(arena: &'a Arena<K, V, I, BucketLink>, index: &'a HashedIndex<S, E>, bucket: usize) -> Self {
        Self {
            arena,
            index,
            next: index.bucket_head(bucket),
        }
    }
}

impl<'a, K, V, S, E, I> Iterator for BucketIter<'a, K, V, S, E, I> {
    type Item = &'a Element<K, V, I>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.arena.get(id)?;
        self.next = self.index.chain_next::<K, _>(self.arena, id);
        Some(&node.element)
    }
}

impl<'a, K, V, S, E, I> FusedIterator for BucketIter<'a, K, V, S, E, I> {}
