//! Primary index strategies and the key functors they are built from.
//!
//! A container's primary index is one of two interchangeable strategies:
//!
//! | Strategy                                    | Functors             | Cost per op      |
//! |---------------------------------------------|----------------------|------------------|
//! | [`OrderedIndex<Cmp>`](crate::OrderedIndex)  | [`Compare`]          | O(log n) expected|
//! | [`HashedIndex<S, E>`](crate::HashedIndex)   | `BuildHasher`+[`KeyEq`] | O(1) amortized |
//!
//! Both link arena nodes by [`SlotId`] and never own them. Both guarantee that
//! elements with equal keys form one contiguous run in traversal order, with
//! later duplicates placed after earlier ones.
//!
//! The [`PrimaryIndex`] trait is sealed: it is the seam between the container
//! engine and the two strategies, not an extension point.

use std::cmp::Ordering;
use std::fmt;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::AllocError;

// ---------------------------------------------------------------------------
// Key functors
// ---------------------------------------------------------------------------

/// Total order over keys used by [`OrderedIndex`](crate::OrderedIndex).
pub trait Compare<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<K: Ord + ?Sized> Compare<K> for Natural {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Adapts a closure `Fn(&K, &K) -> Ordering` into a [`Compare`].
///
/// ```
/// use agedkit::clock::ManualClock;
/// use agedkit::index::CompareFn;
/// use agedkit::AgedSet;
///
/// let clock = ManualClock::new(0);
/// let descending = CompareFn(|a: &u32, b: &u32| b.cmp(a));
/// let mut set = AgedSet::with_comparator(&clock, descending);
/// set.insert_key(1).unwrap();
/// set.insert_key(3).unwrap();
/// set.insert_key(2).unwrap();
/// let keys: Vec<_> = set.keys().copied().collect();
/// assert_eq!(keys, vec![3, 2, 1]);
/// ```
#[derive(Clone, Copy, Default)]
pub struct CompareFn<F>(pub F);

impl<K: ?Sized, F: Fn(&K, &K) -> Ordering> Compare<K> for CompareFn<F> {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for CompareFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompareFn(..)")
    }
}

/// Key equivalence used by [`HashedIndex`](crate::HashedIndex).
///
/// Must agree with the hasher: equal keys hash equally.
pub trait KeyEq<K: ?Sized> {
    fn eq(&self, a: &K, b: &K) -> bool;
}

/// Compares keys with their [`Eq`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultEq;

impl<K: Eq + ?Sized> KeyEq<K> for DefaultEq {
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Adapts a closure `Fn(&K, &K) -> bool` into a [`KeyEq`].
#[derive(Clone, Copy, Default)]
pub struct EqFn<F>(pub F);

impl<K: ?Sized, F: Fn(&K, &K) -> bool> KeyEq<K> for EqFn<F> {
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for EqFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EqFn(..)")
    }
}

// ---------------------------------------------------------------------------
// Node access
// ---------------------------------------------------------------------------

/// Access to the key and primary-index link stored in an arena node.
pub trait IndexNode<K, L> {
    fn key(&self) -> &K;
    fn link(&self) -> &L;
    fn link_mut(&mut self) -> &mut L;
}

/// Result of locating a key before insertion.
#[derive(Debug, Clone, Copy)]
pub struct Probe<H> {
    /// An element with an equal key, if any. For unique containers this is
    /// the only one.
    pub found: Option<SlotId>,
    /// Where a new element with this key goes: after the end of the equal-key
    /// run, or where the run would start.
    pub hint: H,
}

mod private {
    pub trait Sealed {}
}

pub(crate) use private::Sealed;

/// Strategy seam between the container engine and a primary index.
///
/// Every method that reads keys or links takes the arena that owns the nodes.
/// Between [`probe`](Self::probe) and [`link`](Self::link) the caller may
/// insert the new node into the arena but must not restructure the index.
pub trait PrimaryIndex<K>: Sealed {
    /// Per-node link storage.
    type Link: fmt::Debug + Clone;
    /// Insertion position computed by `probe`.
    type Hint: Copy;

    /// Creates link storage for a node about to be inserted.
    fn new_link(&mut self) -> Result<Self::Link, AllocError>;

    /// Makes room for `additional` more elements on top of `len`.
    ///
    /// Returns `true` if the index restructured itself (a rehash).
    fn reserve_for<N: IndexNode<K, Self::Link>>(
        &mut self,
        arena: &mut SlotArena<N>,
        len: usize,
        additional: usize,
    ) -> Result<bool, AllocError>;

    fn probe<N: IndexNode<K, Self::Link>>(&self, arena: &SlotArena<N>, key: &K) -> Probe<Self::Hint>;

    /// Links node `id` at the position described by `hint`.
    fn link<N: IndexNode<K, Self::Link>>(&mut self, arena: &mut SlotArena<N>, id: SlotId, hint: Self::Hint);

    /// Unlinks node `id`. The node stays in the arena.
    fn unlink<N: IndexNode<K, Self::Link>>(&mut self, arena: &mut SlotArena<N>, id: SlotId);

    /// First element of the equal-key run for `key`.
    fn find<N: IndexNode<K, Self::Link>>(&self, arena: &SlotArena<N>, key: &K) -> Option<SlotId>;

    /// First element in traversal order.
    fn first(&self) -> Option<SlotId>;

    /// Successor of `id` in traversal order.
    fn next<N: IndexNode<K, Self::Link>>(&self, arena: &SlotArena<N>, id: SlotId) -> Option<SlotId>;

    fn keys_equal(&self, a: &K, b: &K) -> bool;

    fn len(&self) -> usize;

    /// Forgets every link. Nodes must be released by the caller.
    fn clear(&mut self);

    /// Strategy-specific consistency checks, run by `check_invariants`.
    fn audit<N: IndexNode<K, Self::Link>>(&self, arena: &SlotArena<N>) -> Result<(), String>;
}
