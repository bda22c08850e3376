//! The dual-indexed container engine.
//!
//! One generic type, [`AgedContainer`], backs all eight container shapes. It
//! is parameterized by:
//!
//! - `X`: the primary index strategy, [`OrderedIndex`] or [`HashedIndex`]
//! - `M`: the multiplicity, [`Unique`] or [`Multi`]
//! - `C`: the [`Clock`] that stamps elements
//!
//! Set shapes use `V = ()`. The type aliases at the bottom of this module
//! name the common combinations.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │ AgedContainer<K, V, X, M, C>                                     │
//!   │                                                                  │
//!   │   clock ──now()──┐                                               │
//!   │                  ▼                                               │
//!   │   store: ElementStore  (SlotArena<Node>)                         │
//!   │     Node { element: (key, value, when), chrono, primary }        │
//!   │            ▲                               ▲        ▲            │
//!   │            │ SlotId                        │        │            │
//!   │   index: X ┘ (key order or buckets) ───────┘        │            │
//!   │   chrono: ChronoList (oldest ─► newest) ────────────┘            │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation creates or locates the element in the store and then
//! updates both indices before returning. An element is never linked into
//! one index but not the other at any point a caller can observe.
//!
//! ## Element ids
//!
//! Cursor-style operations (`find`, `next`, `lower_bound`, `erase_at`, ...)
//! speak [`SlotId`]. An id stays valid until its element is erased; the same
//! id addresses the element in both the primary and the chronological order.
//! Ids of erased elements may be reused by later inserts.
//!
//! ## Example: evicting stale entries
//!
//! ```
//! use agedkit::clock::ManualClock;
//! use agedkit::AgedHashMap;
//!
//! let clock = ManualClock::new(0);
//! let mut sessions: AgedHashMap<&str, u32, _> = AgedHashMap::new(&clock);
//! sessions.insert("alice", 1).unwrap();
//! clock.set(5);
//! sessions.insert("bob", 2).unwrap();
//! clock.set(10);
//! sessions.touch(&"alice");
//!
//! // Drop everything not used since t=8.
//! clock.set(12);
//! while sessions.chronological().front().map_or(false, |e| e.when() < 8) {
//!     sessions.pop_oldest();
//! }
//! assert!(sessions.contains_key(&"alice"));
//! assert!(!sessions.contains_key(&"bob"));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use crate::clock::Clock;
use crate::ds::bucket_index::HashedIndex;
use crate::ds::chrono_list::ChronoList;
use crate::ds::skip_index::OrderedIndex;
use crate::ds::slot_arena::SlotId;
use crate::error::{AllocError, InvariantError};
use crate::index::{DefaultEq, Natural, PrimaryIndex};
#[cfg(feature = "metrics")]
use crate::metrics::{ContainerMetrics, ContainerMetricsSnapshot};
use crate::store::{Element, ElementStore};

use rustc_hash::FxBuildHasher;

mod chronological;
mod hashed;
mod iter;
mod multi;
mod ordered;
mod unique;

pub use chronological::{ChronoIter, Chronological};
pub use iter::{BucketIter, EqualRange, Iter, Keys, Range, Values};

mod private {
    pub trait Sealed {}
}

/// Whether a container admits equal keys.
pub trait Multiplicity: private::Sealed {
    const MULTI: bool;
}

/// At most one element per key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unique;

/// Any number of elements per key, kept as one contiguous run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Multi;

impl private::Sealed for Unique {}
impl private::Sealed for Multi {}

impl Multiplicity for Unique {
    const MULTI: bool = false;
}

impl Multiplicity for Multi {
    const MULTI: bool = true;
}

/// An element as seen through a container with clock `C`.
pub type ElementOf<K, V, C> = Element<K, V, <C as Clock>::Instant>;

/// Associative container with a second, chronological index.
///
/// See the [module documentation](self) for the model.
#[derive(Clone)]
pub struct AgedContainer<K, V, X, M, C>
where
    X: PrimaryIndex<K>,
    C: Clock,
{
    clock: C,
    store: ElementStore<K, V, C::Instant, X::Link>,
    chrono: ChronoList,
    index: X,
    #[cfg(feature = "metrics")]
    metrics: ContainerMetrics,
    _multiplicity: PhantomData<M>,
}

impl<K, V, X, M, C> AgedContainer<K, V, X, M, C>
where
    X: PrimaryIndex<K>,
    M: Multiplicity,
    C: Clock,
{
    pub(crate) fn from_parts(clock: C, index: X, capacity: usize) -> Self {
        Self {
            clock,
            store: ElementStore::with_capacity(capacity),
            chrono: ChronoList::new(),
            index,
            #[cfg(feature = "metrics")]
            metrics: ContainerMetrics::default(),
            _multiplicity: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Approximate heap and inline footprint of the element store in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.store.approx_bytes()
    }

    // -- lookup ------------------------------------------------------------

    /// First element of the equal-key run for `key`.
    pub fn find(&self, key: &K) -> Option<SlotId> {
        self.index.find(self.store.arena(), key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Value of the first element with `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let id = self.find(key)?;
        self.store.element(id).map(Element::value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find(key)?;
        self.store.value_mut(id)
    }

    /// Element stored under `id`, if it is still live.
    pub fn element(&self, id: SlotId) -> Option<&ElementOf<K, V, C>> {
        self.store.element(id)
    }

    /// Mutable access to the value stored under `id`. Keys and timestamps
    /// are not reachable mutably.
    pub fn value_mut(&mut self, id: SlotId) -> Option<&mut V> {
        self.store.value_mut(id)
    }

    pub fn count(&self, key: &K) -> usize {
        self.equal_range(key).count()
    }

    /// Every element whose key equals `key`, in primary order.
    pub fn equal_range(&self, key: &K) -> EqualRange<'_, K, V, X, C::Instant> {
        EqualRange::new(self.store.arena(), &self.index, self.find(key))
    }

    /// First element in primary order.
    pub fn first(&self) -> Option<SlotId> {
        self.index.first()
    }

    /// Successor of `id` in primary order.
    pub fn next(&self, id: SlotId) -> Option<SlotId> {
        self.index.next(self.store.arena(), id)
    }

    /// Recovers the id of the element that owns `key`, a reference previously
    /// obtained from this container.
    pub fn handle_of_key(&self, key: &K) -> Option<SlotId> {
        self.store.id_of_key(key)
    }

    /// Recovers the id of the element that owns `value`, a reference
    /// previously obtained from this container.
    pub fn handle_of_value(&self, value: &V) -> Option<SlotId> {
        self.store.id_of_value(value)
    }

    // -- iteration ---------------------------------------------------------

    /// Elements in primary order.
    pub fn iter(&self) -> Iter<'_, K, V, X, C::Instant> {
        Iter::new(self.store.arena(), &self.index, self.index.first(), self.len())
    }

    pub fn keys(&self) -> Keys<'_, K, V, X, C::Instant> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V, X, C::Instant> {
        Values::new(self.iter())
    }

    /// Read view of the chronological index, oldest first.
    pub fn chronological(&self) -> Chronological<'_, K, V, C::Instant, X::Link> {
        Chronological::new(self.store.arena(), &self.chrono)
    }

    // -- recency -----------------------------------------------------------

    /// Stamps every element with `key` with one reading of the clock and moves
    /// them, in primary order, to the newest end. Returns how many.
    pub fn touch(&mut self, key: &K) -> usize {
        let Some(first) = self.find(key) else {
            return 0;
        };
        let now = self.clock.now();
        let mut current = Some(first);
        let mut touched = 0;
        while let Some(id) = current {
            current = self.run_successor(id, key);
            self.store.stamp(id, now);
            self.chrono.move_to_back(self.store.arena_mut(), id);
            touched += 1;
        }
        #[cfg(feature = "metrics")]
        {
            self.metrics.touch_calls += 1;
            self.metrics.touched_elements += touched as u64;
        }
        touched
    }

    /// Stamps one element and moves it to the newest end.
    ///
    /// Returns `false` if `id` is not live.
    pub fn touch_at(&mut self, id: SlotId) -> bool {
        if self.store.element(id).is_none() {
            return false;
        }
        let now = self.clock.now();
        self.store.stamp(id, now);
        let moved = self.chrono.move_to_back(self.store.arena_mut(), id);
        #[cfg(feature = "metrics")]
        {
            self.metrics.touch_calls += 1;
            self.metrics.touched_elements += 1;
        }
        moved
    }

    // -- removal -----------------------------------------------------------

    /// Removes the whole equal-key run for `key`. Returns how many.
    pub fn erase(&mut self, key: &K) -> usize {
        let mut removed = 0;
        let mut current = self.find(key);
        while let Some(id) = current {
            current = self.run_successor(id, key);
            if self.remove_linked(id).is_some() {
                removed += 1;
            }
        }
        #[cfg(feature = "metrics")]
        {
            self.metrics.erase_calls += 1;
            self.metrics.erased_elements += removed as u64;
        }
        removed
    }

    /// Removes one element, returning it.
    pub fn erase_at(&mut self, id: SlotId) -> Option<ElementOf<K, V, C>> {
        let element = self.remove_linked(id);
        #[cfg(feature = "metrics")]
        {
            self.metrics.erase_calls += 1;
            self.metrics.erased_elements += element.is_some() as u64;
        }
        element
    }

    /// Removes `[first, last)` in primary order; `last = None` runs to the
    /// end. `last` must not precede `first`. Returns how many were removed.
    pub fn erase_range(&mut self, first: SlotId, last: Option<SlotId>) -> usize {
        let mut removed = 0;
        let mut current = self.store.element(first).map(|_| first);
        while let Some(id) = current {
            if Some(id) == last {
                break;
            }
            current = self.index.next(self.store.arena(), id);
            if self.remove_linked(id).is_some() {
                removed += 1;
            }
        }
        #[cfg(feature = "metrics")]
        {
            self.metrics.erase_calls += 1;
            self.metrics.erased_elements += removed as u64;
        }
        removed
    }

    /// Removes `[first, last)` in chronological order; `last = None` runs to
    /// the newest end. Returns how many were removed.
    pub fn erase_chronological_range(&mut self, first: SlotId, last: Option<SlotId>) -> usize {
        let mut removed = 0;
        let mut current = self.store.element(first).map(|_| first);
        while let Some(id) = current {
            if Some(id) == last {
                break;
            }
            current = self.chrono.next(self.store.arena(), id);
            if self.remove_linked(id).is_some() {
                removed += 1;
            }
        }
        #[cfg(feature = "metrics")]
        {
            self.metrics.erase_calls += 1;
            self.metrics.erased_elements += removed as u64;
        }
        removed
    }

    /// Removes and returns the oldest element.
    pub fn pop_oldest(&mut self) -> Option<ElementOf<K, V, C>> {
        let oldest = self.chrono.front().and_then(|id| self.remove_linked(id));
        #[cfg(feature = "metrics")]
        {
            self.metrics.pop_oldest_calls += 1;
            self.metrics.pop_oldest_found += oldest.is_some() as u64;
        }
        oldest
    }

    /// Drops every element. Bucket storage of hashed containers is kept.
    pub fn clear(&mut self) {
        let len = self.len();
        self.chrono.clear();
        self.index.clear();
        self.store.clear();
        #[cfg(feature = "metrics")]
        {
            self.metrics.clear_calls += 1;
        }
        tracing::debug!(len, "cleared container");
    }

    /// Exchanges contents and configuration with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    // -- bulk insert -------------------------------------------------------

    /// Inserts every `(key, value)` pair.
    ///
    /// Multi containers, and unique containers that start out empty, grow
    /// once for the iterator's lower size bound first. A non-empty unique
    /// container grows per inserted element instead, so a batch of keys that
    /// are mostly present already does not inflate the bucket array.
    ///
    /// Stops at the first allocation failure; pairs inserted before it stay.
    /// Unique containers skip keys that are already present.
    pub fn try_extend<I>(&mut self, items: I) -> Result<(), AllocError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let items = items.into_iter();
        let (lower, _) = items.size_hint();
        if lower > 0 && (M::MULTI || self.is_empty()) {
            self.store.try_reserve(lower)?;
            let len = self.len();
            let _rehashed = self.index.reserve_for(self.store.arena_mut(), len, lower)?;
            #[cfg(feature = "metrics")]
            {
                self.metrics.rehashes += _rehashed as u64;
            }
        }
        for (key, value) in items {
            self.place(key, move || value)?;
        }
        Ok(())
    }

    // -- diagnostics -------------------------------------------------------

    /// Audits both indices against each other and the store.
    ///
    /// Chronological sortedness by `when` is checked too, so a clock that
    /// went backwards is reported here.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let arena = self.store.arena();
        let len = self.store.len();
        if self.chrono.len() != len || self.index.len() != len {
            return Err(InvariantError::new(format!(
                "population mismatch: store {}, chronological {}, primary {}",
                len,
                self.chrono.len(),
                self.index.len()
            )));
        }

        let mut chrono_order = self.chrono.audit(arena).map_err(InvariantError::new)?;
        self.index.audit(arena).map_err(InvariantError::new)?;

        let mut newest = None;
        for &id in &chrono_order {
            let when = self
                .store
                .element(id)
                .ok_or_else(|| InvariantError::new(format!("vacant slot {} in chronological order", id.index())))?
                .when();
            if newest.map_or(false, |prev| when < prev) {
                return Err(InvariantError::new(format!(
                    "chronological order not sorted by time at slot {}",
                    id.index()
                )));
            }
            newest = Some(when);
        }

        let mut primary_order = Vec::with_capacity(len);
        let mut previous_key: Option<&K> = None;
        let mut current = self.index.first();
        while let Some(id) = current {
            let element = self
                .store
                .element(id)
                .ok_or_else(|| InvariantError::new(format!("vacant slot {} in primary order", id.index())))?;
            if !M::MULTI && previous_key.map_or(false, |prev| self.index.keys_equal(prev, element.key())) {
                return Err(InvariantError::new(format!(
                    "duplicate key in unique container at slot {}",
                    id.index()
                )));
            }
            previous_key = Some(element.key());
            primary_order.push(id);
            if primary_order.len() > len {
                return Err(InvariantError::new("primary traversal longer than population"));
            }
            current = self.index.next(arena, id);
        }
        if primary_order.len() != len {
            return Err(InvariantError::new(format!(
                "primary traversal reached {} of {} elements",
                primary_order.len(),
                len
            )));
        }

        primary_order.sort_unstable();
        chrono_order.sort_unstable();
        if primary_order != chrono_order {
            return Err(InvariantError::new("indices disagree on membership"));
        }
        Ok(())
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> ContainerMetricsSnapshot {
        self.metrics.snapshot(self.len())
    }

    // -- internals ---------------------------------------------------------

    /// Creates and links an element for `key` unless the container is unique
    /// and already holds it. Returns the element and whether it is new.
    ///
    /// `make` runs only when an element is created.
    pub(crate) fn place<F>(&mut self, key: K, make: F) -> Result<(SlotId, bool), AllocError>
    where
        F: FnOnce() -> V,
    {
        let placed = self.try_place(key, make);
        #[cfg(feature = "metrics")]
        {
            self.metrics.insert_calls += 1;
            match placed {
                Ok((_, true)) => self.metrics.insert_new += 1,
                Ok((_, false)) => self.metrics.insert_existing += 1,
                Err(_) => self.metrics.insert_failed += 1,
            }
        }
        placed
    }

    fn try_place<F>(&mut self, key: K, make: F) -> Result<(SlotId, bool), AllocError>
    where
        F: FnOnce() -> V,
    {
        let mut probe = self.index.probe(self.store.arena(), &key);
        if !M::MULTI {
            if let Some(existing) = probe.found {
                return Ok((existing, false));
            }
        }

        let len = self.len();
        if self.index.reserve_for(self.store.arena_mut(), len, 1)? {
            #[cfg(feature = "metrics")]
            {
                self.metrics.rehashes += 1;
            }
            probe = self.index.probe(self.store.arena(), &key);
        }

        // Everything fallible happens before the first link is written.
        let link = self.index.new_link()?;
        let when = self.clock.now();
        let id = self.store.create(key, make(), when, link)?;

        let arena = self.store.arena_mut();
        self.chrono.push_back(arena, id);
        self.index.link(arena, id, probe.hint);
        Ok((id, true))
    }

    /// Next element of the same equal-key run as `id`.
    fn run_successor(&self, id: SlotId, key: &K) -> Option<SlotId> {
        self.index.next(self.store.arena(), id).filter(|&next| {
            self.store
                .element(next)
                .map_or(false, |element| self.index.keys_equal(element.key(), key))
        })
    }

    /// Unlinks from the chronological index, then the primary index, then
    /// frees.
    fn remove_linked(&mut self, id: SlotId) -> Option<ElementOf<K, V, C>> {
        let arena = self.store.arena_mut();
        if !self.chrono.unlink(arena, id) {
            return None;
        }
        self.index.unlink(arena, id);
        self.store.destroy(id)
    }
}

impl<K, V, X, M, C> fmt::Debug for AgedContainer<K, V, X, M, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    X: PrimaryIndex<K>,
    M: Multiplicity,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, K, V, X, M, C> IntoIterator for &'a AgedContainer<K, V, X, M, C>
where
    X: PrimaryIndex<K>,
    M: Multiplicity,
    C: Clock,
{
    type Item = &'a ElementOf<K, V, C>;
    type IntoIter = Iter<'a, K, V, X, C::Instant>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Ordered set of unique keys.
pub type AgedSet<K, C, Cmp = Natural> = AgedContainer<K, (), OrderedIndex<Cmp>, Unique, C>;
/// Ordered set admitting equal keys.
pub type AgedMultiSet<K, C, Cmp = Natural> = AgedContainer<K, (), OrderedIndex<Cmp>, Multi, C>;
/// Ordered map with unique keys.
pub type AgedMap<K, V, C, Cmp = Natural> = AgedContainer<K, V, OrderedIndex<Cmp>, Unique, C>;
/// Ordered map admitting equal keys.
pub type AgedMultiMap<K, V, C, Cmp = Natural> = AgedContainer<K, V, OrderedIndex<Cmp>, Multi, C>;

/// Hashed set of unique keys.
pub type AgedHashSet<K, C, S = FxBuildHasher, E = DefaultEq> =
    AgedContainer<K, (), HashedIndex<S, E>, Unique, C>;
/// Hashed set admitting equal keys.
pub type AgedHashMultiSet<K, C, S = FxBuildHasher, E = DefaultEq> =
    AgedContainer<K, (), HashedIndex<S, E>, Multi, C>;
/// Hashed map with unique keys.
pub type AgedHashMap<K, V, C, S = FxBuildHasher, E = DefaultEq> =
    AgedContainer<K, V, HashedIndex<S, E>, Unique, C>;
/// Hashed map admitting equal keys.
pub type AgedHashMultiMap<K, V, C, S = FxBuildHasher, E = DefaultEq> =
    AgedContainer<K, V, HashedIndex<S, E>, Multi, C>;


#[cfg(all(test, feature = "metrics"))]
mod metrics_tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn insert_counters_split_new_and_existing() {
        let clock = ManualClock::new(0);
        let mut map: AgedMap<u32, &str, _> = AgedMap::new(&clock);
        map.insert(1, "x").unwrap();
        map.insert(1, "y").unwrap();
        map.insert(2, "z").unwrap();

        let snap = map.metrics_snapshot();
        assert_eq!(snap.insert_calls, 3);
        assert_eq!(snap.insert_new, 2);
        assert_eq!(snap.insert_existing, 1);
        assert_eq!(snap.insert_failed, 0);
        assert_eq!(snap.len, 2);
    }

    #[test]
    fn rehash_counter_tracks_growth() {
        let clock = ManualClock::new(0);
        let mut set: AgedHashSet<u32, _> = AgedHashSet::with_bucket_count(&clock, 4);
        for key in 0..4 {
            set.insert_key(key).unwrap();
        }
        assert_eq!(set.metrics_snapshot().rehashes, 0);
        set.insert_key(4).unwrap();
        assert_eq!(set.metrics_snapshot().rehashes, 1);
        set.rehash(256).unwrap();
        assert_eq!(set.metrics_snapshot().rehashes, 2);
    }

    #[test]
    fn removal_touch_and_clear_counters() {
        let clock = ManualClock::new(0);
        let mut multi: AgedHashMultiMap<u32, u32, _> = AgedHashMultiMap::new(&clock);
        assert!(multi.pop_oldest().is_none());
        let snap = multi.metrics_snapshot();
        assert_eq!(snap.pop_oldest_calls, 1);
        assert_eq!(snap.pop_oldest_found, 0);

        for value in 0..3 {
            multi.insert(5, value).unwrap();
        }
        multi.insert(6, 0).unwrap();
        assert_eq!(multi.touch(&5), 3);
        assert_eq!(multi.erase(&5), 3);
        assert!(multi.pop_oldest().is_some());
        multi.clear();
        multi.clear();

        let snap = multi.metrics_snapshot();
        assert_eq!(snap.touch_calls, 1);
        assert_eq!(snap.touched_elements, 3);
        assert_eq!(snap.erase_calls, 1);
        assert_eq!(snap.erased_elements, 3);
        assert_eq!(snap.pop_oldest_calls, 2);
        assert_eq!(snap.pop_oldest_found, 1);
        assert_eq!(snap.clear_calls, 2);
        assert_eq!(snap.len, 0);
    }
}
