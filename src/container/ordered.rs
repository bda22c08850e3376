//! Construction and range queries for containers with an ordered primary
//! index.

use std::cmp::Ordering;
use std::ops::{Bound, RangeBounds};

use crate::clock::Clock;
use crate::ds::skip_index::OrderedIndex;
use crate::ds::slot_arena::SlotId;
use crate::index::Compare;

use super::{AgedContainer, Multiplicity, Range};

impl<K, V, Cmp, M, C> AgedContainer<K, V, OrderedIndex<Cmp>, M, C>
where
    Cmp: Compare<K> + Default,
    M: Multiplicity,
    C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self::with_comparator(clock, Cmp::default())
    }

    pub fn with_capacity(clock: C, capacity: usize) -> Self {
        Self::from_parts(clock, OrderedIndex::new(Cmp::default()), capacity)
    }
}

impl<K, V, Cmp, M, C> AgedContainer<K, V, OrderedIndex<Cmp>, M, C>
where
    Cmp: Compare<K>,
    M: Multiplicity,
    C: Clock,
{
    pub fn with_comparator(clock: C, cmp: Cmp) -> Self {
        Self::from_parts(clock, OrderedIndex::new(cmp), 0)
    }

    pub fn comparator(&self) -> &Cmp {
        self.index.comparator()
    }

    /// First element whose key is not less than `key`.
    pub fn lower_bound(&self, key: &K) -> Option<SlotId> {
        self.index.lower_bound(self.store.arena(), key)
    }

    /// First element whose key is greater than `key`.
    pub fn upper_bound(&self, key: &K) -> Option<SlotId> {
        self.index.upper_bound(self.store.arena(), key)
    }

    /// Last element in key order.
    pub fn last(&self) -> Option<SlotId> {
        self.index.last()
    }

    /// Predecessor of `id` in key order.
    pub fn prev(&self, id: SlotId) -> Option<SlotId> {
        self.index.prev::<K, _>(self.store.arena(), id)
    }

    /// Elements whose keys fall within `range`, in key order.
    ///
    /// A range whose start lies after its end is empty.
    pub fn range<R>(&self, range: R) -> Range<'_, K, V, Cmp, C::Instant>
    where
        R: RangeBounds<K>,
    {
        let arena = self.store.arena();
        let mut front = match range.start_bound() {
            Bound::Included(key) => self.lower_bound(key),
            Bound::Excluded(key) => self.upper_bound(key),
            Bound::Unbounded => self.first(),
        };
        let end = match range.end_bound() {
            Bound::Included(key) => self.upper_bound(key),
            Bound::Excluded(key) => self.lower_bound(key),
            Bound::Unbounded => None,
        };
        // Both positions start a run of equal keys, so comparing their keys
        // orders them.
        if let (Some(f), Some(e)) = (front, end) {
            let after = match (arena.get(f), arena.get(e)) {
                (Some(a), Some(b)) => self.comparator().compare(a.element.key(), b.element.key()) == Ordering::Greater,
                _ => true,
            };
            if after {
                front = end;
            }
        }
        Range::new(arena, &self.index, front, end)
    }
}

impl<K, V, Cmp, M, C> PartialEq for AgedContainer<K, V, OrderedIndex<Cmp>, M, C>
where
    K: PartialEq,
    V: PartialEq,
    Cmp: Compare<K>,
    M: Multiplicity,
    C: Clock,
{
    /// Element-wise in key order. Timestamps are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.key() == b.key() && a.value() == b.value())
    }
}

impl<K, V, Cmp, M, C> Eq for AgedContainer<K, V, OrderedIndex<Cmp>, M, C>
where
    K: Eq,
    V: Eq,
    Cmp: Compare<K>,
    M: Multiplicity,
    C: Clock,
{
}

#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;
    use crate::index::CompareFn;
    use crate::{AgedMap, AgedMultiSet, AgedSet};

    fn keys_of<'a>(iter: impl Iterator<Item = &'a crate::store::Element<u32, (), u64>>) -> Vec<u32> {
        iter.map(|e| *e.key()).collect()
    }

    #[test]
    fn bounds_and_cursors() {
        let clock = ManualClock::new(0);
        let mut set: AgedMultiSet<u32, _> = AgedMultiSet::new(&clock);
        for key in [10, 20, 20, 30] {
            set.insert_key(key).unwrap();
        }
        let lb = set.lower_bound(&20).unwrap();
        let ub = set.upper_bound(&20).unwrap();
        assert_eq!(set.element(lb).map(|e| *e.key()), Some(20));
        assert_eq!(set.element(ub).map(|e| *e.key()), Some(30));
        assert_eq!(set.upper_bound(&30), None);
        assert_eq!(set.lower_bound(&31), None);

        let last = set.last().unwrap();
        assert_eq!(last, ub);
        let before = set.prev(last).unwrap();
        assert_eq!(set.element(before).map(|e| *e.key()), Some(20));
        assert_eq!(set.prev(set.first().unwrap()), None);
        assert_eq!(set.next(last), None);
    }

    #[test]
    fn range_respects_bounds() {
        let clock = ManualClock::new(0);
        let mut set: AgedSet<u32, _> = AgedSet::new(&clock);
        for key in 1..=9 {
            set.insert_key(key).unwrap();
        }
        assert_eq!(keys_of(set.range(3..6)), vec![3, 4, 5]);
        assert_eq!(keys_of(set.range(3..=6)), vec![3, 4, 5, 6]);
        assert_eq!(keys_of(set.range(..3)), vec![1, 2]);
        assert_eq!(keys_of(set.range(8..)), vec![8, 9]);
        assert_eq!(keys_of(set.range(..)).len(), 9);
        assert!(keys_of(set.range(6..3)).is_empty());
        assert!(keys_of(set.range(5..5)).is_empty());
        assert!(keys_of(set.range(20..30)).is_empty());
    }

    #[test]
    fn range_with_excluded_start() {
        use std::ops::Bound::{Excluded, Included};
        let clock = ManualClock::new(0);
        let mut set: AgedMultiSet<u32, _> = AgedMultiSet::new(&clock);
        for key in [1, 2, 2, 3] {
            set.insert_key(key).unwrap();
        }
        assert_eq!(keys_of(set.range((Excluded(1), Included(3)))), vec![2, 2, 3]);
        assert!(keys_of(set.range((Excluded(2), Excluded(2)))).is_empty());
    }

    #[test]
    fn iteration_runs_both_ways() {
        let clock = ManualClock::new(0);
        let mut map: AgedMap<u32, char, _> = AgedMap::new(&clock);
        for (key, value) in [(2, 'b'), (1, 'a'), (3, 'c')] {
            map.insert(key, value).unwrap();
        }
        let backwards: Vec<_> = map.values().rev().copied().collect();
        assert_eq!(backwards, vec!['c', 'b', 'a']);

        let mut iter = map.keys();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&3));
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.next_back(), Some(&2));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn equality_ignores_timestamps() {
        let clock = ManualClock::new(0);
        let mut a: AgedMap<u32, u32, _> = AgedMap::new(&clock);
        let mut b: AgedMap<u32, u32, _> = AgedMap::new(&clock);
        a.insert(1, 1).unwrap();
        a.insert(2, 2).unwrap();
        clock.set(50);
        b.insert(2, 2).unwrap();
        b.insert(1, 1).unwrap();
        assert_eq!(a, b);
        b.insert(3, 3).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn clone_copies_timestamps() {
        let clock = ManualClock::new(4);
        let mut a: AgedMap<u32, String, _> = AgedMap::new(&clock);
        a.insert(1, "one".into()).unwrap();
        clock.set(6);
        a.insert(2, "two".into()).unwrap();
        clock.set(100);
        let b = a.clone();
        let whens: Vec<_> = b.chronological().iter().map(|e| e.when()).collect();
        assert_eq!(whens, vec![4, 6]);
        assert_eq!(a, b);
        b.check_invariants().unwrap();
    }

    #[test]
    fn custom_comparator_orders_keys() {
        let clock = ManualClock::new(0);
        let mut set: AgedSet<u32, _, _> = AgedSet::with_comparator(&clock, CompareFn(|a: &u32, b: &u32| b.cmp(a)));
        for key in [1, 3, 2] {
            set.insert_key(key).unwrap();
        }
        assert_eq!(set.keys().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(keys_of(set.range(3..=2)), vec![3, 2]);
        set.check_invariants().unwrap();
    }
}
