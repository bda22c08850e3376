//! Hashed primary index and its bucket/capacity manager.
//!
//! Buckets are heads of singly linked chains threaded through arena nodes via
//! [`BucketLink`]. Each link caches the full 64-bit hash, so rehashing never
//! calls the hasher and chain walks compare hashes before keys.
//!
//! ## Architecture
//!
//! ```text
//!   buckets: Vec<Option<SlotId>>          first_bucket ─┐
//!   ┌───┬───┬───┬───┬───┬───┬───┬───┐                   │
//!   │ - │ - │ ● │ - │ ● │ - │ - │ - │   ◄───────────────┘ (index 2)
//!   └───┴───┴─┼─┴───┴─┼─┴───┴───┴───┘
//!             ▼       ▼
//!           [a1]    [k]──►[b]
//!             │
//!             ▼
//!           [a2]  (duplicates sit right after their run)
//! ```
//!
//! ## Growth policy
//! - Grow-only: the bucket count never shrinks as a side effect of insert or
//!   erase. An explicit [`rehash`](HashedIndex::rehash) may shrink it down to
//!   what the load-factor bound still allows.
//! - Before inserting `k` elements, if `len + k > bucket_count * max_load_factor`
//!   the array grows to the next power of two that restores the bound.
//! - If the new count fits in the array's reserved capacity the chains are
//!   relinked in place; otherwise a fresh array is reserved first, chains are
//!   moved across and the old array is released.
//! - Relinking preserves the relative order of every chain, so equal-key runs
//!   stay contiguous across any number of rehashes.

use std::hash::{BuildHasher, Hash};
use std::mem;

use rustc_hash::FxBuildHasher;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::{AllocError, ConfigError};
use crate::index::{DefaultEq, IndexNode, KeyEq, PrimaryIndex, Probe, Sealed};

/// Bucket count used when none is requested.
pub const DEFAULT_BUCKET_COUNT: usize = 8;

/// Max load factor used when none is configured.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

/// Per-node links of the hashed index.
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketLink {
    hash: u64,
    next: Option<SlotId>,
}

/// Insertion position computed by `probe`.
#[derive(Debug, Clone, Copy)]
pub struct BucketHint {
    hash: u64,
    bucket: usize,
    after: Option<SlotId>,
}

/// Rounds a requested bucket count up to the growth sequence (powers of two).
pub fn good_bucket_count(requested: usize) -> usize {
    requested
        .max(1)
        .checked_next_power_of_two()
        .unwrap_or(max_bucket_count())
}

/// Largest bucket count the manager will ever allocate.
pub const fn max_bucket_count() -> usize {
    let limit = isize::MAX as usize / mem::size_of::<Option<SlotId>>();
    // Largest power of two not above `limit`.
    1usize << (usize::BITS - 1 - limit.leading_zeros())
}

#[inline]
fn bucket_for(hash: u64, count: usize) -> usize {
    debug_assert!(count.is_power_of_two(), "bucket count must be a power of two");
    let folded = hash ^ (hash >> 32);
    (folded as usize) & (count - 1)
}

/// Hash/equality-driven index with an owned bucket array.
#[derive(Debug, Clone)]
pub struct HashedIndex<S = FxBuildHasher, E = DefaultEq> {
    hasher: S,
    key_eq: E,
    buckets: Vec<Option<SlotId>>,
    /// Cached first non-empty bucket; equals `buckets.len()` when empty.
    first_bucket: usize,
    max_load_factor: f32,
    len: usize,
}

impl<S, E> HashedIndex<S, E> {
    pub fn new(hasher: S, key_eq: E) -> Self {
        Self::with_bucket_count(hasher, key_eq, DEFAULT_BUCKET_COUNT)
    }

    pub fn with_bucket_count(hasher: S, key_eq: E, bucket_count: usize) -> Self {
        let count = good_bucket_count(bucket_count);
        Self {
            hasher,
            key_eq,
            buckets: vec![None; count],
            first_bucket: count,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            len: 0,
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.key_eq
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_bucket_count(&self) -> usize {
        max_bucket_count()
    }

    pub fn load_factor(&self) -> f32 {
        if self.buckets.is_empty() {
            return 0.0;
        }
        self.len as f32 / self.buckets.len() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Validates and stores a new max load factor without restructuring.
    pub(crate) fn set_max_load_factor(&mut self, factor: f32) -> Result<(), ConfigError> {
        validate_max_load_factor(factor)?;
        self.max_load_factor = factor;
        Ok(())
    }

    /// Head of bucket `n`'s chain.
    pub fn bucket_head(&self, n: usize) -> Option<SlotId> {
        self.buckets.get(n).copied().flatten()
    }

    /// Successor of `id` within its own bucket chain.
    pub fn chain_next<K, N>(&self, arena: &SlotArena<N>, id: SlotId) -> Option<SlotId>
    where
        N: IndexNode<K, BucketLink>,
    {
        arena.get(id).and_then(|node| node.link().next)
    }

    pub fn bucket_size<K, N>(&self, arena: &SlotArena<N>, n: usize) -> usize
    where
        N: IndexNode<K, BucketLink>,
    {
        let mut count = 0;
        let mut current = self.bucket_head(n);
        while let Some(id) = current {
            count += 1;
            current = self.chain_next(arena, id);
        }
        count
    }

    /// Bucket count needed to hold `len` elements within the load bound.
    fn required_buckets(&self, len: usize) -> usize {
        let needed = (len as f64 / self.max_load_factor as f64).ceil();
        if needed >= max_bucket_count() as f64 {
            max_bucket_count()
        } else {
            needed as usize
        }
    }

    fn would_exceed(&self, len: usize, additional: usize) -> bool {
        let target = len.saturating_add(additional) as f64;
        target > self.buckets.len() as f64 * self.max_load_factor as f64
    }

    /// Grows so that `len + additional` elements respect the load bound.
    pub(crate) fn maybe_rehash<K, N>(
        &mut self,
        arena: &mut SlotArena<N>,
        len: usize,
        additional: usize,
    ) -> Result<bool, AllocError>
    where
        N: IndexNode<K, BucketLink>,
    {
        if !self.would_exceed(len, additional) {
            return Ok(false);
        }
        let target = good_bucket_count(self.required_buckets(len.saturating_add(additional)));
        tracing::trace!(
            len,
            additional,
            bucket_count = self.buckets.len(),
            target,
            "load bound would be exceeded"
        );
        self.relink_into(arena, target)?;
        debug_assert!(self.load_factor() <= self.max_load_factor);
        Ok(true)
    }

    /// Sets the bucket count to at least `count`, and never below what the
    /// current population needs. Returns `true` if the array changed.
    pub(crate) fn rehash<K, N>(&mut self, arena: &mut SlotArena<N>, count: usize) -> Result<bool, AllocError>
    where
        N: IndexNode<K, BucketLink>,
    {
        let target = good_bucket_count(count.max(self.required_buckets(self.len)));
        if target == self.buckets.len() {
            return Ok(false);
        }
        self.relink_into(arena, target)?;
        Ok(true)
    }

    /// Moves every chain into an array of `count` buckets.
    fn relink_into<K, N>(&mut self, arena: &mut SlotArena<N>, count: usize) -> Result<(), AllocError>
    where
        N: IndexNode<K, BucketLink>,
    {
        let old_count = self.buckets.len();
        let in_place = count <= self.buckets.capacity();

        // Reserve before unlinking anything so failure leaves the index intact.
        let mut fresh = Vec::new();
        if !in_place {
            fresh.try_reserve_exact(count)?;
        }

        // Pop every chain, in bucket order, onto a stack threaded through the
        // same `next` links. The stack ends up holding the global order
        // reversed.
        let mut stack: Option<SlotId> = None;
        for bucket in self.buckets.iter_mut() {
            let mut current = bucket.take();
            while let Some(id) = current {
                let Some(node) = arena.get_mut(id) else {
                    break;
                };
                let link = node.link_mut();
                current = link.next;
                link.next = stack;
                stack = Some(id);
            }
        }

        if in_place {
            self.buckets.resize(count, None);
        } else {
            fresh.resize(count, None);
            self.buckets = fresh;
        }

        // Pushing the reversed order onto bucket fronts restores each chain's
        // previous relative order.
        let mut first = count;
        while let Some(id) = stack {
            let Some(node) = arena.get_mut(id) else {
                break;
            };
            let link = node.link_mut();
            stack = link.next;
            let bucket = bucket_for(link.hash, count);
            link.next = self.buckets[bucket];
            self.buckets[bucket] = Some(id);
            first = first.min(bucket);
        }
        self.first_bucket = if self.len == 0 { count } else { first };

        tracing::debug!(
            from = old_count,
            to = count,
            in_place,
            len = self.len,
            "rehashed buckets"
        );
        Ok(())
    }

    fn advance_first_bucket(&mut self) {
        while self.first_bucket < self.buckets.len() && self.buckets[self.first_bucket].is_none() {
            self.first_bucket += 1;
        }
    }

    fn next_nonempty_from(&self, start: usize) -> Option<SlotId> {
        self.buckets.get(start..)?.iter().find_map(|head| *head)
    }
}

impl<S, E> HashedIndex<S, E>
where
    S: BuildHasher,
{
    pub(crate) fn hash_key<K: Hash + ?Sized>(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    /// Bucket that `key` maps to under the current bucket count.
    pub fn bucket<K: Hash + ?Sized>(&self, key: &K) -> usize {
        debug_assert!(!self.buckets.is_empty(), "bucket lookup with zero buckets");
        bucket_for(self.hash_key(key), self.buckets.len())
    }
}

pub(crate) fn validate_max_load_factor(factor: f32) -> Result<(), ConfigError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ConfigError::new(format!(
            "max load factor must be positive and finite, got {}",
            factor
        )));
    }
    Ok(())
}

impl<S: Default, E: Default> Default for HashedIndex<S, E> {
    fn default() -> Self {
        Self::new(S::default(), E::default())
    }
}

impl<S, E> Sealed for HashedIndex<S, E> {}

impl<K, S, E> PrimaryIndex<K> for HashedIndex<S, E>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEq<K>,
{
    type Link = BucketLink;
    type Hint = BucketHint;

    fn new_link(&mut self) -> Result<BucketLink, AllocError> {
        Ok(BucketLink::default())
    }

    fn reserve_for<N: IndexNode<K, BucketLink>>(
        &mut self,
        arena: &mut SlotArena<N>,
        len: usize,
        additional: usize,
    ) -> Result<bool, AllocError> {
        self.maybe_rehash(arena, len, additional)
    }

    fn probe<N: IndexNode<K, BucketLink>>(&self, arena: &SlotArena<N>, key: &K) -> Probe<BucketHint> {
        let hash = self.hash_key(key);
        let bucket = bucket_for(hash, self.buckets.len());
        let mut found = None;
        let mut last_equal = None;
        let mut current = self.buckets[bucket];
        while let Some(id) = current {
            let Some(node) = arena.get(id) else {
                break;
            };
            let link = node.link();
            if link.hash == hash && self.key_eq.eq(node.key(), key) {
                found.get_or_insert(id);
                last_equal = Some(id);
            } else if last_equal.is_some() {
                // Runs are contiguous; nothing equal follows.
                break;
            }
            current = link.next;
        }
        Probe {
            found,
            hint: BucketHint {
                hash,
                bucket,
                after: last_equal,
            },
        }
    }

    fn link<N: IndexNode<K, BucketLink>>(&mut self, arena: &mut SlotArena<N>, id: SlotId, hint: BucketHint) {
        let next = match hint.after {
            Some(after) => match arena.get_mut(after) {
                Some(prev) => mem::replace(&mut prev.link_mut().next, Some(id)),
                None => return,
            },
            None => mem::replace(&mut self.buckets[hint.bucket], Some(id)),
        };
        if let Some(node) = arena.get_mut(id) {
            *node.link_mut() = BucketLink {
                hash: hint.hash,
                next,
            };
        }
        self.first_bucket = self.first_bucket.min(hint.bucket);
        self.len += 1;
    }

    fn unlink<N: IndexNode<K, BucketLink>>(&mut self, arena: &mut SlotArena<N>, id: SlotId) {
        let Some(BucketLink { hash, next }) = arena.get(id).map(|node| *node.link()) else {
            return;
        };
        let bucket = bucket_for(hash, self.buckets.len());

        let mut prev = None;
        let mut current = self.buckets[bucket];
        while let Some(cur) = current {
            if cur == id {
                break;
            }
            prev = Some(cur);
            current = self.chain_next(arena, cur);
        }
        if current != Some(id) {
            debug_assert!(false, "unlink of a node not in its bucket chain");
            return;
        }

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = arena.get_mut(prev_id) {
                    prev_node.link_mut().next = next;
                }
            },
            None => self.buckets[bucket] = next,
        }
        if let Some(node) = arena.get_mut(id) {
            node.link_mut().next = None;
        }

        self.len -= 1;
        if bucket == self.first_bucket && self.buckets[bucket].is_none() {
            self.advance_first_bucket();
        }
    }

    fn find<N: IndexNode<K, BucketLink>>(&self, arena: &SlotArena<N>, key: &K) -> Option<SlotId> {
        let hash = self.hash_key(key);
        let mut current = self.buckets[bucket_for(hash, self.buckets.len())];
        while let Some(id) = current {
            let node = arena.get(id)?;
            if node.link().hash == hash && self.key_eq.eq(node.key(), key) {
                return Some(id);
            }
            current = node.link().next;
        }
        None
    }

    fn first(&self) -> Option<SlotId> {
        self.buckets.get(self.first_bucket).copied().flatten()
    }

    fn next<N: IndexNode<K, BucketLink>>(&self, arena: &SlotArena<N>, id: SlotId) -> Option<SlotId> {
        let link = arena.get(id)?.link();
        link.next
            .or_else(|| self.next_nonempty_from(bucket_for(link.hash, self.buckets.len()) + 1))
    }

    fn keys_equal(&self, a: &K, b: &K) -> bool {
        self.key_eq.eq(a, b)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|head| *head = None);
        self.first_bucket = self.buckets.len();
        self.len = 0;
    }

    fn audit<N: IndexNode<K, BucketLink>>(&self, arena: &SlotArena<N>) -> Result<(), String> {
        let count = self.buckets.len();
        if count == 0 || !count.is_power_of_two() {
            return Err(format!("invalid bucket count {}", count));
        }
        let expected_first = self
            .buckets
            .iter()
            .position(Option::is_some)
            .unwrap_or(count);
        if self.first_bucket != expected_first {
            return Err(format!(
                "cached first bucket {} but first non-empty is {}",
                self.first_bucket, expected_first
            ));
        }

        let mut total = 0usize;
        for (bucket, head) in self.buckets.iter().enumerate() {
            let mut chain: Vec<SlotId> = Vec::new();
            let mut current = *head;
            while let Some(id) = current {
                let node = arena
                    .get(id)
                    .ok_or_else(|| format!("bucket link to vacant slot {}", id.index()))?;
                let link = node.link();
                if bucket_for(link.hash, count) != bucket {
                    return Err(format!("slot {} chained in the wrong bucket", id.index()));
                }
                if link.hash != self.hash_key(node.key()) {
                    return Err(format!("stale cached hash at slot {}", id.index()));
                }
                // An earlier equal key must sit immediately before this one.
                let last_equal = chain.iter().rposition(|other| {
                    arena
                        .get(*other)
                        .map(|n| self.key_eq.eq(n.key(), node.key()))
                        .unwrap_or(false)
                });
                if let Some(pos) = last_equal {
                    if pos + 1 != chain.len() {
                        return Err(format!("equal-key run split at slot {}", id.index()));
                    }
                }
                chain.push(id);
                total += 1;
                if total > self.len {
                    return Err("bucket chains longer than recorded length".into());
                }
                current = link.next;
            }
        }
        if total != self.len {
            return Err(format!(
                "hashed index length {} but {} nodes reachable",
                self.len, total
            ));
        }
        if self.would_exceed(self.len, 0) {
            return Err(format!(
                "load factor {} above max {}",
                self.load_factor(),
                self.max_load_factor
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestNode {
        key: u32,
        tag: u32,
        link: BucketLink,
    }

    impl IndexNode<u32, BucketLink> for TestNode {
        fn key(&self) -> &u32 {
            &self.key
        }

        fn link(&self) -> &BucketLink {
            &self.link
        }

        fn link_mut(&mut self) -> &mut BucketLink {
            &mut self.link
        }
    }

    type Index = HashedIndex<FxBuildHasher, DefaultEq>;

    fn insert(index: &mut Index, arena: &mut SlotArena<TestNode>, key: u32, tag: u32) -> SlotId {
        let len = PrimaryIndex::<u32>::len(index);
        index.maybe_rehash(arena, len, 1).unwrap();
        let probe = index.probe(arena, &key);
        let id = arena.insert(TestNode {
            key,
            tag,
            link: BucketLink::default(),
        });
        index.link(arena, id, probe.hint);
        id
    }

    fn walk(index: &Index, arena: &SlotArena<TestNode>) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        let mut current = PrimaryIndex::<u32>::first(index);
        while let Some(id) = current {
            let node = arena.get(id).unwrap();
            out.push((node.key, node.tag));
            current = index.next(arena, id);
        }
        out
    }

    #[test]
    fn good_bucket_count_rounds_up() {
        assert_eq!(good_bucket_count(0), 1);
        assert_eq!(good_bucket_count(4), 4);
        assert_eq!(good_bucket_count(5), 8);
        assert_eq!(good_bucket_count(1000), 1024);
        assert!(max_bucket_count().is_power_of_two());
    }

    #[test]
    fn hashed_index_grows_when_bound_exceeded() {
        let mut arena = SlotArena::new();
        let mut index = Index::with_bucket_count(FxBuildHasher, DefaultEq, 4);
        for key in 0..4 {
            insert(&mut index, &mut arena, key, 0);
        }
        assert_eq!(index.bucket_count(), 4);
        insert(&mut index, &mut arena, 4, 0);
        assert_eq!(index.bucket_count(), 8);
        for key in 0..5 {
            assert!(index.find(&arena, &key).is_some());
        }
        PrimaryIndex::<u32>::audit(&index, &arena).unwrap();
    }

    #[test]
    fn hashed_index_duplicates_stay_contiguous_across_rehash() {
        let mut arena = SlotArena::new();
        let mut index = Index::with_bucket_count(FxBuildHasher, DefaultEq, 1);
        for round in 0..6 {
            for key in 0..10 {
                insert(&mut index, &mut arena, key, round);
            }
        }
        PrimaryIndex::<u32>::audit(&index, &arena).unwrap();

        let order = walk(&index, &arena);
        for key in 0..10 {
            let positions: Vec<_> = order
                .iter()
                .enumerate()
                .filter(|(_, (k, _))| *k == key)
                .map(|(pos, (_, tag))| (pos, *tag))
                .collect();
            assert_eq!(positions.len(), 6);
            assert_eq!(positions[5].0 - positions[0].0, 5, "run for {} split", key);
            let tags: Vec<_> = positions.iter().map(|(_, t)| *t).collect();
            assert_eq!(tags, (0..6).collect::<Vec<_>>());
        }
    }

    #[test]
    fn hashed_index_unlink_updates_first_bucket() {
        let mut arena = SlotArena::new();
        let mut index = Index::with_bucket_count(FxBuildHasher, DefaultEq, 64);
        let ids: Vec<_> = (0..20).map(|k| insert(&mut index, &mut arena, k, 0)).collect();
        for id in ids {
            index.unlink(&mut arena, id);
            arena.remove(id);
            PrimaryIndex::<u32>::audit(&index, &arena).unwrap();
        }
        assert_eq!(PrimaryIndex::<u32>::first(&index), None);
        assert_eq!(index.bucket_count(), 64);
    }

    #[test]
    fn hashed_index_explicit_rehash_respects_population() {
        let mut arena = SlotArena::new();
        let mut index = Index::with_bucket_count(FxBuildHasher, DefaultEq, 16);
        for key in 0..12 {
            insert(&mut index, &mut arena, key, 0);
        }
        index.rehash(&mut arena, 1).unwrap();
        assert_eq!(index.bucket_count(), 16);

        index.rehash(&mut arena, 100).unwrap();
        assert_eq!(index.bucket_count(), 128);
        for key in 0..12 {
            assert!(index.find(&arena, &key).is_some());
        }

        // Shrinking is allowed on request, down to the load bound.
        index.rehash(&mut arena, 0).unwrap();
        assert_eq!(index.bucket_count(), 16);
        PrimaryIndex::<u32>::audit(&index, &arena).unwrap();
    }

    #[test]
    fn hashed_index_bucket_sizes_sum_to_len() {
        let mut arena = SlotArena::new();
        let mut index = Index::new(FxBuildHasher, DefaultEq);
        for key in 0..37 {
            insert(&mut index, &mut arena, key, 0);
        }
        let total: usize = (0..index.bucket_count())
            .map(|n| index.bucket_size(&arena, n))
            .sum();
        assert_eq!(total, 37);
        assert_eq!(index.bucket(&5u32), bucket_for(index.hash_key(&5u32), index.bucket_count()));
    }

    #[test]
    fn hashed_index_rejects_bad_load_factor() {
        let mut index = Index::new(FxBuildHasher, DefaultEq);
        assert!(index.set_max_load_factor(0.0).is_err());
        assert!(index.set_max_load_factor(f32::NAN).is_err());
        assert!(index.set_max_load_factor(-1.0).is_err());
        assert!(index.set_max_load_factor(0.5).is_ok());
        assert_eq!(index.max_load_factor(), 0.5);
    }
}
