//! Construction and the bucket interface for containers with a hashed
//! primary index.

use std::hash::{BuildHasher, Hash};

use crate::clock::Clock;
use crate::ds::bucket_index::HashedIndex;
use crate::error::{AllocError, ConfigError};
use crate::index::KeyEq;

use super::{AgedContainer, BucketIter, Multiplicity};

impl<K, V, S, E, M, C> AgedContainer<K, V, HashedIndex<S, E>, M, C>
where
    K: Hash,
    S: BuildHasher + Default,
    E: KeyEq<K> + Default,
    M: Multiplicity,
    C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self::with_hasher(clock, S::default(), E::default())
    }

    /// Starts with at least `bucket_count` buckets.
    pub fn with_bucket_count(clock: C, bucket_count: usize) -> Self {
        Self::with_bucket_count_and_hasher(clock, bucket_count, S::default(), E::default())
    }
}

impl<K, V, S, E, M, C> AgedContainer<K, V, HashedIndex<S, E>, M, C>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEq<K>,
    M: Multiplicity,
    C: Clock,
{
    pub fn with_hasher(clock: C, hasher: S, key_eq: E) -> Self {
        Self::from_parts(clock, HashedIndex::new(hasher, key_eq), 0)
    }

    pub fn with_bucket_count_and_hasher(clock: C, bucket_count: usize, hasher: S, key_eq: E) -> Self {
        Self::from_parts(clock, HashedIndex::with_bucket_count(hasher, key_eq, bucket_count), 0)
    }

    pub fn hasher(&self) -> &S {
        self.index.hasher()
    }

    pub fn key_eq(&self) -> &E {
        self.index.key_eq()
    }

    pub fn bucket_count(&self) -> usize {
        self.index.bucket_count()
    }

    pub fn max_bucket_count(&self) -> usize {
        self.index.max_bucket_count()
    }

    /// Number of elements chained in bucket `n`.
    pub fn bucket_size(&self, n: usize) -> usize {
        self.index.bucket_size::<K, _>(self.store.arena(), n)
    }

    /// Bucket that `key` maps to under the current bucket count.
    pub fn bucket(&self, key: &K) -> usize {
        self.index.bucket(key)
    }

    /// Elements chained in bucket `n`.
    pub fn bucket_iter(&self, n: usize) -> BucketIter<'_, K, V, S, E, C::Instant> {
        BucketIter::new(self.store.arena(), &self.index, n)
    }

    /// `len() / bucket_count()`.
    pub fn load_factor(&self) -> f32 {
        self.index.load_factor()
    }

    pub fn max_load_factor(&self) -> f32 {
        self.index.max_load_factor()
    }

    /// Sets the max load factor exactly as given, growing right away if the
    /// current load exceeds it.
    ///
    /// Fails without changing anything if `factor` is not positive and finite
    /// or if the grown bucket array cannot be allocated.
    pub fn set_max_load_factor(&mut self, factor: f32) -> Result<(), ConfigError> {
        let previous = self.index.max_load_factor();
        self.index.set_max_load_factor(factor)?;
        let len = self.len();
        match self.index.maybe_rehash::<K, _>(self.store.arena_mut(), len, 0) {
            Ok(_rehashed) => {
                #[cfg(feature = "metrics")]
                {
                    self.metrics.rehashes += _rehashed as u64;
                }
                Ok(())
            },
            Err(err) => {
                self.index.set_max_load_factor(previous)?;
                Err(ConfigError::new(format!(
                    "cannot grow buckets for max load factor {}: {}",
                    factor, err
                )))
            },
        }
    }

    /// Sets the bucket count to at least `count` buckets, and never fewer than
    /// the current population needs under the max load factor. May shrink.
    pub fn rehash(&mut self, count: usize) -> Result<(), AllocError> {
        let _rehashed = self.index.rehash::<K, _>(self.store.arena_mut(), count)?;
        #[cfg(feature = "metrics")]
        {
            self.metrics.rehashes += _rehashed as u64;
        }
        Ok(())
    }

    /// Makes room for `count` elements in total without further growth.
    pub fn reserve(&mut self, count: usize) -> Result<(), AllocError> {
        let len = self.len();
        self.store.try_reserve(count.saturating_sub(len))?;
        let _rehashed = self.index.maybe_rehash::<K, _>(self.store.arena_mut(), count, 0)?;
        #[cfg(feature = "metrics")]
        {
            self.metrics.rehashes += _rehashed as u64;
        }
        Ok(())
    }
}

impl<K, V, S, E, M, C> PartialEq for AgedContainer<K, V, HashedIndex<S, E>, M, C>
where
    K: Hash,
    V: PartialEq,
    S: BuildHasher,
    E: KeyEq<K>,
    M: Multiplicity,
    C: Clock,
{
    /// Group-wise: every key run must hold the same values, in any order.
    /// Timestamps are not compared.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut current = self.first();
        while let Some(start) = current {
            let Some(element) = self.element(start) else {
                return false;
            };
            let ours: Vec<&V> = self.equal_range(element.key()).map(|e| e.value()).collect();
            let theirs: Vec<&V> = other.equal_range(element.key()).map(|e| e.value()).collect();
            if !is_permutation(&ours, &theirs) {
                return false;
            }
            current = Some(start);
            for _ in 0..ours.len() {
                current = current.and_then(|id| self.next(id));
            }
        }
        true
    }
}

impl<K, V, S, E, M, C> Eq for AgedContainer<K, V, HashedIndex<S, E>, M, C>
where
    K: Hash,
    V: Eq,
    S: BuildHasher,
    E: KeyEq<K>,
    M: Multiplicity,
    C: Clock,
{
}

fn is_permutation<T: PartialEq + ?Sized>(a: &[&T], b: &[&T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut matched = vec![false; b.len()];
    a.iter().all(|x| {
        let hit = b
            .iter()
            .enumerate()
            .position(|(i, y)| !matched[i] && *x == *y);
        match hit {
            Some(i) => {
                matched[i] = true;
                true
            },
            None => false,
        }
    })
}
