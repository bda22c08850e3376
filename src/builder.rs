//! Builder for the configuration bundle of a container.
//!
//! A container's configuration is its clock, its primary-index functors
//! (comparator, or hasher plus key equality) and its initial sizing. The
//! builder collects them, then produces any of the container shapes; the
//! shape is picked by the annotated result type.
//!
//! ## Example
//!
//! ```rust
//! use agedkit::builder::ContainerBuilder;
//! use agedkit::clock::ManualClock;
//! use agedkit::{AgedHashMap, AgedMultiSet};
//!
//! let clock = ManualClock::new(0);
//!
//! let mut tags: AgedMultiSet<&str, _> = ContainerBuilder::new(&clock).ordered().build();
//! tags.insert_key("rust").unwrap();
//!
//! let mut hits: AgedHashMap<u64, u32, _> = ContainerBuilder::new(&clock)
//!     .capacity(1024)
//!     .hashed()
//!     .max_load_factor(0.75)
//!     .try_build()
//!     .unwrap();
//! hits.insert(7, 1).unwrap();
//! assert!(hits.bucket_count() as f32 * 0.75 >= 1024.0);
//! ```

use std::hash::{BuildHasher, Hash};

use rustc_hash::FxBuildHasher;

use crate::clock::Clock;
use crate::container::{AgedContainer, Multiplicity};
use crate::ds::bucket_index::{
    good_bucket_count, validate_max_load_factor, HashedIndex, DEFAULT_BUCKET_COUNT, DEFAULT_MAX_LOAD_FACTOR,
};
use crate::ds::skip_index::OrderedIndex;
use crate::error::ConfigError;
use crate::index::{Compare, DefaultEq, KeyEq, Natural};

/// Entry point: a clock and an initial element capacity.
#[derive(Debug, Clone)]
pub struct ContainerBuilder<C> {
    clock: C,
    capacity: usize,
}

impl<C: Clock> ContainerBuilder<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, capacity: 0 }
    }

    /// Number of elements to allocate room for up front.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Continues with an ordered primary index using [`Natural`] order.
    pub fn ordered(self) -> OrderedBuilder<C, Natural> {
        OrderedBuilder {
            clock: self.clock,
            capacity: self.capacity,
            cmp: Natural,
        }
    }

    /// Continues with a hashed primary index using `FxBuildHasher` and
    /// [`DefaultEq`].
    pub fn hashed(self) -> HashedBuilder<C, FxBuildHasher, DefaultEq> {
        HashedBuilder {
            clock: self.clock,
            capacity: self.capacity,
            hasher: FxBuildHasher,
            key_eq: DefaultEq,
            bucket_count: DEFAULT_BUCKET_COUNT,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

/// Configuration of an ordered container.
#[derive(Debug, Clone)]
pub struct OrderedBuilder<C, Cmp> {
    clock: C,
    capacity: usize,
    cmp: Cmp,
}

impl<C: Clock, Cmp> OrderedBuilder<C, Cmp> {
    pub fn comparator<Cmp2>(self, cmp: Cmp2) -> OrderedBuilder<C, Cmp2> {
        OrderedBuilder {
            clock: self.clock,
            capacity: self.capacity,
            cmp,
        }
    }

    pub fn build<K, V, M>(self) -> AgedContainer<K, V, OrderedIndex<Cmp>, M, C>
    where
        Cmp: Compare<K>,
        M: Multiplicity,
    {
        AgedContainer::from_parts(self.clock, OrderedIndex::new(self.cmp), self.capacity)
    }
}

/// Configuration of a hashed container.
#[derive(Debug, Clone)]
pub struct HashedBuilder<C, S, E> {
    clock: C,
    capacity: usize,
    hasher: S,
    key_eq: E,
    bucket_count: usize,
    max_load_factor: f32,
}

impl<C: Clock, S, E> HashedBuilder<C, S, E> {
    pub fn hasher<S2>(self, hasher: S2) -> HashedBuilder<C, S2, E> {
        HashedBuilder {
            clock: self.clock,
            capacity: self.capacity,
            hasher,
            key_eq: self.key_eq,
            bucket_count: self.bucket_count,
            max_load_factor: self.max_load_factor,
        }
    }

    pub fn key_eq<E2>(self, key_eq: E2) -> HashedBuilder<C, S, E2> {
        HashedBuilder {
            clock: self.clock,
            capacity: self.capacity,
            hasher: self.hasher,
            key_eq,
            bucket_count: self.bucket_count,
            max_load_factor: self.max_load_factor,
        }
    }

    /// Initial bucket count, rounded up to the growth sequence. Must be
    /// non-zero.
    pub fn bucket_count(mut self, count: usize) -> Self {
        self.bucket_count = count;
        self
    }

    /// Must be positive and finite.
    pub fn max_load_factor(mut self, factor: f32) -> Self {
        self.max_load_factor = factor;
        self
    }

    /// Validates the configuration and builds the container.
    ///
    /// The bucket array starts large enough for `capacity` elements under the
    /// configured load factor.
    pub fn try_build<K, V, M>(self) -> Result<AgedContainer<K, V, HashedIndex<S, E>, M, C>, ConfigError>
    where
        K: Hash,
        S: BuildHasher,
        E: KeyEq<K>,
        M: Multiplicity,
    {
        if self.bucket_count == 0 {
            return Err(ConfigError::new("bucket count must be non-zero"));
        }
        validate_max_load_factor(self.max_load_factor)?;

        let needed = (self.capacity as f64 / self.max_load_factor as f64).ceil() as usize;
        let count = good_bucket_count(self.bucket_count.max(needed));
        let mut index = HashedIndex::with_bucket_count(self.hasher, self.key_eq, count);
        index.set_max_load_factor(self.max_load_factor)?;
        tracing::debug!(
            bucket_count = index.bucket_count(),
            capacity = self.capacity,
            max_load_factor = self.max_load_factor,
            "built hashed container"
        );
        Ok(AgedContainer::from_parts(self.clock, index, self.capacity))
    }
}
