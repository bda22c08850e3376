//! Operations of containers admitting equal keys.

use crate::clock::Clock;
use crate::ds::slot_arena::SlotId;
use crate::error::AllocError;
use crate::index::PrimaryIndex;

use super::{AgedContainer, Multi};

impl<K, V, X, C> AgedContainer<K, V, X, Multi, C>
where
    X: PrimaryIndex<K>,
    C: Clock,
{
    /// Inserts a new element at the end of the run of elements with `key`.
    pub fn insert(&mut self, key: K, value: V) -> Result<SlotId, AllocError> {
        self.place(key, move || value).map(|(id, _)| id)
    }

    pub fn emplace_with<F>(&mut self, key: K, make: F) -> Result<SlotId, AllocError>
    where
        F: FnOnce() -> V,
    {
        self.place(key, make).map(|(id, _)| id)
    }

    /// Inserts with a position hint. Duplicates always go to the end of their
    /// run; the hint is not used.
    pub fn insert_hint(&mut self, _hint: Option<SlotId>, key: K, value: V) -> Result<SlotId, AllocError> {
        self.insert(key, value)
    }

    pub fn emplace_hint<F>(&mut self, _hint: Option<SlotId>, key: K, make: F) -> Result<SlotId, AllocError>
    where
        F: FnOnce() -> V,
    {
        self.emplace_with(key, make)
    }
}

impl<K, X, C> AgedContainer<K, (), X, Multi, C>
where
    X: PrimaryIndex<K>,
    C: Clock,
{
    /// Multiset insert; always creates an element.
    pub fn insert_key(&mut self, key: K) -> Result<SlotId, AllocError> {
        self.place(key, || ()).map(|(id, _)| id)
    }
}
