//! Operations of containers holding at most one element per key.

use crate::clock::Clock;
use crate::ds::slot_arena::SlotId;
use crate::error::{AllocError, KeyNotFound};
use crate::index::PrimaryIndex;

use super::{AgedContainer, Unique};

impl<K, V, X, C> AgedContainer<K, V, X, Unique, C>
where
    X: PrimaryIndex<K>,
    C: Clock,
{
    /// Inserts `(key, value)` unless `key` is present.
    ///
    /// Returns the element for `key` and whether it was created. An existing
    /// element is left untouched: its value and `when` do not change.
    pub fn insert(&mut self, key: K, value: V) -> Result<(SlotId, bool), AllocError> {
        self.place(key, move || value)
    }

    /// Like [`insert`](Self::insert), but `make` only runs when the key is
    /// absent.
    pub fn emplace_with<F>(&mut self, key: K, make: F) -> Result<(SlotId, bool), AllocError>
    where
        F: FnOnce() -> V,
    {
        self.place(key, make)
    }

    /// Inserts with a position hint. Placement is always decided by the key;
    /// the hint is not used.
    pub fn insert_hint(&mut self, _hint: Option<SlotId>, key: K, value: V) -> Result<SlotId, AllocError> {
        self.insert(key, value).map(|(id, _)| id)
    }

    pub fn emplace_hint<F>(&mut self, _hint: Option<SlotId>, key: K, make: F) -> Result<SlotId, AllocError>
    where
        F: FnOnce() -> V,
    {
        self.emplace_with(key, make).map(|(id, _)| id)
    }

    /// Value for `key`. Never inserts.
    pub fn at(&self, key: &K) -> Result<&V, KeyNotFound> {
        self.get(key).ok_or(KeyNotFound)
    }

    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, KeyNotFound> {
        self.get_mut(key).ok_or(KeyNotFound)
    }

    /// Value for `key`, inserting `make()` stamped with the current time if
    /// it is absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> Result<&mut V, AllocError>
    where
        F: FnOnce() -> V,
    {
        let (id, _) = self.place(key, make)?;
        Ok(self.store.value_mut_at(id))
    }

    /// Value for `key`, inserting `V::default()` if it is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V, AllocError>
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }
}

impl<K, X, C> AgedContainer<K, (), X, Unique, C>
where
    X: PrimaryIndex<K>,
    C: Clock,
{
    /// Set insert. Returns the element for `key` and whether it was created.
    pub fn insert_key(&mut self, key: K) -> Result<(SlotId, bool), AllocError> {
        self.place(key, || ())
    }
}
