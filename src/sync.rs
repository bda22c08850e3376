//! Thread-safe wrapper for sharing one container between threads.
//!
//! [`SharedContainer`] puts a container behind `Arc<parking_lot::RwLock<_>>`.
//! Lookups and chronological scans take the read lock and may run in
//! parallel; anything that inserts, touches or erases takes the write lock.
//! Element ids stay valid across lock acquisitions as long as the element is
//! not erased in between.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use agedkit::clock::ManualClock;
//! use agedkit::sync::SharedContainer;
//! use agedkit::AgedHashMap;
//!
//! let clock = Arc::new(ManualClock::new(0));
//! let shared = SharedContainer::new(AgedHashMap::<u32, u32, _>::new(Arc::clone(&clock)));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let shared = shared.clone();
//!         thread::spawn(move || {
//!             for k in 0..10 {
//!                 shared.write(|map| map.insert(t * 10 + k, k)).unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(shared.len(), 40);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::clock::Clock;
use crate::container::{AgedContainer, ElementOf, Multiplicity};
use crate::index::PrimaryIndex;

/// Cloneable handle to a container guarded by a read-write lock.
pub struct SharedContainer<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> SharedContainer<T> {
    pub fn new(container: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(container)),
        }
    }

    /// Runs `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Runs `f` under the write lock if it can be taken without blocking.
    pub fn try_write<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.inner.try_write().map(|mut guard| f(&mut guard))
    }

    /// Unwraps the container if this is the last handle.
    pub fn try_unwrap(self) -> Result<T, Self> {
        Arc::try_unwrap(self.inner)
            .map(|lock| lock.into_inner())
            .map_err(|inner| Self { inner })
    }
}

impl<K, V, X, M, C> SharedContainer<AgedContainer<K, V, X, M, C>>
where
    X: PrimaryIndex<K>,
    M: Multiplicity,
    C: Clock,
{
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Clones the value of the first element with `key`.
    pub fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.read().get(key).cloned()
    }

    pub fn touch(&self, key: &K) -> usize {
        self.inner.write().touch(key)
    }

    pub fn erase(&self, key: &K) -> usize {
        self.inner.write().erase(key)
    }

    pub fn pop_oldest(&self) -> Option<ElementOf<K, V, C>> {
        self.inner.write().pop_oldest()
    }

    /// Pops oldest elements while `expired` holds for them, under a single
    /// write lock.
    pub fn pop_while<F>(&self, mut expired: F) -> Vec<ElementOf<K, V, C>>
    where
        F: FnMut(&ElementOf<K, V, C>) -> bool,
    {
        let mut guard = self.inner.write();
        let mut popped = Vec::new();
        while guard.chronological().front().map_or(false, &mut expired) {
            match guard.pop_oldest() {
                Some(element) => popped.push(element),
                None => break,
            }
        }
        popped
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

impl<T> Clone for SharedContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for SharedContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContainer")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::{AgedHashMap, AgedMultiSet};

    #[test]
    fn read_and_write_share_state() {
        let clock = Arc::new(ManualClock::new(0));
        let shared = SharedContainer::new(AgedHashMap::<u32, &str, _>::new(Arc::clone(&clock)));
        let other = shared.clone();
        other.write(|m| m.insert(1, "one")).unwrap();
        assert!(shared.contains_key(&1));
        assert_eq!(shared.get_cloned(&1), Some("one"));
        assert_eq!(shared.read(|m| m.len()), 1);
        assert_eq!(shared.try_write(|m| m.erase(&1)), Some(1));
        assert!(shared.is_empty());
    }

    #[test]
    fn pop_while_stops_at_first_fresh_element() {
        let clock = Arc::new(ManualClock::new(0));
        let shared = SharedContainer::new(AgedMultiSet::<u32, _>::new(Arc::clone(&clock)));
        for key in 0..6 {
            clock.set(key as u64);
            shared.write(|s| s.insert_key(key)).unwrap();
        }
        shared.touch(&1);
        let popped = shared.pop_while(|e| e.when() < 3);
        let keys: Vec<_> = popped.iter().map(|e| *e.key()).collect();
        assert_eq!(keys, vec![0, 2]);
        assert_eq!(shared.len(), 4);
        assert!(shared.pop_oldest().is_some());
        shared.clear();
        assert!(shared.is_empty());
    }

    #[test]
    fn try_unwrap_needs_last_handle() {
        let clock = ManualClock::new(0);
        let shared = SharedContainer::new(AgedMultiSet::<u8, _>::new(&clock));
        let extra = shared.clone();
        let shared = shared.try_unwrap().unwrap_err();
        drop(extra);
        let set = shared.try_unwrap().unwrap();
        assert!(set.is_empty());
        assert!(format!("{:?}", SharedContainer::new(())).contains("SharedContainer"));
    }
}
