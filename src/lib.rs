//! agedkit: associative containers that also remember when each element was
//! inserted or last touched.
//!
//! Every container keeps one element population under two orders at once: a
//! primary index (ordered by a comparator, or hashed) and a chronological
//! list from oldest to newest. See [`container`] for the architecture and
//! [`builder`] for configuring a container.
//!
//! ```rust
//! use agedkit::clock::ManualClock;
//! use agedkit::AgedMap;
//!
//! let clock = ManualClock::new(1);
//! let mut ages: AgedMap<&str, u32, _> = AgedMap::new(&clock);
//! ages.insert("a", 1).unwrap();
//! clock.set(2);
//! ages.insert("b", 2).unwrap();
//! clock.set(3);
//! ages.touch(&"a");
//!
//! let oldest = ages.chronological().front().map(|e| *e.key());
//! assert_eq!(oldest, Some("b"));
//! ```

pub mod builder;
pub mod clock;
pub mod container;
pub mod ds;
pub mod error;
pub mod index;
mod store;

#[cfg(feature = "metrics")]
pub mod metrics;
#[cfg(feature = "concurrency")]
pub mod sync;

pub mod prelude;

pub use crate::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::container::{
    AgedContainer, AgedHashMap, AgedHashMultiMap, AgedHashMultiSet, AgedHashSet, AgedMap,
    AgedMultiMap, AgedMultiSet, AgedSet, ElementOf, Multi, Unique,
};
pub use crate::ds::{HashedIndex, OrderedIndex, SlotId};
#[cfg(feature = "metrics")]
pub use crate::metrics::ContainerMetricsSnapshot;
pub use crate::store::Element;
