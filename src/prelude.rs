pub use crate::builder::ContainerBuilder;
pub use crate::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::container::{
    AgedContainer, AgedHashMap, AgedHashMultiMap, AgedHashMultiSet, AgedHashSet, AgedMap,
    AgedMultiMap, AgedMultiSet, AgedSet, Multi, Unique,
};
pub use crate::ds::SlotId;
pub use crate::error::{AllocError, ConfigError, InvariantError, KeyNotFound};
pub use crate::index::{Compare, CompareFn, DefaultEq, EqFn, KeyEq, Natural};
#[cfg(feature = "metrics")]
pub use crate::metrics::ContainerMetricsSnapshot;
#[cfg(feature = "concurrency")]
pub use crate::sync::SharedContainer;
pub use crate::Element;
