//! Time sources for element timestamps.
//!
//! A container reads its clock on every insert and touch and never advances
//! it. The only requirement is that successive readings never go backwards;
//! the chronological view is sorted by `when` exactly as long as that holds.
//!
//! The container holds a [`Clock`] by value, and every shared handle to a
//! clock is itself a clock, so the usual arrangement is to pass `&clock`,
//! `Rc<clock>` or `Arc<clock>` and keep ownership with the caller.
//!
//! ## Example
//!
//! ```
//! use agedkit::clock::{Clock, ManualClock};
//!
//! let clock = ManualClock::new(10);
//! let shared = &clock;
//! assert_eq!(shared.now(), 10);
//! clock.advance(5);
//! assert_eq!(shared.now(), 15);
//! ```

use std::fmt::Debug;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A source of non-decreasing timestamps.
pub trait Clock {
    type Instant: Copy + Ord + Debug;

    fn now(&self) -> Self::Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    type Instant = C::Instant;

    #[inline]
    fn now(&self) -> Self::Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    type Instant = C::Instant;

    #[inline]
    fn now(&self) -> Self::Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    type Instant = C::Instant;

    #[inline]
    fn now(&self) -> Self::Instant {
        (**self).now()
    }
}

/// Tick counter advanced explicitly by the caller.
///
/// Useful for tests and simulations. Uses an atomic so a shared reference can
/// advance it while containers hold `&ManualClock`.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            ticks: AtomicU64::new(start),
        }
    }

    /// Current tick.
    #[inline]
    pub fn now(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Jumps to `tick`. Moving backwards breaks the chronological ordering of
    /// any container reading this clock.
    pub fn set(&self, tick: u64) {
        self.ticks.store(tick, Ordering::Release);
    }

    /// Advances by `ticks`, saturating at `u64::MAX`. Returns the new tick.
    pub fn advance(&self, ticks: u64) -> u64 {
        let mut current = self.ticks.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(ticks);
            match self
                .ticks
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    type Instant = u64;

    #[inline]
    fn now(&self) -> u64 {
        ManualClock::now(self)
    }
}

/// Wall-independent monotonic time from [`std::time::Instant`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    type Instant = Instant;

    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}
