//! Error types for the agedkit library.
//!
//! ## Key Components
//!
//! - [`KeyNotFound`]: Returned by [`at`](crate::AgedMap::at) and
//!   [`at_mut`](crate::AgedMap::at_mut) when a unique map has no element for
//!   the requested key.
//! - [`AllocError`]: Returned when storage for a new element, link vector or
//!   bucket array could not be obtained. The container is left exactly as it
//!   was before the call.
//! - [`InvariantError`]: Returned by `check_invariants` when the two indices
//!   disagree. Reaching one through the public API is a bug in this crate.
//! - [`ConfigError`]: Returned when container configuration parameters are
//!   invalid (e.g. a non-positive max load factor).
//!
//! ## Example Usage
//!
//! ```
//! use agedkit::clock::ManualClock;
//! use agedkit::error::KeyNotFound;
//! use agedkit::AgedMap;
//!
//! let clock = ManualClock::new(0);
//! let mut map: AgedMap<u32, &str, _> = AgedMap::new(&clock);
//! map.insert(1, "x").unwrap();
//!
//! assert_eq!(map.at(&1), Ok(&"x"));
//! assert_eq!(map.at(&2), Err(KeyNotFound));
//! ```

use std::collections::TryReserveError;
use std::fmt;

// ---------------------------------------------------------------------------
// KeyNotFound
// ---------------------------------------------------------------------------

/// Error returned when a keyed element access finds no element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyNotFound;

impl fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not found")
    }
}

impl std::error::Error for KeyNotFound {}

// ---------------------------------------------------------------------------
// AllocError
// ---------------------------------------------------------------------------

/// Error returned when element or bucket storage could not be reserved.
///
/// Carries the underlying [`TryReserveError`] from the standard collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocError(TryReserveError);

impl AllocError {
    /// Returns the reservation failure reported by the allocator.
    #[inline]
    pub fn source_error(&self) -> &TryReserveError {
        &self.0
    }
}

impl From<TryReserveError> for AllocError {
    #[inline]
    fn from(err: TryReserveError) -> Self {
        Self(err)
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage allocation failed: {}", self.0)
    }
}

impl std::error::Error for AllocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal container invariants are violated.
///
/// Produced by [`check_invariants`](crate::container::AgedContainer::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when container configuration parameters are invalid.
///
/// Produced by [`HashedBuilder::try_build`](crate::builder::HashedBuilder::try_build)
/// and by `set_max_load_factor` on hashed containers.
///
/// # Example
///
/// ```
/// use agedkit::builder::ContainerBuilder;
/// use agedkit::clock::ManualClock;
/// use agedkit::AgedHashSet;
///
/// let clock = ManualClock::new(0);
/// let built: Result<AgedHashSet<u64, _>, _> = ContainerBuilder::new(&clock)
///     .hashed()
///     .max_load_factor(0.0)
///     .try_build();
/// let err = built.err().unwrap();
/// assert!(err.to_string().contains("load factor"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn reserve_failure() -> TryReserveError {
        let mut v: Vec<u64> = Vec::new();
        v.try_reserve(usize::MAX).unwrap_err()
    }

    // -- KeyNotFound ------------------------------------------------------

    #[test]
    fn key_not_found_display() {
        assert_eq!(KeyNotFound.to_string(), "key not found");
    }

    #[test]
    fn key_not_found_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<KeyNotFound>();
    }

    // -- AllocError -------------------------------------------------------

    #[test]
    fn alloc_error_wraps_reserve_failure() {
        let err = AllocError::from(reserve_failure());
        assert!(err.to_string().starts_with("storage allocation failed"));
        assert_eq!(err.source_error(), &reserve_failure());
    }

    #[test]
    fn alloc_error_exposes_source() {
        use std::error::Error;
        let err = AllocError::from(reserve_failure());
        assert!(err.source().is_some());
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("chronological length mismatch");
        assert_eq!(err.to_string(), "chronological length mismatch");
    }

    #[test]
    fn invariant_message_accessor() {
        let err = InvariantError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("max load factor must be positive");
        assert_eq!(err.to_string(), "max load factor must be positive");
    }

    #[test]
    fn config_debug_includes_message() {
        let err = ConfigError::new("bad bucket count");
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("bad bucket count"));
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }
}
