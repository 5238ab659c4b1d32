use std::fmt::Debug;
use std::time::Instant;

/// Source of monotonic timestamps, immune to wall clock adjustments.
///
/// This trait is automatically mocked by mockall in test builds, generating `MockClock`.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Clock: Debug {
    fn now(&self) -> Instant;
}
