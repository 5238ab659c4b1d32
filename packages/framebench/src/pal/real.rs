// Real clock implementation that delegates to the standard library.
//
// This is a trivial forwarder to system APIs and is excluded from coverage and mutation testing.

use std::time::Instant;

use crate::pal::Clock;

/// The monotonic clock of the build target, as exposed by `std::time::Instant`.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetClock;

// Trivial forwarder to system APIs - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Clock for BuildTargetClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
