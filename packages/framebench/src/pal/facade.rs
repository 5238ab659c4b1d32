// Facade that dispatches to either the real clock or a mock in tests.

#[cfg(test)]
use std::sync::Arc;
use std::time::Instant;

#[cfg(test)]
use crate::pal::MockClock;
use crate::pal::{BuildTargetClock, Clock};

/// Facade over the monotonic clock, dispatching to the real or mock implementation.
#[derive(Clone)]
pub(crate) enum ClockFacade {
    Target(&'static BuildTargetClock),

    #[cfg(test)]
    Mock(Arc<MockClock>),
}

static BUILD_TARGET_CLOCK: BuildTargetClock = BuildTargetClock;

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl ClockFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BUILD_TARGET_CLOCK)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockClock) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Clock for ClockFacade {
    fn now(&self) -> Instant {
        match self {
            Self::Target(clock) => clock.now(),
            #[cfg(test)]
            Self::Mock(mock) => mock.now(),
        }
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl std::fmt::Debug for ClockFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target(_) => f.debug_struct("ClockFacade::Target").finish(),
            #[cfg(test)]
            Self::Mock(_) => f.debug_struct("ClockFacade::Mock").finish(),
        }
    }
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Default for ClockFacade {
    fn default() -> Self {
        Self::target()
    }
}
