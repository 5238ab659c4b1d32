// Platform abstraction layer for the measurement engine.
//
// The timing loop reads a monotonic clock once per batch. Routing that through a trait lets
// tests script the passage of time instead of depending on how fast the test machine is.
// The pattern follows the three-layer approach: abstraction (trait) -> facade (enum) -> real
// implementation.

mod abstractions;
mod facade;
mod real;

pub(crate) use abstractions::*;
pub(crate) use facade::*;
pub(crate) use real::*;
