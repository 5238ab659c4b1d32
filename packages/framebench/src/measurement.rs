use std::time::Duration;

/// Aggregate statistics of one measured configuration.
///
/// Produced exactly once per run by [`run()`][crate::run] and never mutated afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Measurement {
    elapsed: Duration,
    total_repetitions: u64,
    total_input_bytes: u128,
    total_output_bytes: u128,
    verified: bool,
}

impl Measurement {
    pub(crate) fn new(
        elapsed: Duration,
        total_repetitions: u64,
        total_input_bytes: u128,
        total_output_bytes: u128,
        verified: bool,
    ) -> Self {
        assert!(
            total_repetitions > 0,
            "a measurement always covers at least one repetition"
        );

        Self {
            elapsed,
            total_repetitions,
            total_input_bytes,
            total_output_bytes,
            verified,
        }
    }

    #[cfg(test)]
    pub(crate) fn fake(
        elapsed_nanos: u64,
        total_repetitions: u64,
        total_input_bytes: u128,
        total_output_bytes: u128,
    ) -> Self {
        Self::new(
            Duration::from_nanos(elapsed_nanos),
            total_repetitions,
            total_input_bytes,
            total_output_bytes,
            true,
        )
    }

    /// Wall clock time spent in measured batches.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of calls measured. Never zero.
    #[must_use]
    pub fn total_repetitions(&self) -> u64 {
        self.total_repetitions
    }

    /// Sum of the input sizes of all measured calls.
    #[must_use]
    pub fn total_input_bytes(&self) -> u128 {
        self.total_input_bytes
    }

    /// Sum of the output sizes of all measured calls.
    #[must_use]
    pub fn total_output_bytes(&self) -> u128 {
        self.total_output_bytes
    }

    /// Whether the output of the final call passed the correctness check.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub(crate) fn into_unverified(self) -> Self {
        Self {
            verified: false,
            ..self
        }
    }

    /// Mean input size per call, rounded down.
    #[must_use]
    pub fn mean_input_size(&self) -> u128 {
        self.total_input_bytes
            .checked_div(u128::from(self.total_repetitions))
            .expect("guarded by non-zero repetitions in constructor")
    }

    /// Mean output size per call.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "statistics are reported with limited precision anyway"
    )]
    pub fn mean_output_size(&self) -> f64 {
        self.total_output_bytes as f64 / self.total_repetitions as f64
    }

    /// Mean wall clock time per call, rounded down to whole nanoseconds.
    #[must_use]
    pub fn nanos_per_repetition(&self) -> u128 {
        self.elapsed
            .as_nanos()
            .checked_div(u128::from(self.total_repetitions))
            .expect("guarded by non-zero repetitions in constructor")
    }

    /// Input bytes processed per second of elapsed time.
    ///
    /// Returns infinity if no measurable time elapsed.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "statistics are reported with limited precision anyway"
    )]
    pub fn bytes_per_second(&self) -> f64 {
        self.total_input_bytes as f64 / self.elapsed.as_secs_f64()
    }

    /// Input throughput in decimal megabytes per second.
    #[must_use]
    pub fn megabytes_per_second(&self) -> f64 {
        self.bytes_per_second() / 1_000_000.0
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn derived_statistics() {
        // 4 calls of 1000 bytes in 2 microseconds, producing 10 bytes each.
        let measurement = Measurement::fake(2_000, 4, 4_000, 41);

        assert_eq!(measurement.mean_input_size(), 1_000);
        assert!((measurement.mean_output_size() - 10.25).abs() < f64::EPSILON);
        assert_eq!(measurement.nanos_per_repetition(), 500);
        assert!((measurement.bytes_per_second() - 2_000_000_000.0).abs() < 1.0);
        assert!((measurement.megabytes_per_second() - 2_000.0).abs() < 0.001);
        assert!(measurement.is_verified());
    }

    #[test]
    fn into_unverified_only_clears_flag() {
        let measurement = Measurement::fake(100, 2, 20, 10);
        let unverified = measurement.clone().into_unverified();

        assert!(!unverified.is_verified());
        assert_eq!(unverified.total_repetitions(), measurement.total_repetitions());
        assert_eq!(unverified.elapsed(), measurement.elapsed());
        assert_eq!(
            unverified.total_output_bytes(),
            measurement.total_output_bytes()
        );
    }

    #[test]
    #[should_panic]
    fn zero_repetitions_panics() {
        drop(Measurement::new(Duration::ZERO, 0, 0, 0, true));
    }

    #[test]
    fn zero_elapsed_gives_infinite_throughput() {
        let measurement = Measurement::fake(0, 1, 10, 5);

        assert!(measurement.bytes_per_second().is_infinite());
    }
}
