use std::num::NonZero;
use std::time::Duration;

use new_zealand::nz;

use crate::pool::slot_in;
use crate::{Error, Result};

/// The target duration used when none is configured.
pub const DEFAULT_TARGET_DURATION: Duration = Duration::from_millis(25);

/// The size of the first batch when none is configured.
pub const DEFAULT_INITIAL_REPETITIONS: NonZero<u64> = nz!(4);

/// Number of slots in each kind of resource pool used by one run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolSizes {
    compression: NonZero<usize>,
    decompression: NonZero<usize>,
    dictionaries: NonZero<usize>,
}

impl PoolSizes {
    /// Pool sizes with the given number of compression contexts, decompression contexts and
    /// materialized dictionaries per level.
    #[must_use]
    pub const fn new(
        compression: NonZero<usize>,
        decompression: NonZero<usize>,
        dictionaries: NonZero<usize>,
    ) -> Self {
        Self {
            compression,
            decompression,
            dictionaries,
        }
    }

    /// Number of compression contexts to rotate through.
    #[must_use]
    pub const fn compression(&self) -> NonZero<usize> {
        self.compression
    }

    /// Number of decompression contexts to rotate through.
    #[must_use]
    pub const fn decompression(&self) -> NonZero<usize> {
        self.decompression
    }

    /// Number of materialized dictionaries per level to rotate through.
    #[must_use]
    pub const fn dictionaries(&self) -> NonZero<usize> {
        self.dictionaries
    }

    /// The number of slots one-time setup has to visit so that every compression and every
    /// decompression context is prepared.
    #[must_use]
    pub fn setup_slots(&self) -> NonZero<usize> {
        self.compression.max(self.decompression)
    }

    /// The slot of every pool that serves `iteration`.
    #[must_use]
    pub fn slots_for(&self, iteration: u64) -> Slots {
        Slots {
            compression: slot_in(iteration, self.compression),
            decompression: slot_in(iteration, self.decompression),
            dictionary: slot_in(iteration, self.dictionaries),
        }
    }
}

impl Default for PoolSizes {
    fn default() -> Self {
        Self::new(nz!(1), nz!(1), nz!(1))
    }
}

/// The pool slots lent to an operation for one call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "a plain set of indexes that operations destructure"
)]
pub struct Slots {
    /// Index into the compression context pool.
    pub compression: usize,

    /// Index into the decompression context pool.
    pub decompression: usize,

    /// Index into the per-level materialized dictionary pool.
    pub dictionary: usize,
}

/// The immutable parameter set that fully determines one measurement.
///
/// Use [`RunConfig::builder()`] to create an instance.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use framebench::RunConfig;
///
/// let config = RunConfig::builder()
///     .level(3)
///     .contexts(4)
///     .target_duration(Duration::from_millis(100))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.level(), 3);
/// assert_eq!(config.pools().compression().get(), 4);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunConfig {
    level: i32,
    pools: PoolSizes,
    target_duration: Duration,
    initial_repetitions: NonZero<u64>,
    starting_iteration: u64,
    max_input_size: Option<NonZero<usize>>,
}

impl RunConfig {
    /// Creates a builder with the default configuration.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }

    /// The compression level to measure.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Sizes of the resource pools to rotate through.
    #[must_use]
    pub fn pools(&self) -> PoolSizes {
        self.pools
    }

    /// Measurement stops at the end of the first batch that reaches this duration.
    #[must_use]
    pub fn target_duration(&self) -> Duration {
        self.target_duration
    }

    /// Number of calls in the first batch.
    #[must_use]
    pub fn initial_repetitions(&self) -> NonZero<u64> {
        self.initial_repetitions
    }

    /// Iteration number of the first call in every batch.
    #[must_use]
    pub fn starting_iteration(&self) -> u64 {
        self.starting_iteration
    }

    /// Samples longer than this are truncated to this many bytes before being measured.
    #[must_use]
    pub fn max_input_size(&self) -> Option<NonZero<usize>> {
        self.max_input_size
    }

    /// The number of bytes of a sample of `len` bytes that a call receives.
    #[must_use]
    pub fn clamp_input_len(&self, len: usize) -> usize {
        self.max_input_size.map_or(len, |max| len.min(max.get()))
    }

    /// The same configuration, measuring a different compression level.
    #[must_use]
    pub fn with_level(&self, level: i32) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            level: 1,
            pools: PoolSizes::default(),
            target_duration: DEFAULT_TARGET_DURATION,
            initial_repetitions: DEFAULT_INITIAL_REPETITIONS,
            starting_iteration: 0,
            max_input_size: None,
        }
    }
}

/// Creates instances of [`RunConfig`].
///
/// Every property has a default, see the individual setters. Sizes and counts are accepted as
/// plain integers and validated by [`build()`][Self::build].
#[derive(Debug)]
#[must_use]
pub struct RunConfigBuilder {
    level: i32,
    compression_contexts: usize,
    decompression_contexts: usize,
    dictionaries: usize,
    target_duration: Duration,
    initial_repetitions: u64,
    starting_iteration: u64,
    max_input_size: Option<usize>,
}

impl RunConfigBuilder {
    fn new() -> Self {
        Self {
            level: 1,
            compression_contexts: 1,
            decompression_contexts: 1,
            dictionaries: 1,
            target_duration: DEFAULT_TARGET_DURATION,
            initial_repetitions: DEFAULT_INITIAL_REPETITIONS.get(),
            starting_iteration: 0,
            max_input_size: None,
        }
    }

    /// Sets the compression level. Defaults to 1.
    pub fn level(self, level: i32) -> Self {
        Self { level, ..self }
    }

    /// Sets both the compression and decompression context counts. Defaults to 1.
    pub fn contexts(self, count: usize) -> Self {
        Self {
            compression_contexts: count,
            decompression_contexts: count,
            ..self
        }
    }

    /// Sets the number of compression contexts to rotate through. Defaults to 1.
    pub fn compression_contexts(self, count: usize) -> Self {
        Self {
            compression_contexts: count,
            ..self
        }
    }

    /// Sets the number of decompression contexts to rotate through. Defaults to 1.
    pub fn decompression_contexts(self, count: usize) -> Self {
        Self {
            decompression_contexts: count,
            ..self
        }
    }

    /// Sets the number of materialized dictionaries per level to rotate through. Defaults to 1.
    pub fn dictionaries(self, count: usize) -> Self {
        Self {
            dictionaries: count,
            ..self
        }
    }

    /// Sets the target duration. Defaults to [`DEFAULT_TARGET_DURATION`].
    ///
    /// A zero duration is valid and measures exactly one batch.
    pub fn target_duration(self, target_duration: Duration) -> Self {
        Self {
            target_duration,
            ..self
        }
    }

    /// Sets the number of calls in the first batch. Defaults to
    /// [`DEFAULT_INITIAL_REPETITIONS`].
    pub fn initial_repetitions(self, initial_repetitions: u64) -> Self {
        Self {
            initial_repetitions,
            ..self
        }
    }

    /// Sets the iteration number of the first call in every batch. Defaults to 0.
    pub fn starting_iteration(self, starting_iteration: u64) -> Self {
        Self {
            starting_iteration,
            ..self
        }
    }

    /// Truncates samples to at most this many bytes. Defaults to no limit.
    pub fn max_input_size(self, max_input_size: Option<usize>) -> Self {
        Self {
            max_input_size,
            ..self
        }
    }

    /// Validates the configuration and builds the [`RunConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if any pool size, the initial repetition count or the
    /// maximum input size is zero.
    pub fn build(self) -> Result<RunConfig> {
        let non_zero = |value: usize, what: &str| {
            NonZero::new(value)
                .ok_or_else(|| Error::configuration(format!("{what} must be at least 1")))
        };

        let pools = PoolSizes::new(
            non_zero(self.compression_contexts, "compression context count")?,
            non_zero(self.decompression_contexts, "decompression context count")?,
            non_zero(self.dictionaries, "dictionary count")?,
        );

        let initial_repetitions = NonZero::new(self.initial_repetitions)
            .ok_or_else(|| Error::configuration("initial repetitions must be at least 1"))?;

        let max_input_size = self
            .max_input_size
            .map(|size| non_zero(size, "maximum input size"))
            .transpose()?;

        Ok(RunConfig {
            level: self.level,
            pools,
            target_duration: self.target_duration,
            initial_repetitions,
            starting_iteration: self.starting_iteration,
            max_input_size,
        })
    }
}

/// Parses a duration made of an integer and an optional unit suffix.
///
/// Accepted suffixes are `m` (minutes), `s` (seconds), `ms`, `us` and `ns`. A number without a
/// suffix is in seconds.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the number is missing or invalid, the suffix is unknown
/// or the duration does not fit in a [`Duration`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use framebench::parse_duration;
///
/// assert_eq!(parse_duration("25ms").unwrap(), Duration::from_millis(25));
/// assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
/// assert!(parse_duration("2h").is_err());
/// ```
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, suffix) = value.split_at(digits_end);

    let number = number.parse::<u64>().map_err(|e| {
        Error::configuration(format!("duration '{value}' does not start with a number: {e}"))
    })?;

    let too_long = || Error::configuration(format!("duration '{value}' is too long"));

    match suffix {
        "" | "s" => Ok(Duration::from_secs(number)),
        "m" => number
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(too_long),
        "ms" => Ok(Duration::from_millis(number)),
        "us" => Ok(Duration::from_micros(number)),
        "ns" => Ok(Duration::from_nanos(number)),
        _ => Err(Error::configuration(format!(
            "duration '{value}' has unknown unit '{suffix}' (expected m, s, ms, us or ns)"
        ))),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = RunConfig::builder().build().unwrap();

        assert_eq!(config, RunConfig::default());
        assert_eq!(config.level(), 1);
        assert_eq!(config.pools(), PoolSizes::default());
        assert_eq!(config.target_duration(), DEFAULT_TARGET_DURATION);
        assert_eq!(config.initial_repetitions(), DEFAULT_INITIAL_REPETITIONS);
        assert_eq!(config.starting_iteration(), 0);
        assert_eq!(config.max_input_size(), None);
    }

    #[test]
    fn builder_applies_every_setting() {
        let config = RunConfig::builder()
            .level(-5)
            .compression_contexts(3)
            .decompression_contexts(2)
            .dictionaries(4)
            .target_duration(Duration::from_secs(1))
            .initial_repetitions(16)
            .starting_iteration(100)
            .max_input_size(Some(4096))
            .build()
            .unwrap();

        assert_eq!(config.level(), -5);
        assert_eq!(config.pools().compression().get(), 3);
        assert_eq!(config.pools().decompression().get(), 2);
        assert_eq!(config.pools().dictionaries().get(), 4);
        assert_eq!(config.target_duration(), Duration::from_secs(1));
        assert_eq!(config.initial_repetitions().get(), 16);
        assert_eq!(config.starting_iteration(), 100);
        assert_eq!(config.max_input_size(), NonZero::new(4096));
    }

    #[test]
    fn builder_rejects_zero_values() {
        assert!(matches!(
            RunConfig::builder().contexts(0).build(),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            RunConfig::builder().dictionaries(0).build(),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            RunConfig::builder().initial_repetitions(0).build(),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            RunConfig::builder().max_input_size(Some(0)).build(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn with_level_keeps_everything_else() {
        let config = RunConfig::builder().contexts(2).level(1).build().unwrap();
        let other = config.with_level(9);

        assert_eq!(other.level(), 9);
        assert_eq!(other.pools(), config.pools());
        assert_eq!(other.with_level(1), config);
    }

    #[test]
    fn clamp_input_len() {
        let unlimited = RunConfig::default();
        assert_eq!(unlimited.clamp_input_len(1_000_000), 1_000_000);

        let limited = RunConfig::builder()
            .max_input_size(Some(100))
            .build()
            .unwrap();
        assert_eq!(limited.clamp_input_len(1_000), 100);
        assert_eq!(limited.clamp_input_len(10), 10);
    }

    #[test]
    fn slots_rotate_independently() {
        let pools = PoolSizes::new(nz!(2), nz!(3), nz!(1));

        assert_eq!(
            pools.slots_for(4),
            Slots {
                compression: 0,
                decompression: 1,
                dictionary: 0,
            }
        );
        assert_eq!(
            pools.slots_for(5),
            Slots {
                compression: 1,
                decompression: 2,
                dictionary: 0,
            }
        );
        assert_eq!(pools.setup_slots().get(), 3);
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("40us").unwrap(), Duration::from_micros(40));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
        assert_eq!(parse_duration("0ms").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        for invalid in ["", "ms", "1h", "1.5s", "-1s", "10 s", "5mss"] {
            assert!(
                matches!(parse_duration(invalid), Err(Error::Configuration { .. })),
                "'{invalid}' should be rejected"
            );
        }
    }

    #[test]
    fn parse_duration_rejects_overflow() {
        let minutes = format!("{}m", u64::MAX);

        assert!(matches!(
            parse_duration(&minutes),
            Err(Error::Configuration { .. })
        ));
    }
}
