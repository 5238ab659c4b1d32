use std::num::NonZero;
use std::ops::RangeInclusive;

use new_zealand::nz;

use crate::{
    BuildContext, Corpus, Dictionary, Error, OperationFactory, Outcome, Record, Reporter, Result,
    RunConfig, Summary, run,
};

/// The label of a session when none is configured.
pub const DEFAULT_LABEL: &str = "framebench";

/// Everything that defines a benchmark session: which levels to sweep, how to measure each
/// configuration and how many times to repeat the sweep.
///
/// # Examples
///
/// ```
/// use framebench::{DriverConfig, RunConfig};
/// use new_zealand::nz;
///
/// let config = DriverConfig::new(1..=9, RunConfig::default())
///     .unwrap()
///     .with_label("baseline")
///     .with_rounds(nz!(3));
///
/// assert_eq!(config.levels(), 1..=9);
/// assert_eq!(config.rounds().get(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct DriverConfig {
    label: String,
    min_level: i32,
    max_level: i32,
    run: RunConfig,
    rounds: NonZero<u32>,
}

impl DriverConfig {
    /// Sweeps every level in `levels`, measuring each one as described by `run`. The level of
    /// `run` itself is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `levels` is empty.
    pub fn new(levels: RangeInclusive<i32>, run: RunConfig) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::configuration(format!(
                "level range {}..={} is empty",
                levels.start(),
                levels.end()
            )));
        }

        Ok(Self {
            label: DEFAULT_LABEL.to_string(),
            min_level: *levels.start(),
            max_level: *levels.end(),
            run,
            rounds: nz!(1),
        })
    }

    /// Sets the label that identifies this session in every record. Defaults to
    /// [`DEFAULT_LABEL`].
    #[must_use]
    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self
        }
    }

    /// Sets how many times the whole sweep is repeated. Defaults to 1.
    #[must_use]
    pub fn with_rounds(self, rounds: NonZero<u32>) -> Self {
        Self { rounds, ..self }
    }

    /// The label that identifies this session in every record.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The levels to sweep.
    #[must_use]
    pub fn levels(&self) -> RangeInclusive<i32> {
        self.min_level..=self.max_level
    }

    /// How each configuration is measured.
    #[must_use]
    pub fn run_config(&self) -> &RunConfig {
        &self.run
    }

    /// How many times the whole sweep is repeated.
    #[must_use]
    pub fn rounds(&self) -> NonZero<u32> {
        self.rounds
    }
}

/// Measures every level of every operation variant and reports one [`Record`] per
/// configuration.
///
/// Failures that only affect one configuration are reported and the session moves on. A
/// verification failure is reported and then ends the session with an error.
#[derive(Debug)]
pub struct Driver<'a> {
    config: DriverConfig,
    corpus: &'a Corpus,
    dictionary: Option<&'a Dictionary>,
}

impl<'a> Driver<'a> {
    /// Creates a driver that feeds `corpus` to every operation, offering `dictionary` to those
    /// that can use one.
    #[must_use]
    pub fn new(
        config: DriverConfig,
        corpus: &'a Corpus,
        dictionary: Option<&'a Dictionary>,
    ) -> Self {
        Self {
            config,
            corpus,
            dictionary,
        }
    }

    /// Runs the session over the operations built by `factories`, in order, handing every
    /// record to `reporter`.
    ///
    /// Each round builds every operation afresh, so each round starts from cold resources.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] if any operation produced incorrect output. The failed
    /// configuration has already been reported.
    ///
    /// Returns [`Error::Output`] if the reporter fails.
    pub fn run<F>(&self, factories: &[F], reporter: &mut dyn Reporter) -> Result<Summary>
    where
        F: OperationFactory,
    {
        let mut summary = Summary::default();
        let pools = self.config.run_config().pools();

        for round in 1..=self.config.rounds().get() {
            tracing::info!(
                round,
                rounds = self.config.rounds().get(),
                label = self.config.label(),
                "starting round"
            );

            for factory in factories {
                if factory.requires_dictionary() && self.dictionary.is_none() {
                    tracing::info!(
                        operation = factory.name(),
                        "skipping operation that requires a dictionary"
                    );
                    continue;
                }

                let context = BuildContext::new(pools, self.config.levels(), self.dictionary);

                let mut operation = match factory.build(&context) {
                    Ok(operation) => operation,
                    Err(error) => {
                        tracing::warn!(
                            operation = factory.name(),
                            %error,
                            "failed to build operation"
                        );

                        for level in self.config.levels() {
                            self.emit(
                                reporter,
                                &mut summary,
                                factory.name(),
                                level,
                                Outcome::Failed(error.duplicate()),
                            )?;
                        }

                        continue;
                    }
                };

                for level in self.config.levels() {
                    let config = self.config.run_config().with_level(level);

                    tracing::debug!(operation = factory.name(), level, "measuring");

                    match run(operation.as_mut(), &config, self.corpus) {
                        Ok(measurement) => self.emit(
                            reporter,
                            &mut summary,
                            factory.name(),
                            level,
                            Outcome::Measured(measurement),
                        )?,
                        Err(error) if error.is_fatal() => {
                            tracing::error!(
                                operation = factory.name(),
                                level,
                                %error,
                                "stopping session"
                            );

                            self.emit(
                                reporter,
                                &mut summary,
                                factory.name(),
                                level,
                                Outcome::Failed(error.duplicate()),
                            )?;

                            return Err(error);
                        }
                        Err(error) => {
                            tracing::warn!(
                                operation = factory.name(),
                                level,
                                %error,
                                "configuration failed"
                            );

                            self.emit(
                                reporter,
                                &mut summary,
                                factory.name(),
                                level,
                                Outcome::Failed(error),
                            )?;
                        }
                    }
                }
            }
        }

        tracing::info!(
            measured = summary.measured(),
            failed = summary.failed(),
            "session complete"
        );

        Ok(summary)
    }

    fn emit(
        &self,
        reporter: &mut dyn Reporter,
        summary: &mut Summary,
        operation: &str,
        level: i32,
        outcome: Outcome,
    ) -> Result<()> {
        let record = Record::new(
            self.config.label(),
            operation,
            level,
            self.config.run_config().pools().compression().get(),
            outcome,
        );

        reporter
            .report(&record)
            .map_err(|source| Error::Output { source })?;

        summary.count(&record);

        Ok(())
    }
}
