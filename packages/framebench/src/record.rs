use std::fmt::{self, Display};
use std::io::{self, Write};
use std::str::FromStr;

use crate::{Error, Measurement, Result};

/// The result of measuring one configuration: an operation at one level with one pool size.
///
/// A record renders as exactly one report line. Measured records can be parsed back with
/// [`Record::parse()`], which is how two runs are compared.
///
/// # Examples
///
/// ```
/// use framebench::{Error, Outcome, Record};
///
/// let record = Record::new(
///     "baseline",
///     "zstd_compress",
///     3,
///     1,
///     Outcome::Failed(Error::Configuration {
///         problem: "no dictionary".to_string(),
///     }),
/// );
///
/// assert!(record.to_string().contains("FAILED: invalid configuration: no dictionary"));
/// ```
#[derive(Debug)]
pub struct Record {
    label: String,
    operation: String,
    level: i32,
    contexts: usize,
    outcome: Outcome,
}

/// What happened when a configuration was measured.
#[derive(Debug)]
#[non_exhaustive]
pub enum Outcome {
    /// The configuration was measured and its output verified.
    Measured(Measurement),

    /// The configuration could not be measured.
    Failed(Error),
}

impl Record {
    /// Creates a record of one configuration.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        operation: impl Into<String>,
        level: i32,
        contexts: usize,
        outcome: Outcome,
    ) -> Self {
        Self {
            label: label.into(),
            operation: operation.into(),
            level,
            contexts,
            outcome,
        }
    }

    /// The label of the run that produced the record.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Name of the measured operation.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The measured compression level.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Number of compression contexts rotated through.
    #[must_use]
    pub fn contexts(&self) -> usize {
        self.contexts
    }

    /// What happened.
    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Consumes the record, returning what happened.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    /// Whether the configuration was measured successfully.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        matches!(self.outcome, Outcome::Measured(_))
    }

    /// Parses a report line of a measured record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`] if the line is not a measured record, including the lines of
    /// failed records.
    pub fn parse(line: &str) -> Result<ParsedRecord> {
        line.parse()
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<19}: {:<30} @ lvl {:>3}, {:>3} ctxs: ",
            self.label, self.operation, self.level, self.contexts
        )?;

        match &self.outcome {
            Outcome::Measured(measurement) => write!(
                f,
                "{:>8} B -> {:>11.2} B, {:>7} iters, {:>10} ns, {:>10} ns/iter, {:>7.2} MB/s",
                measurement.mean_input_size(),
                measurement.mean_output_size(),
                measurement.total_repetitions(),
                measurement.elapsed().as_nanos(),
                measurement.nanos_per_repetition(),
                measurement.megabytes_per_second()
            ),
            Outcome::Failed(error) => write!(f, "FAILED: {error}"),
        }
    }
}

/// The values of one measured record, as read back from its report line.
///
/// Sizes and speeds carry the precision of the report line, not of the original measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRecord {
    label: String,
    operation: String,
    level: i32,
    contexts: usize,
    mean_input_size: u128,
    mean_output_size: f64,
    iterations: u64,
    elapsed_nanos: u128,
    nanos_per_iteration: u128,
    megabytes_per_second: f64,
}

impl ParsedRecord {
    /// The label of the run that produced the record.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Name of the measured operation.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The measured compression level.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Number of compression contexts rotated through.
    #[must_use]
    pub fn contexts(&self) -> usize {
        self.contexts
    }

    /// Mean input size per call, in bytes.
    #[must_use]
    pub fn mean_input_size(&self) -> u128 {
        self.mean_input_size
    }

    /// Mean output size per call, in bytes.
    #[must_use]
    pub fn mean_output_size(&self) -> f64 {
        self.mean_output_size
    }

    /// Number of calls measured.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Total measured time in nanoseconds.
    #[must_use]
    pub fn elapsed_nanos(&self) -> u128 {
        self.elapsed_nanos
    }

    /// Mean time per call in nanoseconds.
    #[must_use]
    pub fn nanos_per_iteration(&self) -> u128 {
        self.nanos_per_iteration
    }

    /// Input throughput in decimal megabytes per second.
    #[must_use]
    pub fn megabytes_per_second(&self) -> f64 {
        self.megabytes_per_second
    }
}

impl FromStr for ParsedRecord {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let invalid = |problem: &str| Error::report(line, problem);

        // Labels are free text; operation names never contain ": ".
        let (head, rest) = line
            .split_once(" @ lvl ")
            .ok_or_else(|| invalid("missing level"))?;
        let (label, operation) = head
            .rsplit_once(": ")
            .ok_or_else(|| invalid("missing label separator"))?;
        let (level, rest) = rest
            .split_once(", ")
            .ok_or_else(|| invalid("missing context count"))?;
        let (contexts, stats) = rest
            .split_once(" ctxs: ")
            .ok_or_else(|| invalid("missing context count"))?;

        if stats.starts_with("FAILED") {
            return Err(invalid("record of a failed configuration"));
        }

        let mut fields = stats.split(", ");
        let mut next_field = |suffix: &str| {
            fields
                .next()
                .and_then(|field| field.trim().strip_suffix(suffix))
                .map(str::trim)
                .ok_or_else(|| invalid(&format!("missing field ending in '{suffix}'")))
        };

        let sizes = next_field(" B")?;
        let iterations = next_field(" iters")?;
        let elapsed_nanos = next_field(" ns")?;
        let nanos_per_iteration = next_field(" ns/iter")?;
        let megabytes_per_second = next_field(" MB/s")?;

        let (mean_input_size, mean_output_size) = sizes
            .split_once(" B -> ")
            .ok_or_else(|| invalid("missing input and output sizes"))?;

        Ok(Self {
            label: label.trim().to_string(),
            operation: operation.trim().to_string(),
            level: parse_number(line, "level", level)?,
            contexts: parse_number(line, "context count", contexts)?,
            mean_input_size: parse_number(line, "input size", mean_input_size)?,
            mean_output_size: parse_number(line, "output size", mean_output_size)?,
            iterations: parse_number(line, "iteration count", iterations)?,
            elapsed_nanos: parse_number(line, "elapsed time", elapsed_nanos)?,
            nanos_per_iteration: parse_number(line, "time per iteration", nanos_per_iteration)?,
            megabytes_per_second: parse_number(line, "speed", megabytes_per_second)?,
        })
    }
}

fn parse_number<T>(line: &str, what: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::report(line, format!("invalid {what} '{}': {e}", value.trim())))
}

/// Receives the record of every configuration as soon as it has been measured.
pub trait Reporter {
    /// Publishes one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written. The session stops.
    fn report(&mut self, record: &Record) -> io::Result<()>;
}

/// A [`Reporter`] that writes one line per record to any [`Write`] implementation.
///
/// # Examples
///
/// ```
/// use framebench::{Error, Outcome, Record, Reporter, WriteReporter};
///
/// let mut reporter = WriteReporter::new(Vec::new());
/// let record = Record::new(
///     "run",
///     "lz4_flex_block",
///     1,
///     1,
///     Outcome::Failed(Error::Configuration {
///         problem: "bad".to_string(),
///     }),
/// );
///
/// reporter.report(&record).unwrap();
///
/// let written = String::from_utf8(reporter.into_inner()).unwrap();
/// assert!(written.ends_with('\n'));
/// ```
#[derive(Debug)]
pub struct WriteReporter<W> {
    writer: W,
}

impl<W: Write> WriteReporter<W> {
    /// Creates a reporter writing to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for WriteReporter<W> {
    fn report(&mut self, record: &Record) -> io::Result<()> {
        writeln!(self.writer, "{record}")?;
        self.writer.flush()
    }
}

/// Counts of what happened during a session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    measured: usize,
    failed: usize,
}

impl Summary {
    /// Counts one record.
    pub fn count(&mut self, record: &Record) {
        if record.is_measured() {
            self.measured = self.measured.saturating_add(1);
        } else {
            self.failed = self.failed.saturating_add(1);
        }
    }

    /// Number of configurations measured successfully.
    #[must_use]
    pub fn measured(&self) -> usize {
        self.measured
    }

    /// Number of configurations that could not be measured.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} configurations measured, {} failed",
            self.measured, self.failed
        )
    }
}
