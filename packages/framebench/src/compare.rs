use std::collections::BTreeMap;
use std::fmt::{self, Display};

use itertools::{EitherOrBoth, Itertools};

use crate::{Error, ParsedRecord, Record, Result};

/// Side-by-side comparison of the reports of two runs over the same configurations.
///
/// Measured records are paired in the order they appear. Any other lines, such as failed
/// records, are ignored. Each pair must describe the same configuration.
///
/// # Examples
///
/// ```
/// use framebench::Comparison;
///
/// let baseline = "dev: zstd_compress @ lvl 1, 1 ctxs: 1000 B -> 400.00 B, \
///                 8 iters, 8000 ns, 1000 ns/iter, 1000.00 MB/s";
/// let candidate = "exp: zstd_compress @ lvl 1, 1 ctxs: 1000 B -> 300.00 B, \
///                  8 iters, 8000 ns, 1000 ns/iter, 1100.00 MB/s";
///
/// let comparison = Comparison::from_logs(baseline, candidate).unwrap();
/// let pair = &comparison.pairs()[0];
///
/// assert!((pair.ratio_delta() - 25.0).abs() < 1e-9);
/// assert!((pair.speed_delta() - 10.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct Comparison {
    pairs: Vec<Pair>,
    summaries: Vec<LevelSummary>,
}

impl Comparison {
    /// Compares two reports given as the full text of each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`] if a pair of records describes different configurations.
    pub fn from_logs(baseline: &str, candidate: &str) -> Result<Self> {
        let baseline = measured_records(baseline);
        let candidate = measured_records(candidate);

        let mut pairs = Vec::new();

        for entry in baseline.zip_longest(candidate) {
            match entry {
                EitherOrBoth::Both(baseline, candidate) => {
                    pairs.push(Pair::new(baseline, candidate)?);
                }
                EitherOrBoth::Left(record) => {
                    tracing::warn!(
                        operation = record.operation(),
                        level = record.level(),
                        "baseline record has no counterpart in candidate, ignoring"
                    );
                }
                EitherOrBoth::Right(record) => {
                    tracing::warn!(
                        operation = record.operation(),
                        level = record.level(),
                        "candidate record has no counterpart in baseline, ignoring"
                    );
                }
            }
        }

        let mut speed_deltas: BTreeMap<(&str, i32), Vec<f64>> = BTreeMap::new();

        for pair in &pairs {
            speed_deltas
                .entry((pair.baseline.operation(), pair.baseline.level()))
                .or_default()
                .push(pair.speed_delta);
        }

        let summaries = speed_deltas
            .into_iter()
            .map(|((operation, level), deltas)| LevelSummary::new(operation, level, &deltas))
            .collect();

        Ok(Self { pairs, summaries })
    }

    /// The paired records in report order.
    #[must_use]
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// Speed delta statistics per operation and level, ordered by operation and then level.
    #[must_use]
    pub fn summaries(&self) -> &[LevelSummary] {
        &self.summaries
    }
}

fn measured_records(log: &str) -> impl Iterator<Item = ParsedRecord> {
    log.lines().filter_map(|line| Record::parse(line).ok())
}

impl Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous_operation = None;

        for pair in &self.pairs {
            let operation = pair.baseline.operation();

            if previous_operation.is_some_and(|previous| previous != operation) {
                writeln!(f)?;
            }
            previous_operation = Some(operation);

            writeln!(f, "{pair}")?;
        }

        if !self.summaries.is_empty() {
            writeln!(f)?;
        }

        for summary in &self.summaries {
            writeln!(f, "{summary}")?;
        }

        Ok(())
    }
}

/// One configuration as measured by both runs.
#[derive(Clone, Debug)]
pub struct Pair {
    baseline: ParsedRecord,
    candidate: ParsedRecord,
    ratio_delta: f64,
    speed_delta: f64,
}

impl Pair {
    fn new(baseline: ParsedRecord, candidate: ParsedRecord) -> Result<Self> {
        let mismatch = |what: &str| {
            Error::report(
                format!("{} @ lvl {}", candidate.operation(), candidate.level()),
                format!(
                    "{what} differs from baseline record {} @ lvl {}",
                    baseline.operation(),
                    baseline.level()
                ),
            )
        };

        if baseline.operation() != candidate.operation() {
            return Err(mismatch("operation"));
        }
        if baseline.level() != candidate.level() {
            return Err(mismatch("level"));
        }
        if baseline.contexts() != candidate.contexts() {
            return Err(mismatch("context count"));
        }
        if baseline.mean_input_size() != candidate.mean_input_size() {
            return Err(mismatch("input size"));
        }

        let ratio_delta =
            100.0 * (1.0 - candidate.mean_output_size() / baseline.mean_output_size());
        let speed_delta =
            100.0 * (candidate.megabytes_per_second() / baseline.megabytes_per_second() - 1.0);

        Ok(Self {
            baseline,
            candidate,
            ratio_delta,
            speed_delta,
        })
    }

    /// The record of the baseline run.
    #[must_use]
    pub fn baseline(&self) -> &ParsedRecord {
        &self.baseline
    }

    /// The record of the candidate run.
    #[must_use]
    pub fn candidate(&self) -> &ParsedRecord {
        &self.candidate
    }

    /// How much smaller the candidate output is, in percent. Positive is better.
    #[must_use]
    pub fn ratio_delta(&self) -> f64 {
        self.ratio_delta
    }

    /// How much faster the candidate is, in percent. Positive is better.
    #[must_use]
    pub fn speed_delta(&self) -> f64 {
        self.speed_delta
    }
}

impl Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (baseline, candidate) = (&self.baseline, &self.candidate);

        write!(
            f,
            "{} vs {}: {:<30} @ lvl {:>3}, {:>3} ctxs: {:>8} B -> {:>11.2} vs {:>11.2} B ({:>7.3}%), \
             {:>7} vs {:>7} iters, {:>7.2} vs {:>7.2} MB/s ({:>7.3}%)",
            baseline.label(),
            candidate.label(),
            baseline.operation(),
            baseline.level(),
            baseline.contexts(),
            baseline.mean_input_size(),
            baseline.mean_output_size(),
            candidate.mean_output_size(),
            self.ratio_delta,
            baseline.iterations(),
            candidate.iterations(),
            baseline.megabytes_per_second(),
            candidate.megabytes_per_second(),
            self.speed_delta
        )
    }
}

/// Speed delta statistics of every pair of one operation at one level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelSummary {
    operation: String,
    level: i32,
    pairs: usize,
    mean_speed_delta: f64,
    speed_delta_std_dev: f64,
}

impl LevelSummary {
    #[expect(
        clippy::cast_precision_loss,
        reason = "statistics are reported with limited precision anyway"
    )]
    fn new(operation: &str, level: i32, speed_deltas: &[f64]) -> Self {
        let count = speed_deltas.len() as f64;
        let mean = speed_deltas.iter().sum::<f64>() / count;
        let variance = speed_deltas
            .iter()
            .map(|delta| (delta - mean).powi(2))
            .sum::<f64>()
            / count;

        Self {
            operation: operation.to_string(),
            level,
            pairs: speed_deltas.len(),
            mean_speed_delta: mean,
            speed_delta_std_dev: variance.sqrt(),
        }
    }

    /// Name of the operation.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The compression level.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Number of pairs summarized, one per round.
    #[must_use]
    pub fn pairs(&self) -> usize {
        self.pairs
    }

    /// Mean speed delta in percent.
    #[must_use]
    pub fn mean_speed_delta(&self) -> f64 {
        self.mean_speed_delta
    }

    /// Population standard deviation of the speed deltas, in percentage points.
    #[must_use]
    pub fn speed_delta_std_dev(&self) -> f64 {
        self.speed_delta_std_dev
    }
}

impl Display for LevelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lvl {:>3} summary: {:>7.3}% ({:>7.3}% std dev over {} rounds)",
            self.operation, self.level, self.mean_speed_delta, self.speed_delta_std_dev, self.pairs
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn line(label: &str, operation: &str, level: i32, bytes_out: f64, speed: f64) -> String {
        format!(
            "{label:<19}: {operation:<30} @ lvl {level:>3},   1 ctxs: {:>8} B -> {bytes_out:>11.2} B, \
             {:>7} iters, {:>10} ns, {:>10} ns/iter, {speed:>7.2} MB/s",
            1_000, 16, 16_000, 1_000
        )
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn computes_deltas_per_pair() {
        let baseline = line("dev", "zstd_compress", 1, 500.0, 200.0);
        let candidate = line("exp", "zstd_compress", 1, 450.0, 250.0);

        let comparison = Comparison::from_logs(&baseline, &candidate).unwrap();

        assert_eq!(comparison.pairs().len(), 1);
        let pair = &comparison.pairs()[0];
        assert!(close(pair.ratio_delta(), 10.0));
        assert!(close(pair.speed_delta(), 25.0));
        assert_eq!(pair.baseline().label(), "dev");
        assert_eq!(pair.candidate().label(), "exp");
    }

    #[test]
    fn summarizes_rounds_per_operation_and_level() {
        // Two rounds over two levels. Speed deltas at level 1 are +10% and +30%.
        let baseline = [
            line("dev", "lz4_flex_block", 1, 500.0, 100.0),
            line("dev", "lz4_flex_block", 2, 500.0, 100.0),
            line("dev", "lz4_flex_block", 1, 500.0, 100.0),
            line("dev", "lz4_flex_block", 2, 500.0, 100.0),
        ]
        .join("\n");
        let candidate = [
            line("exp", "lz4_flex_block", 1, 500.0, 110.0),
            line("exp", "lz4_flex_block", 2, 500.0, 100.0),
            line("exp", "lz4_flex_block", 1, 500.0, 130.0),
            line("exp", "lz4_flex_block", 2, 500.0, 100.0),
        ]
        .join("\n");

        let comparison = Comparison::from_logs(&baseline, &candidate).unwrap();

        let summaries = comparison.summaries();
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].level(), 1);
        assert_eq!(summaries[0].pairs(), 2);
        assert!(close(summaries[0].mean_speed_delta(), 20.0));
        assert!(close(summaries[0].speed_delta_std_dev(), 10.0));

        assert_eq!(summaries[1].level(), 2);
        assert!(close(summaries[1].mean_speed_delta(), 0.0));
        assert!(close(summaries[1].speed_delta_std_dev(), 0.0));
    }

    #[test]
    fn ignores_lines_that_are_not_measured_records() {
        let baseline = format!(
            "2025-01-01T00:00:00Z INFO loaded corpus\n{}\n\
             dev                : deflate_raw                    @ lvl  10,   1 ctxs: FAILED: invalid configuration: level out of range\n",
            line("dev", "deflate_raw", 9, 300.0, 50.0)
        );
        let candidate = line("exp", "deflate_raw", 9, 300.0, 50.0);

        let comparison = Comparison::from_logs(&baseline, &candidate).unwrap();

        assert_eq!(comparison.pairs().len(), 1);
    }

    #[test]
    fn extra_records_are_ignored() {
        let baseline = [
            line("dev", "deflate_raw", 1, 300.0, 50.0),
            line("dev", "deflate_raw", 2, 300.0, 50.0),
        ]
        .join("\n");
        let candidate = line("exp", "deflate_raw", 1, 300.0, 50.0);

        let comparison = Comparison::from_logs(&baseline, &candidate).unwrap();

        assert_eq!(comparison.pairs().len(), 1);
        assert_eq!(comparison.summaries().len(), 1);
    }

    #[test]
    fn mismatched_configurations_are_rejected() {
        let baseline = line("dev", "deflate_raw", 1, 300.0, 50.0);

        for candidate in [
            line("exp", "deflate_zlib", 1, 300.0, 50.0),
            line("exp", "deflate_raw", 2, 300.0, 50.0),
        ] {
            assert!(matches!(
                Comparison::from_logs(&baseline, &candidate),
                Err(Error::Report { .. })
            ));
        }
    }

    #[test]
    fn display_groups_operations_and_appends_summary() {
        let baseline = [
            line("dev", "deflate_raw", 1, 300.0, 50.0),
            line("dev", "deflate_zlib", 1, 300.0, 50.0),
        ]
        .join("\n");
        let candidate = [
            line("exp", "deflate_raw", 1, 300.0, 55.0),
            line("exp", "deflate_zlib", 1, 300.0, 50.0),
        ]
        .join("\n");

        let rendered = Comparison::from_logs(&baseline, &candidate)
            .unwrap()
            .to_string();
        let lines = rendered.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("dev vs exp: deflate_raw"));
        assert!(lines[0].ends_with("( 10.000%)"));
        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("dev vs exp: deflate_zlib"));
        assert_eq!(lines[3], "");
        assert_eq!(
            lines[4],
            "deflate_raw lvl   1 summary:  10.000% (  0.000% std dev over 1 rounds)"
        );
    }
}
