#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Command-line front end of `framebench`.
//!
//! The `framebench` binary has two subcommands:
//!
//! * `run` measures codec variants over a corpus and prints one record per configuration.
//! * `compare` pairs the records of two earlier runs and prints speed and ratio deltas.
//!
//! Records go to stdout, diagnostics go to stderr, so the output of `run` can be redirected
//! to a file and later fed to `compare`.

use std::fs;
use std::io::Write;
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::time::Duration;

use argh::FromArgs;
use framebench::{
    Comparison, Corpus, DEFAULT_INITIAL_REPETITIONS, DEFAULT_LABEL, DEFAULT_TARGET_DURATION,
    Dictionary, Driver, DriverConfig, Error, Result, RunConfig, Summary, WriteReporter,
    parse_duration,
};
use framebench_codecs::Variant;
use tracing::level_filters::LevelFilter;

/// Measures and compares the throughput of compression library calls.
#[derive(Debug, FromArgs)]
pub struct Args {
    /// what to do
    #[argh(subcommand)]
    pub command: Command,
}

/// The subcommands of the binary.
#[derive(Debug, FromArgs)]
#[argh(subcommand)]
#[non_exhaustive]
pub enum Command {
    /// Measure a benchmark session.
    Run(RunArgs),

    /// Compare the reports of two sessions.
    Compare(CompareArgs),
}

/// Measure codec variants over a corpus, printing one record per configuration.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "run")]
pub struct RunArgs {
    /// corpus file, or directory with one sample per file
    #[argh(option, short = 'i')]
    pub input: PathBuf,

    /// dictionary file for the variants that use one
    #[argh(option, short = 'D')]
    pub dictionary: Option<PathBuf>,

    /// first compression level to measure (default 1)
    #[argh(option, short = 'b', default = "1")]
    pub begin_level: i32,

    /// last compression level to measure (default: the first level)
    #[argh(option, short = 'e')]
    pub end_level: Option<i32>,

    /// label that starts every record (default "framebench")
    #[argh(option, short = 'l', default = "DEFAULT_LABEL.to_string()")]
    pub label: String,

    /// minimum measurement time per configuration, e.g. 25ms, 2s, 1m (default 25ms)
    #[argh(
        option,
        short = 't',
        default = "DEFAULT_TARGET_DURATION",
        from_str_fn(duration)
    )]
    pub target: Duration,

    /// number of calls in the first batch (default 4)
    #[argh(option, short = 'n', default = "DEFAULT_INITIAL_REPETITIONS.get()")]
    pub initial_repetitions: u64,

    /// iteration number of the first call in every batch (default 0)
    #[argh(option, short = 's', default = "0")]
    pub starting_iteration: u64,

    /// truncate samples to at most this many bytes, 0 means no limit
    #[argh(option, short = 'S')]
    pub max_input_size: Option<usize>,

    /// number of compression and decompression contexts to rotate through (default 1)
    #[argh(option, short = 'c', default = "1")]
    pub contexts: usize,

    /// number of materialized dictionaries per level to rotate through (default 1)
    #[argh(option, short = 'd', default = "1")]
    pub dictionaries: usize,

    /// number of times to repeat the whole sweep (default 1)
    #[argh(option, short = 'R', default = "1")]
    pub rounds: u32,

    /// variant to measure, may be repeated (default: every variant)
    #[argh(option)]
    pub operation: Vec<Variant>,

    /// log every batch and build step
    #[argh(switch, short = 'v')]
    pub verbose: bool,
}

/// Compare the reports of a baseline and a candidate session.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "compare")]
pub struct CompareArgs {
    /// report of the baseline session
    #[argh(positional)]
    pub baseline: PathBuf,

    /// report of the candidate session
    #[argh(positional)]
    pub candidate: PathBuf,
}

fn duration(value: &str) -> std::result::Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}

impl Args {
    /// The most detailed level of diagnostics worth printing for this invocation.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        match &self.command {
            Command::Run(run) if run.verbose => LevelFilter::DEBUG,
            Command::Run(_) | Command::Compare(_) => LevelFilter::INFO,
        }
    }
}

impl RunArgs {
    /// The session configuration described by the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a count is zero or the level range is empty.
    pub fn driver_config(&self) -> Result<DriverConfig> {
        let run = RunConfig::builder()
            .contexts(self.contexts)
            .dictionaries(self.dictionaries)
            .target_duration(self.target)
            .initial_repetitions(self.initial_repetitions)
            .starting_iteration(self.starting_iteration)
            .max_input_size(self.max_input_size.filter(|size| *size != 0))
            .build()?;

        let rounds = NonZero::new(self.rounds).ok_or_else(|| Error::Configuration {
            problem: "round count must be at least 1".to_string(),
        })?;

        let end_level = self.end_level.unwrap_or(self.begin_level);

        Ok(DriverConfig::new(self.begin_level..=end_level, run)?
            .with_label(self.label.clone())
            .with_rounds(rounds))
    }

    /// The variants to measure, in the order they were given.
    #[must_use]
    pub fn variants(&self) -> Vec<Variant> {
        if self.operation.is_empty() {
            Variant::ALL.to_vec()
        } else {
            self.operation.clone()
        }
    }
}

/// Executes `args`, writing records or the comparison to `out`.
///
/// # Errors
///
/// Returns any error of the subcommand. Failures of individual configurations are reported
/// as records instead, so only problems that stop the whole session end up here.
pub fn execute(args: &Args, out: &mut dyn Write) -> Result<()> {
    match &args.command {
        Command::Run(run) => {
            let summary = run_session(run, out)?;
            tracing::info!("{summary}");
            Ok(())
        }
        Command::Compare(compare) => compare_reports(compare, out),
    }
}

/// Measures the session described by `args`, writing one record line per configuration.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for invalid arguments, [`Error::Io`] if the corpus or
/// dictionary cannot be read, and [`Error::Verification`] or [`Error::Output`] if the
/// session had to stop.
pub fn run_session(args: &RunArgs, out: &mut dyn Write) -> Result<Summary> {
    let config = args.driver_config()?;
    let corpus = Corpus::load(&args.input)?;
    let dictionary = args
        .dictionary
        .as_deref()
        .map(Dictionary::load)
        .transpose()?;

    tracing::info!(
        samples = corpus.len(),
        dictionary = dictionary.as_ref().map(Dictionary::name),
        levels = ?config.levels(),
        "loaded input"
    );

    let mut reporter = WriteReporter::new(out);
    Driver::new(config, &corpus, dictionary.as_ref()).run(&args.variants(), &mut reporter)
}

/// Compares the reports named by `args`, writing the comparison to `out`.
///
/// # Errors
///
/// Returns [`Error::Io`] if a report cannot be read, [`Error::Report`] if the reports do not
/// line up and [`Error::Output`] if the comparison cannot be written.
pub fn compare_reports(args: &CompareArgs, out: &mut dyn Write) -> Result<()> {
    let baseline = read_report(&args.baseline)?;
    let candidate = read_report(&args.candidate)?;

    let comparison = Comparison::from_logs(&baseline, &candidate)?;

    write!(out, "{comparison}").map_err(|source| Error::Output { source })
}

fn read_report(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
