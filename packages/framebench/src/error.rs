use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::Measurement;

/// Errors that can occur when configuring, measuring or reporting a benchmark.
///
/// The Driver recovers from [`Configuration`][Error::Configuration],
/// [`ResourceInit`][Error::ResourceInit] and [`Invocation`][Error::Invocation] by reporting
/// the failed configuration and moving on to the next one. A
/// [`Verification`][Error::Verification] failure means the measured operation produced wrong
/// output and halts the session, as does an [`Output`][Error::Output] failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A configuration value was invalid. Detected before any measurement starts.
    #[error("invalid configuration: {problem}")]
    Configuration {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// A pool slot or other long-lived resource could not be constructed or prepared.
    #[error("failed to initialize {resource}: {problem}")]
    ResourceInit {
        /// What was being initialized.
        resource: String,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// The measured operation failed while being timed. Partial statistics are discarded.
    #[error("{operation} failed on iteration {iteration}: {problem}")]
    Invocation {
        /// Name of the operation under measurement.
        operation: String,

        /// The iteration number of the failed call.
        iteration: u64,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// The measured operation completed but its output failed the correctness check.
    #[error("{operation} @ lvl {level} produced output that failed verification")]
    Verification {
        /// Name of the operation under measurement.
        operation: String,

        /// The compression level of the failed configuration.
        level: i32,

        /// The statistics gathered before the check failed, with the verified flag unset.
        measurement: Box<Measurement>,
    },

    /// Reading benchmark input from the filesystem failed.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// The path that could not be read.
        path: PathBuf,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// A record could not be handed to the reporter.
    #[error("failed to write report: {source}")]
    Output {
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A benchmark report line could not be parsed or compared.
    #[error("invalid report line '{line}': {problem}")]
    Report {
        /// The offending line.
        line: String,

        /// A human-readable description of the problem.
        problem: String,
    },
}

impl Error {
    pub(crate) fn configuration(problem: impl Into<String>) -> Self {
        Self::Configuration {
            problem: problem.into(),
        }
    }

    pub(crate) fn resource_init(resource: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::ResourceInit {
            resource: resource.into(),
            problem: problem.into(),
        }
    }

    pub(crate) fn report(line: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::Report {
            line: line.into(),
            problem: problem.into(),
        }
    }

    // I/O errors are not cloneable, so those keep their kind and message only.
    pub(crate) fn duplicate(&self) -> Self {
        match self {
            Self::Configuration { problem } => Self::configuration(problem.clone()),
            Self::ResourceInit { resource, problem } => {
                Self::resource_init(resource.clone(), problem.clone())
            }
            Self::Invocation {
                operation,
                iteration,
                problem,
            } => Self::Invocation {
                operation: operation.clone(),
                iteration: *iteration,
                problem: problem.clone(),
            },
            Self::Verification {
                operation,
                level,
                measurement,
            } => Self::Verification {
                operation: operation.clone(),
                level: *level,
                measurement: measurement.clone(),
            },
            Self::Io { path, source } => Self::Io {
                path: path.clone(),
                source: io::Error::new(source.kind(), source.to_string()),
            },
            Self::Output { source } => Self::Output {
                source: io::Error::new(source.kind(), source.to_string()),
            },
            Self::Report { line, problem } => Self::report(line.clone(), problem.clone()),
        }
    }

    /// Whether this error means the session must stop instead of moving on to the next
    /// configuration.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Verification { .. } | Self::Output { .. })
    }
}

/// A specialized `Result` type for benchmark operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

/// The error an [`Operation`][crate::Operation] returns when one of its calls fails.
///
/// Operations only describe what went wrong. The timing loop decides which [`Error`] variant
/// the failure becomes, depending on whether it happened during setup, invocation or
/// verification.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
}

impl OperationError {
    /// Creates an operation error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
