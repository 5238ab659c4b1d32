#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adaptive-duration measurement engine for comparing the throughput of interchangeable data
//! transformations, such as the compression routines of different libraries.
//!
//! The core functionality includes:
//! - [`run()`] - Measures one [`Operation`] under one [`RunConfig`], doubling the number of
//!   calls until a target duration is reached, then verifying the last output
//! - [`ResourcePool`] - Rotates calls through a fixed set of pre-built mutable resources
//! - [`LevelDictionaries`] - Rotating pools of level-specific materialized dictionaries
//! - [`Driver`] - Sweeps operation variants over compression levels and reports a [`Record`]
//!   per configuration
//! - [`Comparison`] - Pairs the records of two runs and computes speed and ratio deltas
//!
//! This package is not meant for use in production, serving only as a development tool for
//! benchmarking and performance analysis.
//!
//! # Operating Principles
//!
//! ## Batches
//!
//! The clock is read once per batch, never per call. The first batch has
//! [`initial_repetitions`][RunConfig::initial_repetitions] calls and every following batch is as
//! large as all previous batches combined. Measurement ends after the first batch that brings
//! the elapsed time to the target, so overshoot is bounded by one batch.
//!
//! ## Resource rotation
//!
//! Call `i` of a batch uses slot `i mod size` of every resource pool and sample
//! `i mod corpus.len()` of the input corpus. Every batch restarts from the same starting
//! iteration, so all batches touch the same resources in the same order.
//!
//! ## Verification
//!
//! Only the output of the final call is checked, after timing ends, so the check never
//! distorts the measurement. A failed check is a [`Error::Verification`] carrying the
//! measurement that was gathered.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use framebench::{
//!     Corpus, Invocation, Operation, OperationError, RunConfig, Sample, Verification, run,
//! };
//!
//! /// Copies its input, the simplest possible transformation.
//! #[derive(Debug)]
//! struct Identity;
//!
//! impl Operation for Identity {
//!     fn name(&self) -> &str {
//!         "copy"
//!     }
//!
//!     fn output_bound(&self, input_len: usize) -> usize {
//!         input_len
//!     }
//!
//!     fn invoke(&mut self, invocation: Invocation<'_>) -> Result<usize, OperationError> {
//!         let output = invocation
//!             .output
//!             .get_mut(..invocation.input.len())
//!             .ok_or_else(|| OperationError::new("output buffer too small"))?;
//!         output.copy_from_slice(invocation.input);
//!         Ok(invocation.input.len())
//!     }
//!
//!     fn verify(&mut self, verification: Verification<'_>) -> Result<bool, OperationError> {
//!         Ok(verification.output == verification.original)
//!     }
//! }
//!
//! # fn main() {
//! let corpus = Corpus::new([Sample::new("hello", b"hello world".to_vec()).unwrap()]).unwrap();
//! let config = RunConfig::builder()
//!     .target_duration(Duration::from_millis(1))
//!     .build()
//!     .unwrap();
//!
//! let measurement = run(&mut Identity, &config, &corpus).unwrap();
//!
//! assert!(measurement.is_verified());
//! println!("{:.2} MB/s", measurement.megabytes_per_second());
//! # }
//! ```

mod compare;
mod config;
mod corpus;
mod dictionary;
mod driver;
mod error;
mod measurement;
mod operation;
mod pal;
mod pool;
mod record;
mod timing;

pub use compare::*;
pub use config::*;
pub use corpus::{Corpus, Sample};
pub use dictionary::*;
pub use driver::*;
pub use error::*;
pub use measurement::*;
pub use operation::*;
pub use pool::{ResourcePool, slot_for};
pub use record::*;
pub use timing::run;
