#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Compression library calls packaged as [`framebench`] operations.
//!
//! Each [`Variant`] names one way of calling one library:
//!
//! | Variant | Library | Per-call state |
//! |---------|---------|----------------|
//! | `zstd_compress` | zstd | none, the library creates a context per call |
//! | `zstd_compress_cctx` | zstd | rotating compression contexts |
//! | `zstd_compress_using_cdict` | zstd | rotating contexts and per-level digested dictionaries |
//! | `zstd_compress2_params` | zstd | rotating contexts with parameters applied during setup |
//! | `lz4_flex_block` | `lz4_flex` | none |
//! | `lz4_flex_block_dict` | `lz4_flex` | none, compresses against the raw dictionary |
//! | `lz4_flex_frame` | `lz4_flex` | none |
//! | `deflate_raw` | `flate2` | rotating compressors, rebuilt for the level during setup |
//! | `deflate_zlib` | `flate2` | rotating compressors, rebuilt for the level during setup |
//!
//! Every variant verifies by decompressing the final output with the same library.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use framebench::{BuildContext, Corpus, OperationFactory, RunConfig, Sample, run};
//! use framebench_codecs::Variant;
//!
//! let corpus = Corpus::new([Sample::new("text", b"to be or not to be ".repeat(100)).unwrap()])
//!     .unwrap();
//! let config = RunConfig::builder()
//!     .level(3)
//!     .contexts(2)
//!     .target_duration(Duration::from_millis(1))
//!     .build()
//!     .unwrap();
//!
//! let mut operation = Variant::ZstdCompressCctx
//!     .build(&BuildContext::new(config.pools(), 3..=3, None))
//!     .unwrap();
//!
//! let measurement = run(operation.as_mut(), &config, &corpus).unwrap();
//!
//! assert!(measurement.is_verified());
//! assert!(measurement.total_output_bytes() < measurement.total_input_bytes());
//! ```

mod deflate;
mod lz4;
mod variant;
mod zstd;

pub use variant::Variant;
