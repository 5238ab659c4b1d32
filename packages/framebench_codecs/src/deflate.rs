// Operations backed by `flate2`, in raw DEFLATE and zlib-wrapped flavors.

use std::convert::Infallible;
use std::fmt::Display;

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use framebench::{
    BuildContext, Invocation, Operation, OperationError, ResourcePool, Result, Setup, Verification,
};

use crate::variant::{DEFLATE_RAW, DEFLATE_ZLIB};

const MIN_LEVEL: i32 = 0;
const MAX_LEVEL: i32 = 9;

/// Covers the zlib header and trailer plus a safety margin beyond the stored-block bound.
const OVERHEAD: usize = 13 + 6 + 64;

fn flate_error(error: impl Display) -> OperationError {
    OperationError::new(error.to_string())
}

fn slot_error(pool: &str, slot: usize) -> OperationError {
    OperationError::new(format!("{pool} slot {slot} does not exist"))
}

fn compression(level: i32) -> std::result::Result<Compression, OperationError> {
    u32::try_from(level)
        .ok()
        .filter(|level| *level <= MAX_LEVEL.unsigned_abs())
        .map(Compression::new)
        .ok_or_else(|| OperationError::new(format!("level {level} is not between 0 and 9")))
}

/// DEFLATE compression with a rotating pool of compressors.
///
/// A compressor is bound to one level for its whole life, so setup replaces every compressor
/// with one for the measured level. Each call resets the stream and compresses the whole input
/// in one step.
#[derive(Debug)]
pub(crate) struct Deflate {
    name: &'static str,
    zlib_header: bool,
    compressors: ResourcePool<Compress>,
    decompressors: ResourcePool<Decompress>,
}

impl Deflate {
    pub(crate) fn raw(context: &BuildContext<'_>) -> Result<Self> {
        Self::new(context, DEFLATE_RAW, false)
    }

    pub(crate) fn zlib(context: &BuildContext<'_>) -> Result<Self> {
        Self::new(context, DEFLATE_ZLIB, true)
    }

    fn new(context: &BuildContext<'_>, name: &'static str, zlib_header: bool) -> Result<Self> {
        let pools = context.pools();

        Ok(Self {
            name,
            zlib_header,
            compressors: ResourcePool::materialize(pools.compression().get(), |_| {
                Ok::<_, Infallible>(Compress::new(Compression::default(), zlib_header))
            })?,
            decompressors: ResourcePool::materialize(pools.decompression().get(), |_| {
                Ok::<_, Infallible>(Decompress::new(zlib_header))
            })?,
        })
    }
}

impl Operation for Deflate {
    fn name(&self) -> &str {
        self.name
    }

    fn supports_level(&self, level: i32) -> bool {
        (MIN_LEVEL..=MAX_LEVEL).contains(&level)
    }

    fn output_bound(&self, input_len: usize) -> usize {
        input_len
            .saturating_add(input_len >> 12)
            .saturating_add(input_len >> 14)
            .saturating_add(input_len >> 25)
            .saturating_add(OVERHEAD)
    }

    fn setup(&mut self, setup: Setup) -> std::result::Result<(), OperationError> {
        let slot = setup.slots.compression;
        let compressor = self
            .compressors
            .get_mut(slot)
            .ok_or_else(|| slot_error("compressor", slot))?;

        *compressor = Compress::new(compression(setup.level)?, self.zlib_header);
        Ok(())
    }

    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError> {
        let slot = invocation.slots.compression;
        let compressor = self
            .compressors
            .get_mut(slot)
            .ok_or_else(|| slot_error("compressor", slot))?;

        compressor.reset();

        let status = compressor
            .compress(invocation.input, invocation.output, FlushCompress::Finish)
            .map_err(flate_error)?;

        if status != Status::StreamEnd {
            return Err(OperationError::new("output buffer too small for the stream"));
        }

        usize::try_from(compressor.total_out()).map_err(flate_error)
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        let slot = verification.slots.decompression;
        let decompressor = self
            .decompressors
            .get_mut(slot)
            .ok_or_else(|| slot_error("decompressor", slot))?;

        decompressor.reset(self.zlib_header);

        let status = decompressor
            .decompress(
                verification.output,
                &mut *verification.scratch,
                FlushDecompress::Finish,
            )
            .map_err(flate_error)?;

        if status != Status::StreamEnd {
            return Ok(false);
        }

        let decoded = usize::try_from(decompressor.total_out()).map_err(flate_error)?;
        Ok(verification.matches_original(decoded))
    }
}
