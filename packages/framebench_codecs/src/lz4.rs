// Operations backed by the pure Rust `lz4_flex` implementation of LZ4.

use std::fmt::Display;
use std::io::{Read, Write};

use framebench::{BuildContext, Error, Invocation, Operation, OperationError, Result, Verification};
use lz4_flex::block;
use lz4_flex::frame::{BlockMode, FrameDecoder, FrameEncoder, FrameInfo};

use crate::variant::{LZ4_FLEX_BLOCK, LZ4_FLEX_BLOCK_DICT, LZ4_FLEX_FRAME};

/// Frame header, block size prefixes and end mark fit in this, beyond the compressed blocks.
const FRAME_OVERHEAD: usize = 64;

/// Block size used by the default frame configuration.
const FRAME_BLOCK_SIZE: usize = 64 * 1024;

/// The largest frame the encoder can produce for `input_len` bytes of input.
fn frame_bound(input_len: usize) -> usize {
    let blocks = input_len.div_ceil(FRAME_BLOCK_SIZE).max(1);

    block::get_maximum_output_size(input_len)
        .saturating_add(blocks.saturating_mul(size_of::<u32>()))
        .saturating_add(FRAME_OVERHEAD)
}

fn lz4_error(error: impl Display) -> OperationError {
    OperationError::new(error.to_string())
}

/// Raw LZ4 blocks, optionally compressed against a dictionary.
///
/// LZ4 has a single compression mode, so every level measures the same thing. Levels are still
/// accepted so that reports line up with the other libraries.
#[derive(derive_more::Debug)]
pub(crate) struct Block {
    name: &'static str,

    #[debug(ignore)]
    dictionary: Option<Box<[u8]>>,
}

impl Block {
    pub(crate) fn new() -> Self {
        Self {
            name: LZ4_FLEX_BLOCK,
            dictionary: None,
        }
    }

    pub(crate) fn with_dictionary(context: &BuildContext<'_>) -> Result<Self> {
        let dictionary = context.dictionary().ok_or_else(|| Error::Configuration {
            problem: format!("{LZ4_FLEX_BLOCK_DICT} requires a dictionary"),
        })?;

        Ok(Self {
            name: LZ4_FLEX_BLOCK_DICT,
            dictionary: Some(Box::from(dictionary.bytes())),
        })
    }
}

impl Operation for Block {
    fn name(&self) -> &str {
        self.name
    }

    fn output_bound(&self, input_len: usize) -> usize {
        block::get_maximum_output_size(input_len)
    }

    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError> {
        match &self.dictionary {
            Some(dictionary) => {
                block::compress_into_with_dict(invocation.input, invocation.output, dictionary)
            }
            None => block::compress_into(invocation.input, invocation.output),
        }
        .map_err(lz4_error)
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        let decoded = match &self.dictionary {
            Some(dictionary) => block::decompress_into_with_dict(
                verification.output,
                &mut *verification.scratch,
                dictionary,
            ),
            None => block::decompress_into(verification.output, &mut *verification.scratch),
        }
        .map_err(lz4_error)?;

        Ok(verification.matches_original(decoded))
    }
}

/// The LZ4 frame format with independent blocks and the content size in the header.
#[derive(Debug)]
pub(crate) struct Frame;

impl Operation for Frame {
    fn name(&self) -> &str {
        LZ4_FLEX_FRAME
    }

    fn output_bound(&self, input_len: usize) -> usize {
        frame_bound(input_len)
    }

    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError> {
        let capacity = invocation.output.len();
        let content_size = u64::try_from(invocation.input.len()).map_err(lz4_error)?;

        let info = FrameInfo::new()
            .content_size(Some(content_size))
            .block_mode(BlockMode::Independent);

        let mut encoder = FrameEncoder::with_frame_info(info, invocation.output);
        encoder.write_all(invocation.input).map_err(lz4_error)?;
        let remaining = encoder.finish().map_err(lz4_error)?.len();

        capacity
            .checked_sub(remaining)
            .ok_or_else(|| OperationError::new("frame encoder reported more space than it had"))
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        let mut decoder = FrameDecoder::new(verification.output);
        let mut decoded = 0;

        loop {
            let Some(remaining) = verification.scratch.get_mut(decoded..) else {
                break;
            };

            if remaining.is_empty() {
                // Anything left in the frame means the output is longer than the original.
                let mut probe = [0_u8; 1];
                if decoder.read(&mut probe).map_err(lz4_error)? > 0 {
                    return Ok(false);
                }
                break;
            }

            match decoder.read(remaining).map_err(lz4_error)? {
                0 => break,
                read => decoded = decoded.saturating_add(read),
            }
        }

        Ok(verification.matches_original(decoded))
    }
}
