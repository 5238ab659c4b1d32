// Operations backed by the zstd library through its `zstd_safe` bindings.
//
// Every variant verifies with a pool of decompression contexts, so verification rotates
// through decompression state the same way measurement rotates through compression state.

use framebench::{
    BuildContext, Error, Invocation, LevelDictionaries, Operation, OperationError, ResourcePool,
    Result, Setup, Verification,
};
use zstd::zstd_safe::{self, CCtx, CDict, CParameter, DCtx, DDict, ResetDirective};

use crate::variant::{
    ZSTD_COMPRESS, ZSTD_COMPRESS_CCTX, ZSTD_COMPRESS_USING_CDICT, ZSTD_COMPRESS2_PARAMS,
};

/// Hash table size (as a power of two) used by the advanced parameter variant.
const PARAMS_HASH_LOG: u32 = 12;

/// Chain table size (as a power of two) used by the advanced parameter variant.
const PARAMS_CHAIN_LOG: u32 = 12;

const ALLOCATION_FAILED: &str = "allocation failed";

fn zstd_error(code: usize) -> OperationError {
    OperationError::new(zstd_safe::get_error_name(code))
}

fn slot_error(pool: &str, slot: usize) -> OperationError {
    OperationError::new(format!("{pool} slot {slot} does not exist"))
}

fn supports_level(level: i32) -> bool {
    zstd::compression_level_range().contains(&level)
}

fn compression_contexts(context: &BuildContext<'_>) -> Result<ResourcePool<CCtx<'static>>> {
    ResourcePool::materialize(context.pools().compression().get(), |_| {
        CCtx::try_create().ok_or(ALLOCATION_FAILED)
    })
}

fn required_dictionary<'a>(context: &BuildContext<'a>, operation: &str) -> Result<&'a [u8]> {
    context
        .dictionary()
        .map(framebench::Dictionary::bytes)
        .ok_or_else(|| Error::Configuration {
            problem: format!("{operation} requires a dictionary"),
        })
}

/// Decompresses the output of any zstd variant into the check buffer.
#[derive(derive_more::Debug)]
struct Decoder {
    #[debug(ignore)]
    contexts: ResourcePool<DCtx<'static>>,

    #[debug(ignore)]
    dictionary: Option<DDict<'static>>,
}

impl Decoder {
    fn new(context: &BuildContext<'_>, dictionary: Option<&[u8]>) -> Result<Self> {
        let contexts = ResourcePool::materialize(context.pools().decompression().get(), |_| {
            DCtx::try_create().ok_or(ALLOCATION_FAILED)
        })?;

        let dictionary = dictionary
            .map(|bytes| {
                DDict::try_create(bytes).ok_or_else(|| Error::ResourceInit {
                    resource: "zstd decompression dictionary".to_string(),
                    problem: ALLOCATION_FAILED.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            contexts,
            dictionary,
        })
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        let slot = verification.slots.decompression;
        let context = self
            .contexts
            .get_mut(slot)
            .ok_or_else(|| slot_error("decompression context", slot))?;

        let decoded = match &self.dictionary {
            Some(dictionary) => context.decompress_using_ddict(
                &mut *verification.scratch,
                verification.output,
                dictionary,
            ),
            None => context.decompress(&mut *verification.scratch, verification.output),
        }
        .map_err(zstd_error)?;

        Ok(verification.matches_original(decoded))
    }
}

/// One-shot `compress()` that creates its own context on every call.
#[derive(Debug)]
pub(crate) struct Compress {
    decoder: Decoder,
}

impl Compress {
    pub(crate) fn new(context: &BuildContext<'_>) -> Result<Self> {
        Ok(Self {
            decoder: Decoder::new(context, None)?,
        })
    }
}

impl Operation for Compress {
    fn name(&self) -> &str {
        ZSTD_COMPRESS
    }

    fn supports_level(&self, level: i32) -> bool {
        supports_level(level)
    }

    fn output_bound(&self, input_len: usize) -> usize {
        zstd_safe::compress_bound(input_len)
    }

    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError> {
        zstd_safe::compress(invocation.output, invocation.input, invocation.level)
            .map_err(zstd_error)
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        self.decoder.verify(verification)
    }
}

/// `CCtx::compress()` on a rotating pool of compression contexts.
#[derive(derive_more::Debug)]
pub(crate) struct CompressCctx {
    #[debug(ignore)]
    contexts: ResourcePool<CCtx<'static>>,

    decoder: Decoder,
}

impl CompressCctx {
    pub(crate) fn new(context: &BuildContext<'_>) -> Result<Self> {
        Ok(Self {
            contexts: compression_contexts(context)?,
            decoder: Decoder::new(context, None)?,
        })
    }
}

impl Operation for CompressCctx {
    fn name(&self) -> &str {
        ZSTD_COMPRESS_CCTX
    }

    fn supports_level(&self, level: i32) -> bool {
        supports_level(level)
    }

    fn output_bound(&self, input_len: usize) -> usize {
        zstd_safe::compress_bound(input_len)
    }

    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError> {
        let slot = invocation.slots.compression;
        let context = self
            .contexts
            .get_mut(slot)
            .ok_or_else(|| slot_error("compression context", slot))?;

        context
            .compress(invocation.output, invocation.input, invocation.level)
            .map_err(zstd_error)
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        self.decoder.verify(verification)
    }
}

/// `CCtx::compress_using_cdict()` with a rotating pool of digested dictionaries per level.
#[derive(derive_more::Debug)]
pub(crate) struct CompressUsingCdict {
    #[debug(ignore)]
    contexts: ResourcePool<CCtx<'static>>,

    #[debug(ignore)]
    dictionaries: LevelDictionaries<CDict<'static>>,

    decoder: Decoder,
}

impl CompressUsingCdict {
    pub(crate) fn new(context: &BuildContext<'_>) -> Result<Self> {
        let dictionary = required_dictionary(context, ZSTD_COMPRESS_USING_CDICT)?;

        let dictionaries = LevelDictionaries::materialize(
            context.levels(),
            context.pools().dictionaries().get(),
            |level, _| CDict::try_create(dictionary, level).ok_or(ALLOCATION_FAILED),
        )?;

        Ok(Self {
            contexts: compression_contexts(context)?,
            dictionaries,
            decoder: Decoder::new(context, Some(dictionary))?,
        })
    }
}

impl Operation for CompressUsingCdict {
    fn name(&self) -> &str {
        ZSTD_COMPRESS_USING_CDICT
    }

    fn supports_level(&self, level: i32) -> bool {
        supports_level(level) && self.dictionaries.contains_level(level)
    }

    fn output_bound(&self, input_len: usize) -> usize {
        zstd_safe::compress_bound(input_len)
    }

    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError> {
        let slots = invocation.slots;

        let dictionary = self
            .dictionaries
            .get(invocation.level, slots.dictionary)
            .ok_or_else(|| slot_error("dictionary", slots.dictionary))?;

        let context = self
            .contexts
            .get_mut(slots.compression)
            .ok_or_else(|| slot_error("compression context", slots.compression))?;

        context
            .compress_using_cdict(invocation.output, invocation.input, dictionary)
            .map_err(zstd_error)
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        self.decoder.verify(verification)
    }
}

/// `CCtx::compress2()` on contexts whose parameters are set once, during setup.
///
/// Setup resets each context, applies the level plus small hash and chain tables, and loads
/// the dictionary when one is available.
#[derive(derive_more::Debug)]
pub(crate) struct Compress2Params {
    #[debug(ignore)]
    contexts: ResourcePool<CCtx<'static>>,

    #[debug(ignore)]
    dictionary: Option<Box<[u8]>>,

    decoder: Decoder,
}

impl Compress2Params {
    pub(crate) fn new(context: &BuildContext<'_>) -> Result<Self> {
        let dictionary = context.dictionary().map(framebench::Dictionary::bytes);

        Ok(Self {
            contexts: compression_contexts(context)?,
            dictionary: dictionary.map(Box::from),
            decoder: Decoder::new(context, dictionary)?,
        })
    }
}

impl Operation for Compress2Params {
    fn name(&self) -> &str {
        ZSTD_COMPRESS2_PARAMS
    }

    fn supports_level(&self, level: i32) -> bool {
        supports_level(level)
    }

    fn output_bound(&self, input_len: usize) -> usize {
        zstd_safe::compress_bound(input_len)
    }

    fn setup(&mut self, setup: Setup) -> std::result::Result<(), OperationError> {
        let slot = setup.slots.compression;
        let context = self
            .contexts
            .get_mut(slot)
            .ok_or_else(|| slot_error("compression context", slot))?;

        context
            .reset(ResetDirective::SessionAndParameters)
            .map_err(zstd_error)?;
        context
            .set_parameter(CParameter::CompressionLevel(setup.level))
            .map_err(zstd_error)?;
        context
            .set_parameter(CParameter::HashLog(PARAMS_HASH_LOG))
            .map_err(zstd_error)?;
        context
            .set_parameter(CParameter::ChainLog(PARAMS_CHAIN_LOG))
            .map_err(zstd_error)?;

        if let Some(dictionary) = &self.dictionary {
            context.load_dictionary(dictionary).map_err(zstd_error)?;
        }

        Ok(())
    }

    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError> {
        let slot = invocation.slots.compression;
        let context = self
            .contexts
            .get_mut(slot)
            .ok_or_else(|| slot_error("compression context", slot))?;

        context
            .compress2(invocation.output, invocation.input)
            .map_err(zstd_error)
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        self.decoder.verify(verification)
    }
}
