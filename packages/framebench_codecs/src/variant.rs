use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use framebench::{BuildContext, Error, Operation, OperationFactory, Result};

use crate::{deflate, lz4, zstd};

pub(crate) const ZSTD_COMPRESS: &str = "zstd_compress";
pub(crate) const ZSTD_COMPRESS_CCTX: &str = "zstd_compress_cctx";
pub(crate) const ZSTD_COMPRESS_USING_CDICT: &str = "zstd_compress_using_cdict";
pub(crate) const ZSTD_COMPRESS2_PARAMS: &str = "zstd_compress2_params";
pub(crate) const LZ4_FLEX_BLOCK: &str = "lz4_flex_block";
pub(crate) const LZ4_FLEX_BLOCK_DICT: &str = "lz4_flex_block_dict";
pub(crate) const LZ4_FLEX_FRAME: &str = "lz4_flex_frame";
pub(crate) const DEFLATE_RAW: &str = "deflate_raw";
pub(crate) const DEFLATE_ZLIB: &str = "deflate_zlib";

/// Every compression call this package knows how to measure.
///
/// A variant is an [`OperationFactory`], so a list of variants can be handed straight to
/// [`framebench::Driver::run()`]. Variants parse from and display as their stable name.
///
/// # Examples
///
/// ```
/// use framebench::OperationFactory;
/// use framebench_codecs::Variant;
///
/// let variant: Variant = "zstd_compress_cctx".parse().unwrap();
///
/// assert_eq!(variant, Variant::ZstdCompressCctx);
/// assert_eq!(variant.name(), "zstd_compress_cctx");
/// assert!(!variant.requires_dictionary());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Variant {
    /// One-shot zstd compression that creates a context per call.
    ZstdCompress,

    /// zstd compression with a reused compression context.
    ZstdCompressCctx,

    /// zstd compression with a reused context and a pre-digested dictionary per level.
    ZstdCompressUsingCdict,

    /// zstd streaming API compression with parameters (and dictionary, if any) applied once.
    ZstdCompress2Params,

    /// A raw LZ4 block.
    Lz4FlexBlock,

    /// A raw LZ4 block compressed against the dictionary.
    Lz4FlexBlockDict,

    /// An LZ4 frame with independent blocks.
    Lz4FlexFrame,

    /// A raw DEFLATE stream.
    DeflateRaw,

    /// A DEFLATE stream with zlib header and checksum.
    DeflateZlib,
}

impl Variant {
    /// Every variant, in reporting order.
    pub const ALL: [Self; 9] = [
        Self::ZstdCompress,
        Self::ZstdCompressCctx,
        Self::ZstdCompressUsingCdict,
        Self::ZstdCompress2Params,
        Self::Lz4FlexBlock,
        Self::Lz4FlexBlockDict,
        Self::Lz4FlexFrame,
        Self::DeflateRaw,
        Self::DeflateZlib,
    ];

    /// The stable name used in reports and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZstdCompress => ZSTD_COMPRESS,
            Self::ZstdCompressCctx => ZSTD_COMPRESS_CCTX,
            Self::ZstdCompressUsingCdict => ZSTD_COMPRESS_USING_CDICT,
            Self::ZstdCompress2Params => ZSTD_COMPRESS2_PARAMS,
            Self::Lz4FlexBlock => LZ4_FLEX_BLOCK,
            Self::Lz4FlexBlockDict => LZ4_FLEX_BLOCK_DICT,
            Self::Lz4FlexFrame => LZ4_FLEX_FRAME,
            Self::DeflateRaw => DEFLATE_RAW,
            Self::DeflateZlib => DEFLATE_ZLIB,
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.as_str() == s)
            .ok_or_else(|| {
                let known = Self::ALL.map(Self::as_str).join(", ");

                Error::Configuration {
                    problem: format!("unknown operation '{s}' (known operations: {known})"),
                }
            })
    }
}

impl OperationFactory for Variant {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn requires_dictionary(&self) -> bool {
        matches!(self, Self::ZstdCompressUsingCdict | Self::Lz4FlexBlockDict)
    }

    fn build(&self, context: &BuildContext<'_>) -> Result<Box<dyn Operation>> {
        tracing::debug!(operation = self.as_str(), pools = ?context.pools(), "building operation");

        let operation: Box<dyn Operation> = match self {
            Self::ZstdCompress => Box::new(zstd::Compress::new(context)?),
            Self::ZstdCompressCctx => Box::new(zstd::CompressCctx::new(context)?),
            Self::ZstdCompressUsingCdict => Box::new(zstd::CompressUsingCdict::new(context)?),
            Self::ZstdCompress2Params => Box::new(zstd::Compress2Params::new(context)?),
            Self::Lz4FlexBlock => Box::new(lz4::Block::new()),
            Self::Lz4FlexBlockDict => Box::new(lz4::Block::with_dictionary(context)?),
            Self::Lz4FlexFrame => Box::new(lz4::Frame),
            Self::DeflateRaw => Box::new(deflate::Deflate::raw(context)?),
            Self::DeflateZlib => Box::new(deflate::Deflate::zlib(context)?),
        };

        Ok(operation)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use framebench::{Dictionary, PoolSizes};
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Variant: Send, Sync, Copy, OperationFactory);

    #[test]
    fn names_are_unique_and_parse_back() {
        for variant in Variant::ALL {
            assert_eq!(variant.to_string().parse::<Variant>().unwrap(), variant);
            assert_eq!(OperationFactory::name(&variant), variant.as_str());
        }

        let mut names = Variant::ALL.map(Variant::as_str).to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Variant::ALL.len());
    }

    #[test]
    fn unknown_name_lists_known_ones() {
        let error = "brotli".parse::<Variant>().unwrap_err();

        assert!(matches!(error, Error::Configuration { .. }));
        assert!(error.to_string().contains("brotli"));
        assert!(error.to_string().contains(DEFLATE_ZLIB));
    }

    #[test]
    fn dictionary_variants() {
        let requiring: Vec<_> = Variant::ALL
            .into_iter()
            .filter(OperationFactory::requires_dictionary)
            .collect();

        assert_eq!(
            requiring,
            [Variant::ZstdCompressUsingCdict, Variant::Lz4FlexBlockDict]
        );
    }

    #[test]
    fn builds_operation_with_matching_name() {
        let dictionary = Dictionary::new("dict", b"some dictionary content".to_vec());
        let context = BuildContext::new(PoolSizes::default(), 1..=2, Some(&dictionary));

        for variant in Variant::ALL {
            let operation = variant.build(&context).unwrap();
            assert_eq!(operation.name(), variant.as_str());
        }
    }
}
