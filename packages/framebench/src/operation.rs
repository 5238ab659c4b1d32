use std::fmt::Debug;
use std::ops::RangeInclusive;

use crate::{Dictionary, OperationError, PoolSizes, Result, Slots};

/// One transformation under test, such as a specific compression call of a specific library.
///
/// The timing loop drives an operation through three capabilities:
///
/// 1. [`setup()`][Self::setup] (optional) prepares every pool slot before timing starts.
/// 2. [`invoke()`][Self::invoke] performs exactly one measured call.
/// 3. [`verify()`][Self::verify] checks the output of the final measured call. It is never
///    timed.
///
/// The operation owns its resource pools. The timing loop decides which slot of each pool a
/// call uses and passes the indexes in [`Slots`].
pub trait Operation: Debug {
    /// Stable name of the operation, used in reports.
    fn name(&self) -> &str;

    /// Whether the operation can be measured at `level`.
    ///
    /// The default accepts every level, which suits operations that ignore the level.
    fn supports_level(&self, level: i32) -> bool {
        let _ = level;
        true
    }

    /// The largest output [`invoke()`][Self::invoke] may produce for an input of `input_len`
    /// bytes. The output buffer is sized from this once, before timing starts.
    fn output_bound(&self, input_len: usize) -> usize;

    /// Prepares the pool slots named in `setup` for measuring at `setup.level`.
    ///
    /// Called once per slot before timing starts. The default does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be prepared. The run is abandoned before timing.
    fn setup(&mut self, setup: Setup) -> std::result::Result<(), OperationError> {
        let _ = setup;
        Ok(())
    }

    /// Performs one measured call, writing into `invocation.output`.
    ///
    /// Returns the number of bytes written. Inputs are never empty, so a successful call
    /// always produces output; returning zero is treated as a failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails. The run is abandoned immediately.
    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError>;

    /// Checks the output of the final measured call by reversing the transformation into
    /// `verification.scratch` and comparing with `verification.original`.
    ///
    /// Returns whether the output is correct.
    ///
    /// # Errors
    ///
    /// Returns an error if the check itself cannot be performed, for example because the
    /// output cannot be decoded. This counts as a failed check.
    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError>;
}

/// Arguments of [`Operation::setup()`].
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct Setup {
    /// The slots to prepare.
    pub slots: Slots,

    /// The level the following measurement uses.
    pub level: i32,
}

impl Setup {
    /// Creates the arguments of a setup call. The timing loop does this for you; this
    /// constructor exists for exercising operations directly, e.g. in tests.
    #[must_use]
    pub fn new(slots: Slots, level: i32) -> Self {
        Self { slots, level }
    }
}

/// Arguments of [`Operation::invoke()`].
#[derive(Debug)]
#[non_exhaustive]
pub struct Invocation<'a> {
    /// The iteration number of this call.
    pub iteration: u64,

    /// The pool slots this call uses.
    pub slots: Slots,

    /// The level to measure.
    pub level: i32,

    /// The input sample, already truncated to the configured maximum size.
    pub input: &'a [u8],

    /// The output buffer, at least [`Operation::output_bound()`] bytes long.
    pub output: &'a mut [u8],
}

/// Arguments of [`Operation::verify()`].
#[derive(Debug)]
#[non_exhaustive]
pub struct Verification<'a> {
    /// The pool slots of the final measured call.
    pub slots: Slots,

    /// The level that was measured.
    pub level: i32,

    /// What the final measured call produced.
    pub output: &'a [u8],

    /// The input of the final measured call.
    pub original: &'a [u8],

    /// A buffer at least as long as `original`, filled with `0xFF`, to reverse the
    /// transformation into.
    pub scratch: &'a mut [u8],
}

impl<'a> Invocation<'a> {
    /// Creates the arguments of one call. The timing loop does this for you; this constructor
    /// exists for exercising operations directly, e.g. in tests.
    #[must_use]
    pub fn new(
        iteration: u64,
        slots: Slots,
        level: i32,
        input: &'a [u8],
        output: &'a mut [u8],
    ) -> Self {
        Self {
            iteration,
            slots,
            level,
            input,
            output,
        }
    }
}

impl<'a> Verification<'a> {
    /// Creates the arguments of a check. The timing loop does this for you; this constructor
    /// exists for exercising operations directly, e.g. in tests.
    #[must_use]
    pub fn new(
        slots: Slots,
        level: i32,
        output: &'a [u8],
        original: &'a [u8],
        scratch: &'a mut [u8],
    ) -> Self {
        Self {
            slots,
            level,
            output,
            original,
            scratch,
        }
    }

    /// Whether the first `decoded_len` bytes of the scratch buffer reproduce the original
    /// input exactly.
    #[must_use]
    pub fn matches_original(&self, decoded_len: usize) -> bool {
        decoded_len == self.original.len()
            && self.scratch.get(..decoded_len) == Some(self.original)
    }
}

/// Everything an [`OperationFactory`] needs to build an operation and its resource pools.
#[derive(Clone, Copy, Debug)]
pub struct BuildContext<'a> {
    pools: PoolSizes,
    min_level: i32,
    max_level: i32,
    dictionary: Option<&'a Dictionary>,
}

impl<'a> BuildContext<'a> {
    /// Describes pools of `pools` size for measuring every level in `levels`, with an optional
    /// dictionary.
    #[must_use]
    pub fn new(
        pools: PoolSizes,
        levels: RangeInclusive<i32>,
        dictionary: Option<&'a Dictionary>,
    ) -> Self {
        Self {
            pools,
            min_level: *levels.start(),
            max_level: *levels.end(),
            dictionary,
        }
    }

    /// Sizes of the pools to create.
    #[must_use]
    pub fn pools(&self) -> PoolSizes {
        self.pools
    }

    /// Every level the operation will be measured at. Level-specific resources must cover
    /// all of them.
    #[must_use]
    pub fn levels(&self) -> RangeInclusive<i32> {
        self.min_level..=self.max_level
    }

    /// The dictionary, if one was loaded.
    #[must_use]
    pub fn dictionary(&self) -> Option<&'a Dictionary> {
        self.dictionary
    }
}

/// Builds one variant of [`Operation`] on demand.
///
/// The Driver is given a list of factories and builds each variant once per round, just
/// before measuring it, so resource construction failures only affect that variant.
pub trait OperationFactory: Debug {
    /// Stable name of the operation the factory builds.
    fn name(&self) -> &str;

    /// Whether the operation can only be built when a dictionary is available.
    fn requires_dictionary(&self) -> bool {
        false
    }

    /// Builds the operation and all its resource pools.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceInit`][crate::Error::ResourceInit] if a resource cannot be
    /// created, or [`Error::Configuration`][crate::Error::Configuration] if the context is
    /// unsuitable for the operation.
    fn build(&self, context: &BuildContext<'_>) -> Result<Box<dyn Operation>>;
}
