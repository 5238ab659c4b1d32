//! Integration tests for `framebench` against the real clock and filesystem.
//!
//! The operation under test is a keyed XOR "codec": each compression context holds a call
//! counter and the key comes from a per-level materialized dictionary, which exercises every
//! kind of resource pool the engine offers.

use std::fs;
use std::num::NonZero;
use std::time::Duration;

use framebench::{
    BuildContext, Comparison, Corpus, Dictionary, Driver, DriverConfig, Error, Invocation,
    LevelDictionaries, Operation, OperationError, OperationFactory, Record, ResourcePool, Result,
    RunConfig, Setup, Verification, WriteReporter, run,
};

#[derive(Debug)]
struct KeyedXor {
    calls: ResourcePool<u64>,
    prepared: ResourcePool<Option<i32>>,
    keys: LevelDictionaries<u8>,
}

impl KeyedXor {
    fn key(&self, level: i32, slot: usize) -> std::result::Result<u8, OperationError> {
        self.keys
            .get(level, slot)
            .copied()
            .ok_or_else(|| OperationError::new(format!("no key for level {level}")))
    }
}

impl Operation for KeyedXor {
    fn name(&self) -> &str {
        "keyed_xor"
    }

    fn supports_level(&self, level: i32) -> bool {
        self.keys.contains_level(level)
    }

    fn output_bound(&self, input_len: usize) -> usize {
        input_len
    }

    fn setup(&mut self, setup: Setup) -> std::result::Result<(), OperationError> {
        let prepared = self
            .prepared
            .get_mut(setup.slots.compression)
            .ok_or_else(|| OperationError::new("compression slot out of range"))?;
        *prepared = Some(setup.level);
        Ok(())
    }

    fn invoke(&mut self, invocation: Invocation<'_>) -> std::result::Result<usize, OperationError> {
        if self.prepared.get(invocation.slots.compression) != Some(&Some(invocation.level)) {
            return Err(OperationError::new("context was not prepared for this level"));
        }

        let key = self.key(invocation.level, invocation.slots.dictionary)?;

        let output = invocation
            .output
            .get_mut(..invocation.input.len())
            .ok_or_else(|| OperationError::new("output buffer too small"))?;

        for (out, byte) in output.iter_mut().zip(invocation.input) {
            *out = byte ^ key;
        }

        let calls = self
            .calls
            .get_mut(invocation.slots.compression)
            .ok_or_else(|| OperationError::new("compression slot out of range"))?;
        *calls = calls.wrapping_add(1);

        Ok(invocation.input.len())
    }

    fn verify(
        &mut self,
        verification: Verification<'_>,
    ) -> std::result::Result<bool, OperationError> {
        let key = self.key(verification.level, verification.slots.dictionary)?;

        for (out, byte) in verification.scratch.iter_mut().zip(verification.output) {
            *out = byte ^ key;
        }

        Ok(verification.matches_original(verification.output.len()))
    }
}

#[derive(Debug)]
struct KeyedXorFactory;

impl OperationFactory for KeyedXorFactory {
    fn name(&self) -> &str {
        "keyed_xor"
    }

    fn requires_dictionary(&self) -> bool {
        true
    }

    fn build(&self, context: &BuildContext<'_>) -> Result<Box<dyn Operation>> {
        let dictionary = context.dictionary().ok_or_else(|| Error::Configuration {
            problem: "keyed_xor requires a dictionary".to_string(),
        })?;

        let seed = dictionary.bytes().first().copied().unwrap_or_default();
        let pools = context.pools();

        Ok(Box::new(KeyedXor {
            calls: ResourcePool::materialize(pools.compression().get(), |_| Ok::<_, String>(0))?,
            prepared: ResourcePool::materialize(pools.compression().get(), |_| {
                Ok::<_, String>(None)
            })?,
            keys: LevelDictionaries::materialize(
                context.levels(),
                pools.dictionaries().get(),
                |level, slot| {
                    let level = u8::try_from(level.rem_euclid(256)).map_err(|e| e.to_string())?;
                    let slot = u8::try_from(slot % 256).map_err(|e| e.to_string())?;
                    Ok::<_, String>((seed ^ level ^ slot.wrapping_mul(31)) | 1)
                },
            )?,
        }))
    }
}

fn write_corpus(dir: &std::path::Path) {
    fs::write(dir.join("01-text"), "the quick brown fox jumps over the lazy dog ".repeat(64))
        .unwrap();
    fs::write(dir.join("02-binary"), (0..=255_u8).cycle().take(3000).collect::<Vec<_>>()).unwrap();
    fs::write(dir.join("03-empty"), b"").unwrap();
}

#[test]
fn run_measures_for_at_least_target_duration() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let corpus = Corpus::load(dir.path()).unwrap();
    assert_eq!(corpus.len(), 2);

    let dictionary = Dictionary::new("key", vec![0x5A]);
    let config = RunConfig::builder()
        .level(3)
        .contexts(4)
        .dictionaries(2)
        .target_duration(Duration::from_millis(5))
        .build()
        .unwrap();

    let mut operation = KeyedXorFactory
        .build(&BuildContext::new(config.pools(), 1..=3, Some(&dictionary)))
        .unwrap();

    let measurement = run(operation.as_mut(), &config, &corpus).unwrap();

    assert!(measurement.is_verified());
    assert!(measurement.elapsed() >= Duration::from_millis(5));
    assert!(measurement.total_repetitions() >= 4);
    assert_eq!(
        measurement.total_input_bytes(),
        measurement.total_output_bytes()
    );
    assert!(measurement.megabytes_per_second() > 0.0);
}

#[test]
fn driver_output_compares_against_itself() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let corpus = Corpus::load(dir.path()).unwrap();

    let dictionary_path = dir.path().join("dictionary");
    fs::write(&dictionary_path, [0x42, 0x17]).unwrap();
    let dictionary = Dictionary::load(&dictionary_path).unwrap();

    let run_config = RunConfig::builder()
        .contexts(2)
        .target_duration(Duration::from_micros(200))
        .build()
        .unwrap();

    let session = |label: &str| {
        let config = DriverConfig::new(-1..=2, run_config.clone())
            .unwrap()
            .with_label(label)
            .with_rounds(NonZero::new(2).unwrap());

        let mut reporter = WriteReporter::new(Vec::new());
        let summary = Driver::new(config, &corpus, Some(&dictionary))
            .run(&[KeyedXorFactory], &mut reporter)
            .unwrap();

        assert_eq!(summary.measured(), 8);
        assert_eq!(summary.failed(), 0);

        String::from_utf8(reporter.into_inner()).unwrap()
    };

    let baseline = session("dev");
    let candidate = session("exp");

    for line in baseline.lines() {
        let record = Record::parse(line).unwrap();
        assert_eq!(record.label(), "dev");
        assert_eq!(record.contexts(), 2);
    }

    let comparison = Comparison::from_logs(&baseline, &candidate).unwrap();

    assert_eq!(comparison.pairs().len(), 8);
    assert_eq!(comparison.summaries().len(), 4);
    assert!(
        comparison
            .pairs()
            .iter()
            .all(|pair| pair.ratio_delta().abs() < 1e-9)
    );
    assert!(comparison.summaries().iter().all(|summary| summary.pairs() == 2));
}

#[test]
fn driver_skips_dictionary_operation_without_dictionary() {
    let corpus = Corpus::new([framebench::Sample::new("one", b"x".to_vec()).unwrap()]).unwrap();
    let config = DriverConfig::new(1..=1, RunConfig::default()).unwrap();

    let mut reporter = WriteReporter::new(Vec::new());
    let summary = Driver::new(config, &corpus, None)
        .run(&[KeyedXorFactory], &mut reporter)
        .unwrap();

    assert_eq!(summary.measured(), 0);
    assert!(reporter.into_inner().is_empty());
}
