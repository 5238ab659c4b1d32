//! Integration tests that measure every codec variant through the `framebench` engine.

use std::time::Duration;

use framebench::{
    BuildContext, Corpus, Dictionary, Driver, DriverConfig, OperationFactory, Record, Reporter,
    RunConfig, Sample, run,
};
use framebench_codecs::Variant;

fn corpus() -> Corpus {
    let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor. "
        .repeat(300);
    let records: Vec<u8> = (0..4_000_u32)
        .flat_map(|i| (i % 97).to_le_bytes())
        .collect();

    Corpus::new([
        Sample::new("text", text.into_bytes()).unwrap(),
        Sample::new("records", records).unwrap(),
        Sample::new("tiny", b"tiny sample".to_vec()).unwrap(),
    ])
    .unwrap()
}

fn dictionary() -> Dictionary {
    Dictionary::new(
        "lorem",
        b"Lorem ipsum dolor sit amet, consectetur adipiscing elit".to_vec(),
    )
}

/// Keeps what the assertions need from each record.
#[derive(Debug, Default)]
struct Collect {
    records: Vec<(String, i32, bool)>,
}

impl Reporter for Collect {
    fn report(&mut self, record: &Record) -> std::io::Result<()> {
        self.records.push((
            record.operation().to_string(),
            record.level(),
            record.is_measured(),
        ));
        Ok(())
    }
}

#[test]
fn every_variant_measures_and_verifies() {
    let corpus = corpus();
    let dictionary = dictionary();

    for variant in Variant::ALL {
        for contexts in [1, 3] {
            let config = RunConfig::builder()
                .level(1)
                .contexts(contexts)
                .dictionaries(2)
                .target_duration(Duration::ZERO)
                .initial_repetitions(7)
                .build()
                .unwrap();

            let mut operation = variant
                .build(&BuildContext::new(config.pools(), 1..=1, Some(&dictionary)))
                .unwrap();

            let measurement = run(operation.as_mut(), &config, &corpus).unwrap();

            assert!(measurement.is_verified(), "{variant} with {contexts} contexts");
            assert_eq!(measurement.total_repetitions(), 7);
            assert!(measurement.total_output_bytes() > 0);
        }
    }
}

#[test]
fn truncated_inputs_verify() {
    let corpus = corpus();
    let config = RunConfig::builder()
        .max_input_size(Some(100))
        .target_duration(Duration::ZERO)
        .build()
        .unwrap();

    for variant in Variant::ALL {
        if variant.requires_dictionary() {
            continue;
        }

        let mut operation = variant
            .build(&BuildContext::new(config.pools(), 1..=1, None))
            .unwrap();

        let measurement = run(operation.as_mut(), &config, &corpus).unwrap();

        assert!(measurement.is_verified(), "{variant}");
        assert!(measurement.mean_input_size() <= 100);
    }
}

#[test]
fn session_reports_unsupported_levels_as_failures() {
    let corpus = corpus();
    let run_config = RunConfig::builder()
        .target_duration(Duration::from_micros(100))
        .build()
        .unwrap();
    let config = DriverConfig::new(9..=10, run_config).unwrap();

    let mut reporter = Collect::default();
    let summary = Driver::new(config, &corpus, None)
        .run(
            &[Variant::DeflateRaw, Variant::ZstdCompressUsingCdict],
            &mut reporter,
        )
        .unwrap();

    // Level 10 is beyond DEFLATE; the dictionary variant is skipped entirely.
    assert_eq!(summary.measured(), 1);
    assert_eq!(summary.failed(), 1);

    assert_eq!(
        reporter.records,
        [
            ("deflate_raw".to_string(), 9, true),
            ("deflate_raw".to_string(), 10, false),
        ]
    );
}
