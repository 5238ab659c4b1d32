use std::convert::Infallible;
use std::hint::black_box;

use crate::pal::{Clock, ClockFacade};
use crate::{
    Corpus, Error, Invocation, Measurement, Operation, ResourcePool, Result, RunConfig, Setup,
    Verification,
};

/// Measures `operation` under `config`, feeding it samples from `corpus`.
///
/// The operation is called in batches. The first batch has
/// [`initial_repetitions`][RunConfig::initial_repetitions] calls and every following batch is
/// as large as all previous batches combined, so the total doubles each time. The clock is
/// read once per batch and measurement stops after the first batch that brings the elapsed
/// time to the [`target_duration`][RunConfig::target_duration]. A zero target measures exactly
/// one batch.
///
/// Every batch starts again at [`starting_iteration`][RunConfig::starting_iteration]. Call `i`
/// uses slot `i mod size` of every resource pool and sample `i mod corpus.len()`.
///
/// Once timing ends, the output of the final call is verified. Verification is not timed.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the operation does not support the configured level.
///
/// Returns [`Error::ResourceInit`] if setting up any pool slot fails. Nothing is timed.
///
/// Returns [`Error::Invocation`] as soon as any call fails. Partial statistics are discarded.
///
/// Returns [`Error::Verification`] if the final output fails its check. The error carries the
/// completed measurement, marked as unverified.
pub fn run(
    operation: &mut dyn Operation,
    config: &RunConfig,
    corpus: &Corpus,
) -> Result<Measurement> {
    run_with_clock(operation, config, corpus, &ClockFacade::target())
}

pub(crate) fn run_with_clock(
    operation: &mut dyn Operation,
    config: &RunConfig,
    corpus: &Corpus,
    clock: &ClockFacade,
) -> Result<Measurement> {
    let level = config.level();
    let pools = config.pools();

    if !operation.supports_level(level) {
        return Err(Error::configuration(format!(
            "{} does not support level {level}",
            operation.name()
        )));
    }

    let setup_slots = u64::try_from(pools.setup_slots().get())
        .map_err(|_| Error::configuration("pool size does not fit in an iteration number"))?;

    for slot in 0..setup_slots {
        tracing::trace!(operation = operation.name(), slot, level, "setting up pool slot");

        operation
            .setup(Setup::new(pools.slots_for(slot), level))
            .map_err(|e| {
                Error::resource_init(format!("{} pool slot {slot}", operation.name()), e.message())
            })?;
    }

    // Samples rotate exactly like pool slots do.
    let inputs = ResourcePool::materialize(corpus.len(), |index| {
        let data = corpus.get(index).map_or(&[][..], |sample| sample.data());
        let len = config.clamp_input_len(data.len());
        Ok::<_, Infallible>(data.get(..len).unwrap_or(data))
    })?;

    let max_input_len = config.clamp_input_len(corpus.max_sample_len());
    let mut output = vec![0_u8; operation.output_bound(max_input_len)];
    let mut scratch = vec![0xFF_u8; max_input_len];

    let mut batch_size = config.initial_repetitions().get();
    let mut total_repetitions: u64 = 0;
    let mut total_input_bytes: u128 = 0;
    let mut total_output_bytes: u128 = 0;
    let mut last_iteration = config.starting_iteration();
    let mut last_output_len = 0;

    let start = clock.now();

    let elapsed = loop {
        for offset in 0..batch_size {
            let iteration = config.starting_iteration().wrapping_add(offset);
            let input = *inputs.for_iteration(iteration);

            let produced = operation
                .invoke(Invocation::new(
                    iteration,
                    pools.slots_for(iteration),
                    level,
                    black_box(input),
                    &mut output,
                ))
                .map_err(|e| invocation_error(operation.name(), iteration, e.message()))?;

            if produced == 0 {
                return Err(invocation_error(
                    operation.name(),
                    iteration,
                    "produced no output",
                ));
            }

            if produced > output.len() {
                return Err(invocation_error(
                    operation.name(),
                    iteration,
                    &format!(
                        "reported {produced} bytes of output but the buffer only holds {}",
                        output.len()
                    ),
                ));
            }

            total_input_bytes = total_input_bytes.saturating_add(input.len() as u128);
            total_output_bytes = total_output_bytes.saturating_add(produced as u128);
            last_iteration = iteration;
            last_output_len = produced;
        }

        total_repetitions = total_repetitions.saturating_add(batch_size);

        let elapsed = clock.now().saturating_duration_since(start);

        tracing::debug!(
            operation = operation.name(),
            level,
            batch_size,
            total_repetitions,
            elapsed_nanos = elapsed.as_nanos(),
            "measured batch"
        );

        if elapsed >= config.target_duration() {
            break elapsed;
        }

        batch_size = total_repetitions;
    };

    let measurement = Measurement::new(
        elapsed,
        total_repetitions,
        total_input_bytes,
        total_output_bytes,
        true,
    );

    scratch.fill(0xFF);

    let original = *inputs.for_iteration(last_iteration);
    let verified = operation
        .verify(Verification::new(
            pools.slots_for(last_iteration),
            level,
            output.get(..last_output_len).unwrap_or(&output),
            original,
            scratch.get_mut(..original.len()).unwrap_or(&mut []),
        ))
        .unwrap_or_else(|e| {
            tracing::warn!(
                operation = operation.name(),
                level,
                error = %e,
                "verification could not be performed"
            );
            false
        });

    if !verified {
        return Err(Error::Verification {
            operation: operation.name().to_string(),
            level,
            measurement: Box::new(measurement.into_unverified()),
        });
    }

    Ok(measurement)
}

fn invocation_error(operation: &str, iteration: u64, problem: &str) -> Error {
    Error::Invocation {
        operation: operation.to_string(),
        iteration,
        problem: problem.to_string(),
    }
}
