//! Property tests: parallel stages produce exactly the sequential output.

use std::time::Duration;

use proptest::prelude::*;
use transcoda_lib::media::WorkUnit;
use transcoda_lib::processor::Processor;
use transcoda_lib::processors::{Delay, DelayProcessor, InvertProcessor};

use crate::helpers::{ScriptedEcho, frame, run_to_completion, stage};

/// Output of a single instance run strictly in submission order.
fn sequential<P: Processor>(mut processor: P, n: u64) -> Vec<WorkUnit> {
    let mut out = Vec::new();
    for i in 0..n {
        out.extend(processor.process(&frame(i)).unwrap());
    }
    out.extend(processor.process(&WorkUnit::end_of_stream(1)).unwrap());
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn proptest_output_matches_sequential_run(
        delays in prop::collection::vec(0u64..4, 0..40),
        threads in 0usize..5,
        capacity in 1usize..4,
    ) {
        let n = delays.len() as u64;
        let echo = ScriptedEcho::with_delays_ms(&delays);
        let expected = sequential(echo.clone(), n);

        let mut stage = stage(threads, capacity, move || Ok(echo.clone()));
        let actual = run_to_completion(&mut stage, (0..n).map(frame));

        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn proptest_random_delays_preserve_inverted_payloads(
        n in 0u64..30,
        seed in any::<u64>(),
        threads in 1usize..5,
    ) {
        let delay = Delay::Random { min: Duration::ZERO, max: Duration::from_millis(3) };
        let mut stage = stage(threads, 2, move || {
            Ok(DelayProcessor::new(InvertProcessor::new(), delay, seed))
        });
        let actual = run_to_completion(&mut stage, (0..n).map(frame));

        prop_assert_eq!(actual, sequential(InvertProcessor::new(), n));
    }
}
