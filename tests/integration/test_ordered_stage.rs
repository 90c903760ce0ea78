//! End-to-end behavior of an ordered stage: ordering, end of stream, failures.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use transcoda_lib::concurrency::{OrderedStage, StageConfig};
use transcoda_lib::errors::PipelineError;
use transcoda_lib::media::WorkUnit;
use transcoda_lib::processor::Processor;
use transcoda_lib::processors::InvertProcessor;

use crate::helpers::{
    Duplicate, ScriptedEcho, frame, frame_indices, multi_view_frame, pool, run_to_completion, stage,
};

#[test]
fn test_slow_early_units_are_released_first() {
    let echo = ScriptedEcho::with_delays_ms(&[50, 10, 30, 5, 20]);
    let mut stage = stage(2, 2, move || Ok(echo.clone()));

    // Track every retrieve call separately so "1 before 0" would be visible.
    let mut order = Vec::new();
    for i in 0..5 {
        stage.submit(frame(i)).unwrap();
        order.extend(frame_indices(&stage.retrieve()));
        assert!(order.iter().enumerate().all(|(pos, idx)| *idx == pos as u64), "{order:?}");
    }
    stage.submit(WorkUnit::end_of_stream(1)).unwrap();
    let rest = stage.retrieve();
    order.extend(frame_indices(&rest));

    assert_eq!(order, vec![0, 1, 2, 3, 4]);
    assert!(rest.last().unwrap().is_end_of_stream());
}

#[test]
fn test_end_of_stream_only() {
    let mut stage = stage(2, 2, || Ok(ScriptedEcho::default()));
    stage.submit(WorkUnit::end_of_stream(1)).unwrap();

    let out = stage.retrieve();
    assert_eq!(out, vec![WorkUnit::end_of_stream(1)]);
}

#[test]
fn test_failed_unit_leaves_empty_slot() {
    let echo = ScriptedEcho::with_delays_ms(&[5, 5, 0, 15]).failing_on(2);
    let mut stage = stage(2, 2, move || Ok(echo.clone()));

    let out = run_to_completion(&mut stage, (0..4).map(frame));
    assert_eq!(frame_indices(&out), vec![0, 1, 3]);
    assert!(out.last().unwrap().is_end_of_stream());

    let stats = stage.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.released, 5);
}

#[test]
fn test_panicking_processor_is_replaced() {
    let echo = ScriptedEcho::default().panicking_on(3);
    let mut stage = stage(1, 2, move || Ok(echo.clone()));

    let out = run_to_completion(&mut stage, (0..8).map(frame));
    assert_eq!(frame_indices(&out), vec![0, 1, 2, 4, 5, 6, 7]);
    let stats = stage.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.processors_created, 2);
}

#[test]
fn test_failed_end_of_stream_still_terminates() {
    let echo = ScriptedEcho::default().failing_on_end_of_stream();
    let mut stage = stage(2, 2, move || Ok(echo.clone()));

    for i in 0..3 {
        stage.submit(multi_view_frame(i, 3)).unwrap();
    }
    stage.submit(WorkUnit::end_of_stream(3)).unwrap();
    let out = stage.retrieve();

    assert_eq!(frame_indices(&out), vec![0, 1, 2]);
    assert_eq!(out.last(), Some(&WorkUnit::end_of_stream(3)));
}

#[test]
fn test_retrieve_after_drain_is_empty_and_non_blocking() {
    let mut stage = stage(3, 2, || Ok(ScriptedEcho::default()));
    let out = run_to_completion(&mut stage, (0..10).map(frame));
    assert_eq!(out.len(), 11);

    for _ in 0..5 {
        assert!(stage.retrieve().is_empty());
    }
    assert_eq!(stage.in_flight(), 0);
}

#[test]
fn test_submit_after_end_of_stream_is_rejected() {
    let mut stage = stage(2, 2, || Ok(ScriptedEcho::default()));
    let _ = run_to_completion(&mut stage, (0..2).map(frame));

    let err = stage.submit(frame(2)).unwrap_err();
    assert!(matches!(err, PipelineError::SubmitAfterEndOfStream { .. }));
    assert!(stage.retrieve().is_empty());
}

#[test]
fn test_multiple_outputs_per_unit_stay_grouped() {
    let mut stage = stage(4, 2, || Ok(Duplicate { copies: 3 }));
    let out = run_to_completion(&mut stage, (0..6).map(frame));

    let expected: Vec<u64> = (0..6).flat_map(|i| [i, i, i]).collect();
    assert_eq!(frame_indices(&out), expected);
}

#[test]
fn test_multi_view_units_keep_their_views() {
    let mut stage = stage(2, 2, || Ok(ScriptedEcho::default()));
    let out = run_to_completion(&mut stage, (0..4).map(|i| multi_view_frame(i, 2)));

    for (i, unit) in out.iter().filter(|u| !u.is_end_of_stream()).enumerate() {
        assert_eq!(unit.len(), 2);
        assert_eq!(unit[1].to_cpu().unwrap().as_ref(), &[i as u8, 1]);
    }
}

#[test]
fn test_stages_can_share_a_pool() {
    let shared = pool(3, 2);
    let mut first = OrderedStage::new(StageConfig::new("invert"), Arc::clone(&shared), || {
        Ok(InvertProcessor::new())
    });
    let mut second = OrderedStage::new(StageConfig::new("invert-again"), shared, || {
        Ok(InvertProcessor::new())
    });

    // Chain the stages the way a pipeline would: outputs of one feed the other.
    let mut out = Vec::new();
    for i in 0..20 {
        for unit in first.process(&frame(i)).unwrap() {
            out.extend(second.process(&unit).unwrap());
        }
    }
    for unit in first.process(&WorkUnit::end_of_stream(1)).unwrap() {
        out.extend(second.process(&unit).unwrap());
    }

    assert_eq!(frame_indices(&out), (0..20).collect::<Vec<_>>());
    for (i, unit) in out.iter().take(20).enumerate() {
        // Inverted twice is the original payload.
        assert_eq!(unit.front().to_cpu().unwrap().as_ref(), &(i as u64).to_le_bytes());
    }
    assert!(out.last().unwrap().is_end_of_stream());
}

#[test]
fn test_factory_failure_fails_units() {
    let mut stage = stage(2, 2, || -> anyhow::Result<ScriptedEcho> {
        anyhow::bail!("no hardware encoder session available")
    });
    let out = run_to_completion(&mut stage, (0..3).map(frame));

    assert_eq!(out, vec![WorkUnit::end_of_stream(1)]);
    assert_eq!(stage.stats().failed, 4);
}

#[test]
fn test_panicking_factory_fails_units() {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stage = stage(2, 2, || -> anyhow::Result<ScriptedEcho> {
            let encoder_available = false;
            assert!(encoder_available, "encoder allocation failed");
            Ok(ScriptedEcho::default())
        });
        let out = run_to_completion(&mut stage, (0..2).map(frame));
        tx.send((out, stage.stats().failed)).unwrap();
    });

    let (out, failed) =
        rx.recv_timeout(Duration::from_secs(10)).expect("stage drained after factory panics");
    assert_eq!(out, vec![WorkUnit::end_of_stream(1)]);
    assert_eq!(failed, 3);
}
