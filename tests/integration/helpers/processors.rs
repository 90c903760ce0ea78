//! Processors with scripted behavior for driving stages in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use transcoda_lib::media::WorkUnit;
use transcoda_lib::processor::Processor;

fn index_of(unit: &WorkUnit) -> Option<u64> {
    (!unit.is_end_of_stream()).then(|| unit.front().meta().frame_index)
}

/// Echoes each unit after sleeping the delay scripted for its frame index.
#[derive(Clone, Default)]
pub struct ScriptedEcho {
    delays: Arc<HashMap<u64, Duration>>,
    fail_on: Option<u64>,
    panic_on: Option<u64>,
    fail_end_of_stream: bool,
}

impl ScriptedEcho {
    pub fn with_delays_ms(delays: &[u64]) -> Self {
        let delays =
            delays.iter().enumerate().map(|(i, ms)| (i as u64, Duration::from_millis(*ms))).collect();
        Self { delays: Arc::new(delays), ..Self::default() }
    }

    pub fn failing_on(mut self, index: u64) -> Self {
        self.fail_on = Some(index);
        self
    }

    pub fn panicking_on(mut self, index: u64) -> Self {
        self.panic_on = Some(index);
        self
    }

    pub fn failing_on_end_of_stream(mut self) -> Self {
        self.fail_end_of_stream = true;
        self
    }
}

impl Processor for ScriptedEcho {
    fn process(&mut self, unit: &WorkUnit) -> anyhow::Result<Vec<WorkUnit>> {
        match index_of(unit) {
            None if self.fail_end_of_stream => anyhow::bail!("encoder flush failed"),
            None => {}
            Some(index) => {
                if let Some(delay) = self.delays.get(&index) {
                    thread::sleep(*delay);
                }
                assert!(self.panic_on != Some(index), "scaler state corrupted at frame {index}");
                if self.fail_on == Some(index) {
                    anyhow::bail!("cannot decode frame {index}");
                }
            }
        }
        Ok(vec![unit.clone()])
    }
}

/// Blocks every data unit until the gate's sender is dropped.
pub struct Gated {
    gate: Receiver<()>,
}

impl Gated {
    pub fn new(gate: Receiver<()>) -> Self {
        Self { gate }
    }
}

impl Processor for Gated {
    fn process(&mut self, unit: &WorkUnit) -> anyhow::Result<Vec<WorkUnit>> {
        if !unit.is_end_of_stream() {
            // Returns once the sender is gone.
            let _ = self.gate.recv();
        }
        Ok(vec![unit.clone()])
    }
}

/// Emits `copies` copies of every data unit, like a filter that splits segments.
pub struct Duplicate {
    pub copies: usize,
}

impl Processor for Duplicate {
    fn process(&mut self, unit: &WorkUnit) -> anyhow::Result<Vec<WorkUnit>> {
        if unit.is_end_of_stream() {
            return Ok(vec![unit.clone()]);
        }
        Ok(vec![unit.clone(); self.copies])
    }
}
