use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::step::SharedStep;

/// Supplies the engine's step sequence.
pub trait StepIterator: Send {
    /// Next step in sequence. Must not block indefinitely; a stalled
    /// iterator stalls the whole engine.
    fn next_step(&mut self) -> SharedStep;

    /// Visits every step this iterator knows about, exactly once. The
    /// engine uses this for the one-time init broadcast before the
    /// loop starts.
    fn apply_with(&mut self, f: &mut dyn FnMut(&SharedStep));
}

/// Endless in-order loop over a fixed step list.
pub struct CycleIterator {
    steps: Vec<SharedStep>,
    next: usize,
}

impl CycleIterator {
    pub fn new(steps: Vec<SharedStep>) -> EngineResult<Self> {
        if steps.is_empty() {
            return Err(EngineError::InvalidConfig("step sequence is empty"));
        }
        Ok(Self { steps, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl StepIterator for CycleIterator {
    fn next_step(&mut self) -> SharedStep {
        let step = Arc::clone(&self.steps[self.next]);
        self.next = (self.next + 1) % self.steps.len();
        step
    }

    fn apply_with(&mut self, f: &mut dyn FnMut(&SharedStep)) {
        for step in &self.steps {
            f(step);
        }
    }
}
