use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{debug, error, trace};

use crate::context::MachineContext;
use crate::dispatch::{Dispatcher, ThreadDispatcher};
use crate::error::{EngineError, EngineResult};
use crate::iterator::StepIterator;
use crate::signal::{AdvanceSignal, StopHandle};
use crate::step::SharedStep;

/// Upper bound on back-to-back skipped steps before the engine bails
/// out instead of busy-looping on a sequence that never yields a
/// runnable step.
pub const DEFAULT_SKIP_LIMIT: usize = 1024;

/// Drives the step loop: skip-filters, executes, paces each step to
/// its preferred duration, then blocks until the step proceeds.
pub struct StepEngine<I> {
    iterator: I,
    context: Arc<MachineContext>,
    signal: Arc<AdvanceSignal>,
    dispatcher: Arc<dyn Dispatcher>,
    skip_limit: usize,
}

pub struct EngineBuilder<I> {
    iterator: I,
    dispatcher: Arc<dyn Dispatcher>,
    skip_limit: usize,
}

impl<I: StepIterator> EngineBuilder<I> {
    /// Execution context for steps that declare `requires_dispatch`.
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn max_consecutive_skips(mut self, limit: usize) -> Self {
        self.skip_limit = limit;
        self
    }

    /// Creates the context, runs the one-time init broadcast over
    /// every step the iterator knows about, and assembles the engine.
    /// Every step sees the fully formed context before any step runs.
    pub fn build(mut self) -> EngineResult<StepEngine<I>> {
        if self.skip_limit == 0 {
            return Err(EngineError::InvalidConfig("skip limit must be at least 1"));
        }

        let signal = AdvanceSignal::new();
        let context = Arc::new(MachineContext::new(Arc::clone(&signal)));

        let mut failed = None;
        self.iterator.apply_with(&mut |step| {
            if failed.is_some() {
                return;
            }
            if let Err(source) = step.init_step(&context) {
                failed = Some(EngineError::StepInit {
                    name: step.name().to_owned(),
                    source,
                });
            }
        });
        if let Some(err) = failed {
            return Err(err);
        }

        Ok(StepEngine {
            iterator: self.iterator,
            context,
            signal,
            dispatcher: self.dispatcher,
            skip_limit: self.skip_limit,
        })
    }
}

impl<I: StepIterator> StepEngine<I> {
    pub fn builder(iterator: I) -> EngineBuilder<I> {
        EngineBuilder {
            iterator,
            dispatcher: Arc::new(ThreadDispatcher),
            skip_limit: DEFAULT_SKIP_LIMIT,
        }
    }

    /// Engine with the default dispatcher and skip limit.
    pub fn new(iterator: I) -> EngineResult<Self> {
        Self::builder(iterator).build()
    }

    /// The shared context handed to every step.
    pub fn context(&self) -> Arc<MachineContext> {
        Arc::clone(&self.context)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(Arc::clone(&self.signal))
    }

    /// Runs the loop. Blocks until [`StopHandle::stop`] is observed or
    /// the skip limit trips. Call at most once per engine instance.
    pub fn go(&mut self) -> EngineResult<()> {
        while !self.signal.is_stopped() {
            self.run_iteration()?;
        }
        debug!("engine stopped");
        Ok(())
    }

    fn run_iteration(&mut self) -> EngineResult<()> {
        let start = Instant::now();

        let step = self.next_runnable_step()?;
        let budget = step.preferred_duration(&self.context);

        // From here until the wait returns, a proceed() cannot be
        // lost: it latches in the signal and the wait consumes it.
        self.signal.clear();

        if step.requires_dispatch() {
            debug!("dispatching step {}", step.name());
            let task_step = Arc::clone(&step);
            let task_ctx = Arc::clone(&self.context);
            self.dispatcher.dispatch(Box::new(move || {
                if let Err(err) = task_step.do_step(&task_ctx) {
                    error!("dispatched step {} failed: {:#}", task_step.name(), err);
                }
            }));
        } else {
            debug!("executing step {}", step.name());
            if let Err(err) = step.do_step(&self.context) {
                // A failed step will not proceed(); waiting on it
                // would stall the loop.
                error!("step {} failed: {:#}", step.name(), err);
                return Ok(());
            }
        }

        let delay = budget.saturating_sub(start.elapsed());
        if !delay.is_zero() {
            trace!("pacing step {} for {:?}", step.name(), delay);
            thread::sleep(delay);
        }

        trace!("waiting for step {} to proceed", step.name());
        self.signal.wait_for_advance();
        Ok(())
    }

    fn next_runnable_step(&mut self) -> EngineResult<SharedStep> {
        let mut skipped = 0;
        loop {
            let step = self.iterator.next_step();
            if !step.should_skip(&self.context) {
                return Ok(step);
            }
            debug!("skipping step {}", step.name());
            skipped += 1;
            if skipped >= self.skip_limit {
                return Err(EngineError::SkipLimitExceeded(skipped));
            }
        }
    }
}
