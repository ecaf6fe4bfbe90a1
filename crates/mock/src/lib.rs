//! Test fixtures for the step engine: journaled probe steps, a
//! channel-backed dispatcher standing in for a UI event loop, and
//! small timing helpers.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::bail;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use step_engine::{Dispatcher, MachineContext, SharedStep, Step, StopHandle};

/// What a probe step observed, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    Init(&'static str),
    Executed(&'static str),
}

/// Shared event recorder written to by probe steps and read by tests.
#[derive(Default)]
pub struct Journal {
    events: Mutex<Vec<(TraceEvent, Instant)>>,
}

impl Journal {
    pub fn record(&self, event: TraceEvent) {
        self.events.lock().push((event, Instant::now()));
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .iter()
            .map(|(event, _)| event.clone())
            .collect()
    }

    pub fn contains(&self, event: &TraceEvent) -> bool {
        self.events.lock().iter().any(|(e, _)| e == event)
    }

    /// Timestamp of the first occurrence of `event`.
    pub fn timestamp_of(&self, event: &TraceEvent) -> Option<Instant> {
        self.events
            .lock()
            .iter()
            .find(|(e, _)| e == event)
            .map(|(_, at)| *at)
    }
}

/// Late-bound [`StopHandle`] slot, filled once the engine exists so a
/// step inside the sequence can terminate the loop.
#[derive(Clone, Default)]
pub struct StopSlot {
    handle: Arc<Mutex<Option<StopHandle>>>,
}

impl StopSlot {
    pub fn fill(&self, handle: StopHandle) {
        *self.handle.lock() = Some(handle);
    }

    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().as_ref() {
            handle.stop();
        }
    }
}

/// Configurable step that records everything it does to a [`Journal`].
///
/// By default it proceeds on its own at the end of `do_step`, the way
/// a real presentation step proceeds when its animation finishes.
pub struct ProbeStep {
    name: &'static str,
    journal: Arc<Journal>,
    skip: bool,
    duration: Duration,
    busy: Duration,
    dispatch: bool,
    fail: bool,
    fail_init: bool,
    proceeds: bool,
    stop_slot: Option<StopSlot>,
}

impl ProbeStep {
    pub fn new(name: &'static str, journal: &Arc<Journal>) -> Self {
        Self {
            name,
            journal: Arc::clone(journal),
            skip: false,
            duration: Duration::ZERO,
            busy: Duration::ZERO,
            dispatch: false,
            fail: false,
            fail_init: false,
            proceeds: true,
            stop_slot: None,
        }
    }

    /// Step always reports `should_skip` true.
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Step asks for a minimum wall-clock budget.
    pub fn paced(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// `do_step` burns this much wall-clock time before returning.
    pub fn busy(mut self, busy: Duration) -> Self {
        self.busy = busy;
        self
    }

    /// Step requires the dispatch context.
    pub fn dispatched(mut self) -> Self {
        self.dispatch = true;
        self
    }

    /// `do_step` fails after recording its execution.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// `init_step` fails.
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Step does not call `proceed`; the test drives the advance.
    pub fn manual_proceed(mut self) -> Self {
        self.proceeds = false;
        self
    }

    /// Step stops the engine through `slot` before proceeding.
    pub fn stops(mut self, slot: &StopSlot) -> Self {
        self.stop_slot = Some(slot.clone());
        self
    }

    pub fn shared(self) -> SharedStep {
        Arc::new(self)
    }
}

impl Step for ProbeStep {
    fn name(&self) -> &str {
        self.name
    }

    fn should_skip(&self, _ctx: &MachineContext) -> bool {
        self.skip
    }

    fn preferred_duration(&self, _ctx: &MachineContext) -> Duration {
        self.duration
    }

    fn requires_dispatch(&self) -> bool {
        self.dispatch
    }

    fn init_step(&self, _ctx: &MachineContext) -> anyhow::Result<()> {
        if self.fail_init {
            bail!("probe step {} refuses to initialize", self.name);
        }
        self.journal.record(TraceEvent::Init(self.name));
        Ok(())
    }

    fn do_step(&self, ctx: &MachineContext) -> anyhow::Result<()> {
        self.journal.record(TraceEvent::Executed(self.name));
        if !self.busy.is_zero() {
            thread::sleep(self.busy);
        }
        if self.fail {
            bail!("probe step {} fails by design", self.name);
        }
        if let Some(slot) = &self.stop_slot {
            slot.stop();
        }
        if self.proceeds {
            ctx.proceed();
        }
        Ok(())
    }
}

/// Closure-backed step; proceeds on its own after the closure runs.
pub struct FnStep<F> {
    name: &'static str,
    action: F,
}

impl<F> FnStep<F>
where
    F: Fn(&MachineContext) -> anyhow::Result<()> + Send + Sync + 'static,
{
    pub fn new(name: &'static str, action: F) -> Self {
        Self { name, action }
    }

    pub fn shared(self) -> SharedStep {
        Arc::new(self)
    }
}

impl<F> Step for FnStep<F>
where
    F: Fn(&MachineContext) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn do_step(&self, ctx: &MachineContext) -> anyhow::Result<()> {
        (self.action)(ctx)?;
        ctx.proceed();
        Ok(())
    }
}

/// Dispatcher that queues tasks on a channel instead of running them,
/// standing in for a UI event loop the test drains deterministically.
pub struct ChannelDispatcher {
    tx: Sender<Box<dyn FnOnce() + Send>>,
}

/// Receiving half of a [`ChannelDispatcher`].
pub struct DispatchQueue {
    rx: Receiver<Box<dyn FnOnce() + Send>>,
}

impl ChannelDispatcher {
    pub fn new() -> (Arc<Self>, DispatchQueue) {
        let (tx, rx) = unbounded();
        (Arc::new(Self { tx }), DispatchQueue { rx })
    }
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
        // A dropped queue means the test no longer cares; fire and
        // forget either way.
        let _ = self.tx.send(task);
    }
}

impl DispatchQueue {
    /// Runs the next queued task, waiting up to `timeout` for one to
    /// arrive. Returns whether a task ran.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Polls `cond` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}
