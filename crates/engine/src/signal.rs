use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Advance/stop handshake shared by the engine loop, the context, and
/// stop handles.
///
/// `advanced` latches a proceed signal, so a notification raised
/// before the loop reaches its wait is still observed; the wait
/// consumes the latch on wakeup.
pub(crate) struct AdvanceSignal {
    advanced: Mutex<bool>,
    condvar: Condvar,
    stopped: AtomicBool,
}

impl AdvanceSignal {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            advanced: Mutex::new(false),
            condvar: Condvar::new(),
            stopped: AtomicBool::new(false),
        })
    }

    /// Drops any signal latched before the upcoming step starts.
    pub(crate) fn clear(&self) {
        *self.advanced.lock() = false;
    }

    /// Latches the advance signal and wakes the engine.
    pub(crate) fn advance(&self) {
        let mut advanced = self.advanced.lock();
        *advanced = true;
        self.condvar.notify_all();
    }

    /// Blocks until an advance signal or a stop is observed, consuming
    /// the latch. Spurious wakeups re-check the predicate.
    pub(crate) fn wait_for_advance(&self) {
        let mut advanced = self.advanced.lock();
        while !*advanced && !self.is_stopped() {
            self.condvar.wait(&mut advanced);
        }
        *advanced = false;
    }

    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        // Hold the lock while notifying so a concurrent waiter cannot
        // slip between its predicate check and the condvar wait.
        let _advanced = self.advanced.lock();
        self.condvar.notify_all();
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Cloneable handle that terminates a running engine.
///
/// The engine observes `stop` at its condition wait and at the top of
/// each loop iteration; `go()` then returns.
#[derive(Clone)]
pub struct StopHandle {
    signal: Arc<AdvanceSignal>,
}

impl StopHandle {
    pub(crate) fn new(signal: Arc<AdvanceSignal>) -> Self {
        Self { signal }
    }

    pub fn stop(&self) {
        self.signal.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.signal.is_stopped()
    }
}
