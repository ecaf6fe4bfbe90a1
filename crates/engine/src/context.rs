use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::signal::AdvanceSignal;

/// Shared key-value state visible to the engine and every step, plus
/// the advance signal through which a step reports completion.
///
/// Exactly one context exists per engine; it is handed out as
/// `Arc<MachineContext>` and never replaced, only mutated. The bag
/// carries its own lock, independent of the engine's wait lock, so a
/// dispatched step may read and write keys while the engine thread
/// paces or waits.
pub struct MachineContext {
    properties: Mutex<HashMap<String, Box<dyn Any + Send>>>,
    signal: Arc<AdvanceSignal>,
}

impl MachineContext {
    pub(crate) fn new(signal: Arc<AdvanceSignal>) -> Self {
        Self {
            properties: Mutex::new(HashMap::new()),
            signal,
        }
    }

    /// Clones the value stored under `key`, if one of type `T` is
    /// present.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Clone,
    {
        let properties = self.properties.lock();
        properties
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Stores `value` under `key`, returning the previous value if the
    /// key was already set.
    pub fn put<T>(&self, key: impl Into<String>, value: T) -> Option<Box<dyn Any + Send>>
    where
        T: Any + Send,
    {
        self.properties.lock().insert(key.into(), Box::new(value))
    }

    /// Signals the engine that the currently executing step finished,
    /// letting the run loop advance.
    pub fn proceed(&self) {
        self.signal.advance();
    }
}
