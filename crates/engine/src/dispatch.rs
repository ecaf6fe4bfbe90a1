use std::thread;

/// One-shot, fire-and-forget task submission onto an external
/// execution context, typically a UI event loop.
///
/// The engine never joins a dispatched task. Whether the task ever
/// runs, panics, or is cancelled is entirely the dispatcher's concern;
/// the engine only learns of completion through a later
/// [`MachineContext::proceed`](crate::MachineContext::proceed) call.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);
}

/// Default dispatcher: runs each task on its own detached thread.
pub struct ThreadDispatcher;

impl Dispatcher for ThreadDispatcher {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
        thread::spawn(task);
    }
}
