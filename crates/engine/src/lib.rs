//! Paced step sequencer.
//!
//! Drives a sequence of timed presentation steps against a shared
//! [`MachineContext`], padding each step out to its preferred duration
//! and advancing only when the step signals completion via
//! [`MachineContext::proceed`]. One thread runs the loop; steps that
//! need a special execution context (a UI event loop, say) are handed
//! off fire-and-forget through a [`Dispatcher`].

mod context;
mod dispatch;
mod engine;
mod error;
mod iterator;
mod signal;
mod step;

pub use context::MachineContext;
pub use dispatch::{Dispatcher, ThreadDispatcher};
pub use engine::{EngineBuilder, StepEngine, DEFAULT_SKIP_LIMIT};
pub use error::{EngineError, EngineResult};
pub use iterator::{CycleIterator, StepIterator};
pub use signal::StopHandle;
pub use step::{SharedStep, Step};
