use std::sync::Arc;
use std::time::Duration;

use crate::context::MachineContext;

/// One unit of sequenced, timed presentation work.
///
/// Steps are stateless as far as the engine is concerned; anything
/// that must survive across steps goes through the shared
/// [`MachineContext`].
pub trait Step: Send + Sync {
    /// Display name used in logs.
    fn name(&self) -> &str;

    /// Whether the engine should discard this step without running it.
    fn should_skip(&self, _ctx: &MachineContext) -> bool {
        false
    }

    /// Minimum wall-clock budget for this step. `Duration::ZERO`
    /// disables pacing.
    fn preferred_duration(&self, _ctx: &MachineContext) -> Duration {
        Duration::ZERO
    }

    /// Whether `do_step` must run on the injected dispatch context
    /// (for example a UI event loop) instead of the engine thread.
    fn requires_dispatch(&self) -> bool {
        false
    }

    /// One-time setup hook, invoked for every known step before any
    /// step runs.
    fn init_step(&self, _ctx: &MachineContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// The step's work. The step (or whoever acts on its behalf) must
    /// eventually call [`MachineContext::proceed`] or the engine will
    /// not advance past it.
    fn do_step(&self, ctx: &MachineContext) -> anyhow::Result<()>;
}

/// Steps are shared so dispatched work can outlive the loop iteration
/// that submitted it.
pub type SharedStep = Arc<dyn Step>;
