use std::sync::Arc;

/// Identifier handed out by `PhaseBarrier::register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartyId(pub u64);

/// What the barrier does after every party of a phase has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceDecision {
    Continue,
    Terminate,
}

/// Snapshot handed to the advance hook.
#[derive(Debug, Clone, Copy)]
pub struct AdvanceContext {
    /// The phase that is completing.
    pub phase: u64,
    /// Parties registered at the moment of the advance.
    pub registered: usize,
    /// Registered parties that have arrived at least once since the barrier was created.
    pub parties_seen: usize,
}

/// Decides whether the barrier keeps going after a completed phase.
pub type AdvanceHook = Arc<dyn Fn(&AdvanceContext) -> AdvanceDecision + Send + Sync>;

/// Result of waiting for a phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwaitOutcome {
    /// The phase moved past the awaited one and the barrier is still open.
    Advanced { phase: u64 },
    /// The barrier is terminal.
    Terminated,
    /// Neither happened before the timeout elapsed.
    TimedOut,
}

/// Observable progress published to waiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Progress {
    pub phase: u64,
    pub terminated: bool,
}

/// Hook that terminates once every registered party has completed one round.
pub fn single_round() -> AdvanceHook {
    Arc::new(|ctx: &AdvanceContext| {
        if ctx.parties_seen >= ctx.registered {
            tracing::debug!(
                "Phase {} complete with {} parties, terminating",
                ctx.phase,
                ctx.registered
            );
            AdvanceDecision::Terminate
        } else {
            tracing::debug!(
                "Phase {} complete, {}/{} parties seen, continuing",
                ctx.phase,
                ctx.parties_seen,
                ctx.registered
            );
            AdvanceDecision::Continue
        }
    })
}
