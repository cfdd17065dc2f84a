use super::registry::ProbeFn;
use super::types::*;

use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A probe plus the pause a job takes between two of its passes.
///
/// Every cycle runs at least one pass. While the cycle is still waiting on slower workers, the
/// job keeps probing with `interval` between passes.
pub struct PeriodicWorker {
    kind: WorkerKind,
    interval: Duration,
    probe: ProbeFn,
    passes: AtomicU64,
}

impl PeriodicWorker {
    pub fn new(kind: WorkerKind, interval: Duration, probe: ProbeFn) -> Self {
        Self {
            kind,
            interval,
            probe,
            passes: AtomicU64::new(0),
        }
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of passes in which the probe ran to completion, across all cycles.
    pub fn completed_passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Runs the probe once.
    pub async fn run_pass(&self, ctx: ProbeContext) -> Result<()> {
        tracing::debug!(
            "Running {} probe against {} with {} peer(s)",
            self.kind,
            ctx.cluster,
            ctx.peers.len()
        );

        (self.probe)(ctx).await?;
        self.passes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}
