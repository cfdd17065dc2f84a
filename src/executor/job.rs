use super::types::*;
use crate::barrier::phaser::PhaseBarrier;
use crate::barrier::types::PartyId;
use crate::workers::types::{ProbeContext, WorkerKind};
use crate::workers::worker::PeriodicWorker;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Arrives at the barrier exactly once: explicitly after the first pass, or when dropped.
///
/// A job that is dropped before reaching a terminal status was cancelled from outside and is
/// recorded as timed out.
struct ArrivalGuard {
    barrier: Arc<PhaseBarrier>,
    party: PartyId,
    kind: WorkerKind,
    statuses: StatusBoard,
    started: Option<Instant>,
    arrived: bool,
}

impl ArrivalGuard {
    fn arrive(&mut self) {
        if !self.arrived {
            self.arrived = true;
            self.barrier.arrive(self.party);
        }
    }
}

impl Drop for ArrivalGuard {
    fn drop(&mut self) {
        if let Some(mut status) = self.statuses.get_mut(&self.kind)
            && !status.is_terminal()
        {
            let after = self.started.map(|s| s.elapsed()).unwrap_or_default();
            tracing::warn!("{} job cancelled after {:?}", self.kind, after);
            *status = JobStatus::TimedOut { after };
        }

        self.arrive();
    }
}

/// Floor on the pause between passes, so a zero interval cannot spin.
const MIN_PASS_SPACING: Duration = Duration::from_millis(10);

/// Aborts the wrapped task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One worker round with a hard deadline.
pub struct BoundedJob {
    name: String,
    kind: WorkerKind,
    worker: Arc<PeriodicWorker>,
    timeout: Duration,
    ctx: ProbeContext,
    guard: ArrivalGuard,
}

impl BoundedJob {
    /// Builds the job and registers it as a party of `barrier`.
    ///
    /// Fails only if the barrier is already terminal.
    pub fn new(
        worker: Arc<PeriodicWorker>,
        timeout: Duration,
        ctx: ProbeContext,
        barrier: &Arc<PhaseBarrier>,
        statuses: StatusBoard,
    ) -> Result<Self> {
        let kind = worker.kind();
        let party = barrier.register().ok_or_else(|| {
            anyhow::anyhow!(
                "barrier {} terminated before {} job could register",
                barrier.name(),
                kind
            )
        })?;

        statuses.insert(kind, JobStatus::Pending);

        Ok(Self {
            name: format!("{}-job", kind),
            kind,
            worker,
            timeout,
            ctx,
            guard: ArrivalGuard {
                barrier: barrier.clone(),
                party,
                kind,
                statuses,
                started: None,
                arrived: false,
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    pub fn party(&self) -> PartyId {
        self.guard.party
    }

    fn set_status(&self, status: JobStatus) {
        self.guard.statuses.insert(self.kind, status);
    }

    fn spawn_pass(&self) -> AbortOnDrop<Result<()>> {
        let worker = self.worker.clone();
        let ctx = self.ctx.clone();
        AbortOnDrop(tokio::spawn(async move { worker.run_pass(ctx).await }))
    }

    /// Runs the worker until its cycle ends, interrupting it if it outlives the timeout.
    ///
    /// The first pass decides the job's status and is followed by the barrier arrival. After a
    /// successful first pass the job keeps probing, `interval` apart, until the barrier
    /// terminates or the deadline passes. Errors and panics in the worker are caught here and
    /// never propagate.
    pub async fn run(mut self) -> JobReport {
        let started = Instant::now();
        let deadline = started + self.timeout;
        self.guard.started = Some(started);
        self.set_status(JobStatus::Running);
        tracing::info!("Starting {} (timeout {:?})", self.name, self.timeout);

        let status = self.first_pass(started, deadline).await;
        self.set_status(status.clone());
        self.guard.arrive();

        let passes = match status {
            JobStatus::Completed { .. } => 1 + self.repeat_passes(deadline).await,
            _ => 0,
        };

        JobReport {
            kind: self.kind,
            status,
            passes,
        }
    }

    async fn first_pass(&self, started: Instant, deadline: Instant) -> JobStatus {
        let mut pass = self.spawn_pass();

        match tokio::time::timeout_at(deadline, &mut pass.0).await {
            Ok(Ok(Ok(()))) => {
                let elapsed = started.elapsed();
                tracing::info!("{} completed in {:?}", self.name, elapsed);
                JobStatus::Completed { elapsed }
            }
            Ok(Ok(Err(e))) => {
                tracing::error!("{} failed: {:#}", self.name, e);
                JobStatus::Failed {
                    error: format!("{:#}", e),
                }
            }
            Ok(Err(join_error)) => {
                tracing::error!("{} aborted abnormally: {}", self.name, join_error);
                JobStatus::Failed {
                    error: join_error.to_string(),
                }
            }
            Err(_) => {
                pass.0.abort();
                let after = started.elapsed();
                tracing::warn!(
                    "{} timed out after {:?}, interrupting worker",
                    self.name,
                    after
                );
                JobStatus::TimedOut { after }
            }
        }
    }

    /// Extra passes while slower jobs hold the cycle open. Returns how many succeeded.
    async fn repeat_passes(&self, deadline: Instant) -> u64 {
        let barrier = self.guard.barrier.clone();
        let pause = self.worker.interval().max(MIN_PASS_SPACING);
        let mut extra = 0u64;

        loop {
            tokio::select! {
                _ = barrier.terminated() => break,
                _ = tokio::time::sleep_until((Instant::now() + pause).min(deadline)) => {}
            }

            if Instant::now() >= deadline {
                tracing::debug!("{} reached its deadline, stopping extra passes", self.name);
                break;
            }

            let mut pass = self.spawn_pass();
            tokio::select! {
                _ = barrier.terminated() => break,
                joined = tokio::time::timeout_at(deadline, &mut pass.0) => match joined {
                    Ok(Ok(Ok(()))) => extra += 1,
                    Ok(Ok(Err(e))) => tracing::warn!("{} extra pass failed: {:#}", self.name, e),
                    Ok(Err(join_error)) => {
                        tracing::error!("{} extra pass aborted abnormally: {}", self.name, join_error);
                        break;
                    }
                    Err(_) => break,
                },
            }
        }

        if extra > 0 {
            tracing::debug!("{} ran {} extra pass(es)", self.name, extra);
        }
        extra
    }
}
