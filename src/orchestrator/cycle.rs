//! One orchestration round.
//!
//! A `Cycle` owns its barrier, pool, status board and heartbeat. Nothing here is shared with
//! or reused by the next cycle.

use super::heartbeat::Heartbeat;
use super::types::*;
use crate::barrier::phaser::PhaseBarrier;
use crate::barrier::types::{AwaitOutcome, PartyId, single_round};
use crate::executor::executor::JobExecutor;
use crate::executor::job::BoundedJob;
use crate::executor::types::{JobStatus, StatusBoard};
use crate::workers::types::{ProbeContext, WorkerKind};
use crate::workers::worker::PeriodicWorker;

use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Limits applied to one cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleSettings {
    /// Budget for the whole drain, measured from cycle start.
    pub timeout: Duration,
    pub pool_size: usize,
    pub heartbeat_interval: Duration,
}

pub struct Cycle {
    number: u64,
    barrier: Arc<PhaseBarrier>,
    orchestrator: PartyId,
    executor: JobExecutor,
    statuses: StatusBoard,
    submitted: Vec<WorkerKind>,
    heartbeat: Heartbeat,
    started_at: Instant,
    timeout: Duration,
    drained_in: Option<Duration>,
}

impl Cycle {
    /// Builds the barrier with the orchestrator as its only party and starts the heartbeat.
    pub fn new(number: u64, cluster: &str, settings: CycleSettings) -> Result<Self> {
        let barrier = PhaseBarrier::new(format!("cycle-{}", number), single_round());
        let orchestrator = barrier
            .register()
            .ok_or_else(|| anyhow::anyhow!("fresh barrier for cycle {} is terminal", number))?;

        Ok(Self {
            number,
            barrier,
            orchestrator,
            executor: JobExecutor::new(format!("cycle-{}-pool", number), settings.pool_size),
            statuses: Arc::new(DashMap::new()),
            submitted: Vec::new(),
            heartbeat: Heartbeat::start(cluster, settings.heartbeat_interval),
            started_at: Instant::now(),
            timeout: settings.timeout,
            drained_in: None,
        })
    }

    /// Wraps the worker in a `BoundedJob` (registering it with the barrier) and submits it.
    pub fn submit(
        &mut self,
        worker: Arc<PeriodicWorker>,
        job_timeout: Duration,
        ctx: ProbeContext,
    ) -> Result<()> {
        let job = BoundedJob::new(
            worker,
            job_timeout,
            ctx,
            &self.barrier,
            self.statuses.clone(),
        )?;

        self.submitted.push(job.kind());
        self.executor.submit(job);
        Ok(())
    }

    /// Waits for every party to arrive, bounded by what is left of the cycle budget.
    ///
    /// The barrier is terminal when this returns.
    pub async fn drain(&mut self) -> DrainOutcome {
        let outcome = loop {
            let Some(phase) = self.barrier.arrive(self.orchestrator) else {
                break DrainOutcome::Completed;
            };

            let remaining = self.timeout.saturating_sub(self.started_at.elapsed());
            match self.barrier.await_advance(phase, remaining).await {
                AwaitOutcome::Terminated => break DrainOutcome::Completed,
                AwaitOutcome::Advanced { phase } => {
                    tracing::debug!("Cycle {} barrier advanced to phase {}", self.number, phase);
                }
                AwaitOutcome::TimedOut => {
                    tracing::error!(
                        "Cycle {} did not complete within {:?} ({}/{} parties arrived), forcing termination",
                        self.number,
                        self.timeout,
                        self.barrier.arrived_parties(),
                        self.barrier.registered_parties()
                    );
                    self.barrier.force_terminate();
                    break DrainOutcome::Forced;
                }
            }
        };

        self.drained_in = Some(self.started_at.elapsed());
        outcome
    }

    /// Shuts the pool down and stops the heartbeat.
    ///
    /// Jobs still running after `grace` are cancelled and reported as timed out.
    pub async fn teardown(self, grace: Duration, outcome: DrainOutcome) -> CycleReport {
        let Cycle {
            number,
            executor,
            statuses: board,
            submitted,
            mut heartbeat,
            started_at,
            drained_in,
            ..
        } = self;

        let shutdown = executor.shutdown(grace).await;
        heartbeat.stop();

        let statuses: Vec<_> = submitted
            .iter()
            .map(|kind| {
                let status = board
                    .get(kind)
                    .map(|status| status.value().clone())
                    .unwrap_or(JobStatus::Pending);
                (*kind, status)
            })
            .collect();

        let total = started_at.elapsed();
        CycleReport {
            number,
            statuses,
            outcome,
            drained_in: drained_in.unwrap_or(total),
            total,
            cancelled: shutdown.cancelled,
            heartbeats: heartbeat.beats(),
        }
    }
}
