use super::cycle::{Cycle, CycleSettings};
use super::types::*;
use crate::config::context::MonitorContext;
use crate::membership::coordination::CoordinationService;
use crate::membership::service::PeerRegistry;
use crate::membership::types::{PeerAddress, VerifyOutcome};
use crate::workers::registry::ProbeRegistry;
use crate::workers::types::ProbeContext;

use anyhow::Result;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Runs probing cycles until the requested count is reached, or forever.
///
/// Only one cycle is ever in flight. Everything a cycle allocates is torn down before the
/// inter-cycle sleep begins.
pub struct Orchestrator<C: CoordinationService> {
    ctx: Arc<MonitorContext>,
    registry: Arc<PeerRegistry<C>>,
    probes: Arc<ProbeRegistry>,
    peers: Mutex<Vec<PeerAddress>>,
    state: Mutex<OrchestratorState>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C: CoordinationService> Orchestrator<C> {
    pub fn new(
        ctx: Arc<MonitorContext>,
        registry: Arc<PeerRegistry<C>>,
        probes: Arc<ProbeRegistry>,
    ) -> Arc<Self> {
        Arc::new(Self {
            ctx,
            registry,
            probes,
            peers: Mutex::new(Vec::new()),
            state: Mutex::new(OrchestratorState::Idle),
        })
    }

    pub fn state(&self) -> OrchestratorState {
        *locked(&self.state)
    }

    fn set_state(&self, state: OrchestratorState) {
        let mut current = locked(&self.state);
        if *current != state {
            tracing::debug!("Orchestrator {:?} -> {:?}", *current, state);
            *current = state;
        }
    }

    /// Peers seen by the last successful refresh.
    pub fn peers(&self) -> Vec<PeerAddress> {
        locked(&self.peers).clone()
    }

    /// Marks the orchestrator stopped. Used when the loop is abandoned from outside.
    pub fn stop(&self) {
        self.set_state(OrchestratorState::Stopped);
    }

    /// Warm-up, peer refresh and registration check. Never fails.
    pub async fn sync_peers(&self) -> VerifyOutcome {
        self.set_state(OrchestratorState::PeerSync);

        let warmup = self.ctx.config.warmup();
        if !warmup.is_zero() {
            tracing::debug!("Waiting {:?} before peer sync", warmup);
            tokio::time::sleep(warmup).await;
        }

        match self.registry.list_peers().await {
            Ok(peers) => {
                tracing::info!(
                    "{} monitor instance(s) registered for {}: {:?}",
                    peers.len(),
                    self.ctx.cluster,
                    peers.iter().map(|p| p.to_string()).collect::<Vec<_>>()
                );
                *locked(&self.peers) = peers;
            }
            Err(e) => {
                tracing::error!("Failed to refresh peer list: {}", e);
            }
        }

        self.registry.verify_registrations().await
    }

    /// Runs one full cycle: submit every worker, drain the barrier, tear down.
    pub async fn run_cycle(&self, number: u64) -> Result<CycleReport> {
        self.set_state(OrchestratorState::CycleRunning);

        let config = &self.ctx.config;
        let workers = self.probes.workers();
        let peers = self.peers();

        let mut cycle = Cycle::new(
            number,
            &self.ctx.cluster,
            CycleSettings {
                timeout: config.cycle_timeout(),
                pool_size: workers.len(),
                heartbeat_interval: config.heartbeat_interval(),
            },
        )?;

        tracing::info!(
            "Cycle {} starting {} worker(s) with a {:?} budget",
            number,
            workers.len(),
            config.cycle_timeout()
        );

        for worker in workers {
            let kind = worker.kind();
            let ctx = ProbeContext {
                kind,
                cluster: self.ctx.cluster.clone(),
                self_address: self.ctx.self_address.clone(),
                peers: peers.clone(),
            };

            if let Err(e) = cycle.submit(worker, config.job_timeout(kind), ctx) {
                tracing::error!("Cycle {}: could not submit {} job: {:#}", number, kind, e);
            }
        }

        self.set_state(OrchestratorState::CycleDraining);
        let outcome = cycle.drain().await;
        let report = cycle.teardown(config.pool_shutdown_grace(), outcome).await;

        for (kind, status) in &report.statuses {
            tracing::info!("Cycle {}: {} {}", number, kind, status.label());
        }
        tracing::info!(
            "Cycle {} finished ({:?}) in {:?}: {} completed, {} timed out, {} failed",
            number,
            report.outcome,
            report.total,
            report.count("completed"),
            report.count("timed-out"),
            report.count("failed")
        );

        self.set_state(OrchestratorState::Idle);
        Ok(report)
    }

    /// Runs `runs` cycles, or cycles forever when `None`, sleeping between them.
    ///
    /// Returns the number of cycles run. Cycle errors are logged and do not stop the loop.
    pub async fn run(&self, runs: Option<u64>) -> u64 {
        let mut completed = 0u64;

        while runs.is_none_or(|limit| completed < limit) {
            let number = completed + 1;

            let verified = self.sync_peers().await;
            tracing::debug!("Registration check before cycle {}: {:?}", number, verified);

            if let Err(e) = self.run_cycle(number).await {
                tracing::error!("Cycle {} aborted: {:#}", number, e);
                self.set_state(OrchestratorState::Idle);
            }
            completed += 1;

            tracing::info!("Sleeping {:?} before next cycle", self.ctx.sleep);
            tokio::time::sleep(self.ctx.sleep).await;
        }

        self.set_state(OrchestratorState::Stopped);
        tracing::info!("Orchestrator stopped after {} cycle(s)", completed);
        completed
    }
}

/// Registers this instance, runs the cycles until done or until `shutdown` resolves, then
/// releases the registration exactly once.
///
/// Resolving `shutdown` drops the cycle in flight, which aborts its jobs and their probes.
pub async fn run_monitor<C, S>(
    ctx: Arc<MonitorContext>,
    registry: Arc<PeerRegistry<C>>,
    probes: Arc<ProbeRegistry>,
    shutdown: S,
) -> Result<()>
where
    C: CoordinationService,
    S: Future<Output = ()>,
{
    if let Err(e) = registry.register(&ctx.self_address).await {
        registry.release().await;
        return Err(anyhow::anyhow!(
            "initial registration of {} failed: {}",
            ctx.self_address,
            e
        ));
    }

    let orchestrator = Orchestrator::new(ctx.clone(), registry.clone(), probes);

    tokio::select! {
        cycles = orchestrator.run(ctx.runs) => {
            tracing::info!("Completed {} cycle(s)", cycles);
        }
        _ = shutdown => {
            tracing::info!("Shutdown requested, abandoning current cycle");
            orchestrator.stop();
        }
    }

    registry.release().await;
    Ok(())
}
