//! Probe Registry
//!
//! Maps each `WorkerKind` to the async closure that implements its probe. Keeping the
//! closures type-erased lets the binary, the tests and any embedding application supply
//! their own probing logic without touching the orchestrator.

use super::types::*;
use super::worker::PeriodicWorker;

use anyhow::Result;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Boxed future returned by a probe round.
pub type ProbeFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Type alias for a thread-safe, asynchronous probe function.
pub type ProbeFn = Arc<dyn Fn(ProbeContext) -> ProbeFuture + Send + Sync>;

/// Registry holding one periodic worker per kind.
pub struct ProbeRegistry {
    workers: DashMap<WorkerKind, Arc<PeriodicWorker>>,
}

impl ProbeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers the probe for `kind`, replacing any previous one.
    ///
    /// # Arguments
    /// * `interval` - Pause between two passes of the same job.
    /// * `probe` - The closure that performs one round.
    pub fn register<F, Fut>(&self, kind: WorkerKind, interval: Duration, probe: F)
    where
        F: Fn(ProbeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let probe_fn: ProbeFn = Arc::new(move |ctx: ProbeContext| {
            Box::pin(probe(ctx)) as ProbeFuture
        });

        self.workers
            .insert(kind, Arc::new(PeriodicWorker::new(kind, interval, probe_fn)));

        tracing::info!("Registered {} probe (interval {:?})", kind, interval);
    }

    pub fn get(&self, kind: WorkerKind) -> Option<Arc<PeriodicWorker>> {
        self.workers.get(&kind).map(|entry| entry.value().clone())
    }

    /// Registered workers in submission order.
    pub fn workers(&self) -> Vec<Arc<PeriodicWorker>> {
        WorkerKind::ALL
            .iter()
            .filter_map(|kind| self.get(*kind))
            .collect()
    }

    pub fn has_worker(&self, kind: WorkerKind) -> bool {
        self.workers.contains_key(&kind)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self {
            workers: DashMap::new(),
        }
    }
}
