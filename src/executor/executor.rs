//! Cycle Worker Pool
//!
//! A fixed-size pool backed by a `JoinSet`. Each cycle builds its own pool and shuts it down
//! before the next cycle starts, so no task outlives the cycle that spawned it.

use super::job::BoundedJob;
use super::types::JobReport;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of shutting the pool down.
#[derive(Debug, Default)]
pub struct PoolShutdown {
    /// Reports of the jobs that finished on their own.
    pub reports: Vec<JobReport>,
    /// Jobs aborted after the grace period.
    pub cancelled: usize,
}

pub struct JobExecutor {
    name: String,
    jobs: JoinSet<JobReport>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl JobExecutor {
    /// Creates a pool running at most `size` jobs at a time.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name: name.into(),
            jobs: JoinSet::new(),
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Jobs submitted and not yet collected.
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    pub fn submit(&mut self, job: BoundedJob) {
        tracing::debug!("{}: submitting {}", self.name, job.name());
        let permits = self.permits.clone();

        self.jobs.spawn(async move {
            let _permit = permits.acquire_owned().await;
            job.run().await
        });
    }

    /// Waits up to `grace` for running jobs, then aborts the stragglers.
    pub async fn shutdown(mut self, grace: Duration) -> PoolShutdown {
        let mut result = PoolShutdown::default();

        let drained = {
            let jobs = &mut self.jobs;
            let reports = &mut result.reports;
            tokio::time::timeout(grace, async move {
                while let Some(joined) = jobs.join_next().await {
                    match joined {
                        Ok(report) => reports.push(report),
                        Err(e) => tracing::error!("Job task ended abnormally: {}", e),
                    }
                }
            })
            .await
            .is_ok()
        };

        if !drained {
            tracing::warn!(
                "{}: {} job(s) still running after {:?}, cancelling",
                self.name,
                self.jobs.len(),
                grace
            );
            self.jobs.abort_all();

            while let Some(joined) = self.jobs.join_next().await {
                match joined {
                    Ok(report) => result.reports.push(report),
                    Err(e) if e.is_cancelled() => result.cancelled += 1,
                    Err(e) => tracing::error!("Job task ended abnormally: {}", e),
                }
            }
        }

        tracing::debug!(
            "{}: shut down ({} finished, {} cancelled)",
            self.name,
            result.reports.len(),
            result.cancelled
        );

        result
    }
}
