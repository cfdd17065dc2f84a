use crate::workers::types::WorkerKind;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of a bounded job within one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Submitted but not yet started.
    Pending,
    /// The worker round is in progress.
    Running,
    /// The round finished before the deadline.
    Completed { elapsed: Duration },
    /// The deadline elapsed, or the pool cancelled the job, and the round was interrupted.
    TimedOut { after: Duration },
    /// The round returned an error or panicked.
    Failed { error: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed { .. } => "completed",
            JobStatus::TimedOut { .. } => "timed-out",
            JobStatus::Failed { .. } => "failed",
        }
    }
}

/// Latest status of every job in a cycle, shared between the jobs and the orchestrator.
pub type StatusBoard = Arc<DashMap<WorkerKind, JobStatus>>;

/// What a job hands back when it finishes on its own.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub kind: WorkerKind,
    pub status: JobStatus,
    /// Probe passes that succeeded, the first one included.
    pub passes: u64,
}
