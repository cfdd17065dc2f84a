use crate::executor::types::JobStatus;
use crate::workers::types::WorkerKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    PeerSync,
    CycleRunning,
    CycleDraining,
    Stopped,
}

/// How the drain phase of a cycle ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every party arrived and the barrier terminated on its own.
    Completed,
    /// The cycle budget ran out and the barrier was force-terminated.
    Forced,
}

/// Summary of one finished cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub number: u64,
    /// Final status of every submitted job, in submission order.
    pub statuses: Vec<(WorkerKind, JobStatus)>,
    pub outcome: DrainOutcome,
    /// Time from cycle start until the barrier was terminal.
    pub drained_in: Duration,
    /// Time from cycle start until teardown finished.
    pub total: Duration,
    /// Jobs aborted during teardown.
    pub cancelled: usize,
    pub heartbeats: u64,
}

impl CycleReport {
    pub fn status_of(&self, kind: WorkerKind) -> Option<&JobStatus> {
        self.statuses
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, status)| status)
    }

    pub fn count(&self, label: &str) -> usize {
        self.statuses
            .iter()
            .filter(|(_, status)| status.label() == label)
            .count()
    }

    pub fn is_forced(&self) -> bool {
        self.outcome == DrainOutcome::Forced
    }
}
