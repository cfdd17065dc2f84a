use crate::membership::types::PeerAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The probing tasks run in every cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum WorkerKind {
    LeaderInfo,
    Producer,
    Availability,
    Consumer,
}

impl WorkerKind {
    /// Submission order within a cycle.
    pub const ALL: [WorkerKind; 4] = [
        WorkerKind::LeaderInfo,
        WorkerKind::Producer,
        WorkerKind::Availability,
        WorkerKind::Consumer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WorkerKind::LeaderInfo => "leader-info",
            WorkerKind::Producer => "producer",
            WorkerKind::Availability => "availability",
            WorkerKind::Consumer => "consumer",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs available to a probe round.
///
/// The peer list lets the consumer probe split partitions between monitor instances.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub kind: WorkerKind,
    pub cluster: String,
    pub self_address: PeerAddress,
    pub peers: Vec<PeerAddress>,
}
