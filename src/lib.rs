//! Kafka Availability Monitor Library
//!
//! The orchestration core of a monitor that repeatedly probes a Kafka cluster from several
//! angles and coordinates with the other monitor instances watching the same cluster.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//!
//! - **`barrier`**: The phase barrier every cycle uses to wait for one full probing round.
//! - **`config`**: Properties file, command-line flags and the startup context built from them.
//! - **`executor`**: Bounded jobs (one worker round under a hard deadline) and the per-cycle
//!   pool that runs them.
//! - **`membership`**: Self-registration and peer discovery through a coordination service,
//!   with in-process and HTTP backends.
//! - **`orchestrator`**: The outer loop: peer sync, cycle, drain, teardown, sleep.
//! - **`workers`**: The four probe kinds and the registry of probe closures.

pub mod barrier;
pub mod config;
pub mod executor;
pub mod membership;
pub mod orchestrator;
pub mod workers;
