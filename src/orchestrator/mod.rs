//! Orchestrator Module
//!
//! Drives the monitor's repeated probing cycles.
//!
//! ## Cycle Lifecycle
//! 1. **PeerSync**: Wait out the warm-up, refresh the peer list and verify this instance is
//!    still registered. Failures are logged and never stop the cycle.
//! 2. **CycleRunning**: Build a fresh barrier (orchestrator pre-registered), a pool sized to
//!    the number of workers, and a heartbeat. Submit every worker as a `BoundedJob`.
//! 3. **CycleDraining**: Arrive and wait for the round to complete within the remaining
//!    cycle budget. On overrun the barrier is force-terminated.
//! 4. **Teardown**: Drain the pool for a grace period, cancel stragglers, stop the heartbeat,
//!    then sleep before the next cycle.
//!
//! ## Submodules
//! - **`types`**: Orchestrator states and per-cycle reports.
//! - **`heartbeat`**: Periodic liveness log line emitted while a cycle runs.
//! - **`cycle`**: Everything owned by a single cycle.
//! - **`service`**: The outer loop.

pub mod cycle;
pub mod heartbeat;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
