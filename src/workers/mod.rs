//! Probe Workers Module
//!
//! The four periodic probing tasks (leader-info, producer, availability, consumer) share a
//! single contract: probe at least once per cycle, then report. The probing itself is
//! supplied as an async closure, which keeps broker-specific logic out of the orchestration
//! core.
//!
//! ## Submodules
//! - **`types`**: Worker kinds and the context handed to each probe pass.
//! - **`registry`**: Maps each `WorkerKind` to its `PeriodicWorker`.
//! - **`worker`**: One probe plus the pause between its passes.
//! - **`probes`**: Stock probe implementations used by the binary.

pub mod probes;
pub mod registry;
pub mod types;
pub mod worker;

#[cfg(test)]
mod tests;
