//! Membership & Discovery Module
//!
//! Registers each monitor instance with a coordination service and lets it discover the
//! other instances watching the same cluster.
//!
//! ## Core Mechanisms
//! - **Ephemeral Registration**: Each instance owns one entry, named after its advertised
//!   `host:port`, that disappears when its session ends.
//! - **Verification**: Before every cycle the instance checks its entry still exists and
//!   recreates it if a session loss removed it.
//! - **Pluggable Backends**: `CoordinationService` is implemented in-process
//!   (`InMemoryCoordination`) and over HTTP (`HttpCoordination` against `handlers::serve`).

pub mod client;
pub mod coordination;
pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod service;
pub mod store;
pub mod types;
