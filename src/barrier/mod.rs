//! Phase Barrier Module
//!
//! A reusable synchronization point for a dynamic set of parties. Every registered party
//! must arrive once before the barrier advances to the next phase.
//!
//! ## Core Mechanisms
//! - **Registration**: Parties join at any time before the barrier terminates and receive a `PartyId`.
//! - **Advance Hook**: When the last party of a phase arrives, a caller-supplied `AdvanceHook`
//!   decides whether the barrier continues with the next phase or terminates.
//! - **Bounded Waiting**: Waiters block on a `watch` channel with a timeout, so a missing party
//!   can never hang the caller.
//! - **Forced Termination**: The owner can terminate the barrier unconditionally; later
//!   registrations and arrivals become no-ops.

pub mod phaser;
pub mod types;
