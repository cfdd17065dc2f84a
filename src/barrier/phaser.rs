//! Phase Barrier Implementation
//!
//! Counts arrivals under a mutex and publishes every phase change on a `watch` channel,
//! which lets any number of async waiters block with a deadline.

use super::types::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Default)]
struct PartyRecord {
    arrived_in_phase: bool,
    arrivals: u64,
}

#[derive(Debug, Default)]
struct BarrierState {
    next_party: u64,
    parties: HashMap<PartyId, PartyRecord>,
    arrived: usize,
    phase: u64,
    terminated: bool,
}

/// Synchronization point requiring every registered party to arrive before advancing.
pub struct PhaseBarrier {
    name: String,
    state: Mutex<BarrierState>,
    hook: AdvanceHook,
    progress: watch::Sender<Progress>,
}

impl PhaseBarrier {
    /// Creates an open barrier at phase 0 with no parties.
    ///
    /// The hook runs while the internal lock is held and must not call back into the barrier.
    pub fn new(name: impl Into<String>, hook: AdvanceHook) -> Arc<Self> {
        let (progress, _) = watch::channel(Progress {
            phase: 0,
            terminated: false,
        });

        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(BarrierState::default()),
            hook,
            progress,
        })
    }

    fn state(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a party. Returns `None` once the barrier is terminal.
    pub fn register(&self) -> Option<PartyId> {
        let mut state = self.state();
        if state.terminated {
            tracing::debug!("Barrier {} is terminated, ignoring registration", self.name);
            return None;
        }

        let party = PartyId(state.next_party);
        state.next_party += 1;
        state.parties.insert(party, PartyRecord::default());

        tracing::trace!(
            "Barrier {} registered party {} ({} total)",
            self.name,
            party.0,
            state.parties.len()
        );

        Some(party)
    }

    /// Signals that `party` finished its unit of work for the current phase.
    ///
    /// Returns the phase the party arrived at, or `None` if the barrier is terminal or the
    /// party is unknown. Repeated arrivals within one phase are ignored.
    pub fn arrive(&self, party: PartyId) -> Option<u64> {
        let mut state = self.state();
        if state.terminated {
            return None;
        }

        let phase = state.phase;
        {
            let Some(record) = state.parties.get_mut(&party) else {
                tracing::warn!("Barrier {}: arrival from unknown party {}", self.name, party.0);
                return None;
            };

            if record.arrived_in_phase {
                tracing::debug!(
                    "Barrier {}: party {} already arrived in phase {}",
                    self.name,
                    party.0,
                    phase
                );
                return Some(phase);
            }

            record.arrived_in_phase = true;
            record.arrivals += 1;
        }

        state.arrived += 1;
        if state.arrived == state.parties.len() {
            self.advance(&mut state);
        }

        Some(phase)
    }

    fn advance(&self, state: &mut BarrierState) {
        let ctx = AdvanceContext {
            phase: state.phase,
            registered: state.parties.len(),
            parties_seen: state.parties.values().filter(|r| r.arrivals > 0).count(),
        };

        tracing::info!(
            "Barrier {} advancing -> registered: {} arrived: {} phase: {}",
            self.name,
            ctx.registered,
            state.arrived,
            ctx.phase
        );

        let decision = (self.hook)(&ctx);

        state.arrived = 0;
        for record in state.parties.values_mut() {
            record.arrived_in_phase = false;
        }
        state.phase += 1;

        if decision == AdvanceDecision::Terminate {
            tracing::info!("Barrier {} terminated at phase {}", self.name, state.phase);
            state.terminated = true;
        }

        self.progress.send_replace(Progress {
            phase: state.phase,
            terminated: state.terminated,
        });
    }

    /// Waits until the phase moves past `from_phase` or the barrier terminates.
    ///
    /// Returns immediately if either is already the case.
    pub async fn await_advance(&self, from_phase: u64, timeout: Duration) -> AwaitOutcome {
        let mut rx = self.progress.subscribe();

        let waited = tokio::time::timeout(
            timeout,
            rx.wait_for(|p| p.terminated || p.phase != from_phase),
        )
        .await;

        match waited {
            Ok(Ok(progress)) => {
                let progress = *progress;
                if progress.terminated {
                    AwaitOutcome::Terminated
                } else {
                    AwaitOutcome::Advanced {
                        phase: progress.phase,
                    }
                }
            }
            // The sender lives as long as the barrier, so a closed channel means teardown.
            Ok(Err(_)) => AwaitOutcome::Terminated,
            Err(_) => AwaitOutcome::TimedOut,
        }
    }

    /// Resolves once the barrier is terminal, however long that takes.
    pub async fn terminated(&self) {
        let mut rx = self.progress.subscribe();
        // The sender lives as long as the barrier, so the channel cannot close while we wait.
        let _ = rx.wait_for(|p| p.terminated).await;
    }

    /// Marks the barrier terminal and wakes all waiters.
    ///
    /// Returns `false` if it was already terminal, in which case nothing changes.
    pub fn force_terminate(&self) -> bool {
        let mut state = self.state();
        if state.terminated {
            return false;
        }

        state.terminated = true;
        tracing::warn!(
            "Barrier {} force-terminated at phase {} ({}/{} arrived)",
            self.name,
            state.phase,
            state.arrived,
            state.parties.len()
        );

        self.progress.send_replace(Progress {
            phase: state.phase,
            terminated: true,
        });

        true
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> u64 {
        self.state().phase
    }

    pub fn is_terminated(&self) -> bool {
        self.state().terminated
    }

    pub fn registered_parties(&self) -> usize {
        self.state().parties.len()
    }

    pub fn arrived_parties(&self) -> usize {
        self.state().arrived
    }

    /// Total arrivals recorded for `party` since creation.
    pub fn arrivals_of(&self, party: PartyId) -> u64 {
        self.state()
            .parties
            .get(&party)
            .map(|r| r.arrivals)
            .unwrap_or(0)
    }
}
