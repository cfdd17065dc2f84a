use super::coordination::{CoordinationError, CoordinationService, Result, join_path};
use super::types::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

pub const DEFAULT_REGISTRATION_ROOT: &str = "/kafka-availability/instances";

/// Registers this monitor with the coordination service and discovers its peers.
///
/// Entry paths are derived from the advertised address, so one instance can own at most
/// one entry and re-registering never creates duplicates.
pub struct PeerRegistry<C: CoordinationService> {
    coordination: Arc<C>,
    base_path: String,
    registration: RwLock<Option<PeerRegistration>>,
    released: AtomicBool,
}

impl<C: CoordinationService> PeerRegistry<C> {
    pub fn new(coordination: Arc<C>, base_path: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            coordination,
            base_path: base_path.into(),
            registration: RwLock::new(None),
            released: AtomicBool::new(false),
        })
    }

    pub fn entry_path(&self, address: &PeerAddress) -> String {
        join_path(&self.base_path, &address.to_string())
    }

    pub async fn registration(&self) -> Option<PeerRegistration> {
        self.registration.read().await.clone()
    }

    /// Creates this instance's ephemeral entry.
    ///
    /// An entry that already exists for the same address is adopted rather than rejected.
    /// When another session owns it, the handle records that session and a warning names it.
    pub async fn register(&self, address: &PeerAddress) -> Result<RegistrationHandle> {
        let path = self.entry_path(address);

        let adopted_from = match self
            .coordination
            .create_ephemeral_entry(&path, &address.to_string())
            .await
        {
            Ok(()) => {
                tracing::info!("Registered {} at {}", address, path);
                None
            }
            Err(CoordinationError::NodeExists(_)) => self.adopt(&path, address).await?,
            Err(e) => return Err(e),
        };

        *self.registration.write().await = Some(PeerRegistration {
            address: address.clone(),
            path: path.clone(),
            registered_at: now_ms(),
            state: LivenessState::Live,
        });

        Ok(RegistrationHandle {
            path,
            address: address.clone(),
            adopted_from,
        })
    }

    async fn adopt(&self, path: &str, address: &PeerAddress) -> Result<Option<SessionId>> {
        match self.coordination.entry_owner(path).await? {
            Some(owner) if &owner != self.coordination.session() => {
                tracing::warn!(
                    "Registration {} is owned by session {}, another instance may be advertising {}",
                    path,
                    owner.0,
                    address
                );
                Ok(Some(owner))
            }
            Some(_) => {
                tracing::debug!("Registration {} already held by this session", path);
                Ok(None)
            }
            // Expired between the create attempt and the lookup.
            None => {
                tracing::warn!("Registration {} vanished while adopting it", path);
                Ok(None)
            }
        }
    }

    pub async fn unregister(&self, handle: &RegistrationHandle) -> Result<()> {
        match self.coordination.delete_entry(&handle.path).await {
            Ok(()) => tracing::info!("Unregistered {}", handle.address),
            Err(CoordinationError::NoNode(_)) => {
                tracing::debug!("Registration {} was already gone", handle.path)
            }
            Err(e) => return Err(e),
        }

        let mut registration = self.registration.write().await;
        if registration.as_ref().is_some_and(|r| r.path == handle.path) {
            *registration = None;
        }

        Ok(())
    }

    /// Addresses of every registered instance, this one included, in sorted order.
    pub async fn list_peers(&self) -> Result<Vec<PeerAddress>> {
        let children = self.coordination.list_children(&self.base_path).await?;

        let mut peers: Vec<PeerAddress> = children
            .iter()
            .filter_map(|child| match child.parse::<PeerAddress>() {
                Ok(peer) => Some(peer),
                Err(e) => {
                    tracing::warn!("Ignoring malformed registration '{}': {}", child, e);
                    None
                }
            })
            .collect();

        peers.sort();
        Ok(peers)
    }

    /// Checks that this instance's entry survived, recreating it once if it did not.
    ///
    /// Never fails: coordination errors are logged and reported as `Unavailable`.
    pub async fn verify_registrations(&self) -> VerifyOutcome {
        let Some(current) = self.registration().await else {
            tracing::debug!("No local registration to verify");
            return VerifyOutcome::NotRegistered;
        };

        match self.coordination.entry_exists(&current.path).await {
            Ok(true) => {
                self.mark(LivenessState::Live, None).await;
                VerifyOutcome::Present
            }
            Ok(false) => {
                tracing::warn!(
                    "Registration {} missing from coordination service, re-registering",
                    current.path
                );

                match self
                    .coordination
                    .create_ephemeral_entry(&current.path, &current.address.to_string())
                    .await
                {
                    Ok(()) | Err(CoordinationError::NodeExists(_)) => {
                        self.mark(LivenessState::Live, Some(now_ms())).await;
                        tracing::info!("Re-registered {}", current.address);
                        VerifyOutcome::Reregistered
                    }
                    Err(e) => {
                        tracing::error!("Failed to re-register {}: {}", current.address, e);
                        self.mark(LivenessState::Missing, None).await;
                        VerifyOutcome::Unavailable
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to verify registration {}: {}", current.path, e);
                VerifyOutcome::Unavailable
            }
        }
    }

    async fn mark(&self, state: LivenessState, registered_at: Option<u64>) {
        if let Some(registration) = self.registration.write().await.as_mut() {
            registration.state = state;
            if let Some(at) = registered_at {
                registration.registered_at = at;
            }
        }
    }

    /// Shutdown routine: removes the registration and closes the coordination session.
    ///
    /// Only the first call does anything; it returns `false` on every later call.
    pub async fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }

        tracing::info!("Normal shutdown executing");

        let registration = self.registration.write().await.take();
        if let Some(mut registration) = registration {
            match self.coordination.delete_entry(&registration.path).await {
                Ok(()) | Err(CoordinationError::NoNode(_)) => {
                    registration.state = LivenessState::Removed;
                    tracing::info!("Removed registration {}", registration.path);
                }
                Err(e) => {
                    tracing::warn!("Failed to remove registration {}: {}", registration.path, e)
                }
            }
        }

        self.coordination.close().await;
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}
