//! In-process coordination client.
//!
//! Talks directly to an `EntryStore`. Several clients can share one store to stand in for
//! several monitor processes, and a client can be taken offline or have its session
//! expired to reproduce coordination-service failures.

use super::coordination::{CoordinationError, CoordinationService, Result};
use super::store::EntryStore;
use super::types::SessionId;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct InMemoryCoordination {
    store: Arc<EntryStore>,
    session: SessionId,
    available: AtomicBool,
}

impl InMemoryCoordination {
    pub fn new(store: Arc<EntryStore>) -> Arc<Self> {
        let session = SessionId::new();
        store.touch(&session);

        Arc::new(Self {
            store,
            session,
            available: AtomicBool::new(true),
        })
    }

    /// A client over a private store whose sessions never expire in practice.
    pub fn standalone() -> Arc<Self> {
        Self::new(EntryStore::new(Duration::from_secs(u32::MAX as u64)))
    }

    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Drops this client's session server-side, as a lost connection would.
    pub fn expire_session(&self) -> usize {
        self.store.close_session(&self.session)
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CoordinationError::Unavailable(
                "in-memory coordination service is offline".to_string(),
            ))
        }
    }
}

impl CoordinationService for InMemoryCoordination {
    fn session(&self) -> &SessionId {
        &self.session
    }

    async fn create_ephemeral_entry(&self, path: &str, payload: &str) -> Result<()> {
        self.check_available()?;
        self.store.create(&self.session, path, payload)
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>> {
        self.check_available()?;
        self.store.touch(&self.session);
        Ok(self.store.children(path))
    }

    async fn entry_exists(&self, path: &str) -> Result<bool> {
        self.check_available()?;
        self.store.touch(&self.session);
        Ok(self.store.exists(path))
    }

    async fn entry_owner(&self, path: &str) -> Result<Option<SessionId>> {
        self.check_available()?;
        Ok(self.store.get(path).map(|entry| entry.session))
    }

    async fn delete_entry(&self, path: &str) -> Result<()> {
        self.check_available()?;
        self.store.delete(path)
    }

    async fn close(&self) {
        self.store.close_session(&self.session);
    }
}
