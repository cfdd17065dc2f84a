//! Ephemeral Entry Store
//!
//! Backing state for the coordination service: a flat map of paths to entries, each owned
//! by a session. Sessions that stop sending keepalives within the TTL are expired together
//! with their entries, which is what makes registrations ephemeral.

use super::coordination::{CoordinationError, Result};
use super::types::{SessionId, now_ms};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Entry {
    pub payload: String,
    pub session: SessionId,
    pub created_at: u64,
}

pub struct EntryStore {
    entries: DashMap<String, Entry>,
    sessions: DashMap<SessionId, Instant>,
    session_ttl: Duration,
}

impl EntryStore {
    pub fn new(session_ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            sessions: DashMap::new(),
            session_ttl,
        })
    }

    /// Opens or refreshes a session.
    pub fn touch(&self, session: &SessionId) {
        self.sessions.insert(session.clone(), Instant::now());
    }

    pub fn has_session(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }

    pub fn create(&self, session: &SessionId, path: &str, payload: &str) -> Result<()> {
        self.touch(session);

        match self.entries.entry(path.to_string()) {
            MapEntry::Occupied(_) => Err(CoordinationError::NodeExists(path.to_string())),
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry {
                    payload: payload.to_string(),
                    session: session.clone(),
                    created_at: now_ms(),
                });
                tracing::debug!("Created entry {} for session {}", path, session.0);
                Ok(())
            }
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<Entry> {
        self.entries.get(path).map(|e| e.value().clone())
    }

    pub fn children(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}/", path.trim_end_matches('/'));

        let mut children: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| {
                entry
                    .key()
                    .strip_prefix(&prefix)
                    .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                    .map(|rest| rest.to_string())
            })
            .collect();

        children.sort();
        children
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        match self.entries.remove(path) {
            Some(_) => Ok(()),
            None => Err(CoordinationError::NoNode(path.to_string())),
        }
    }

    /// Ends a session and drops every entry it owns. Returns the number of entries removed.
    pub fn close_session(&self, session: &SessionId) -> usize {
        self.sessions.remove(session);

        let before = self.entries.len();
        self.entries.retain(|_, entry| &entry.session != session);
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            tracing::info!(
                "Session {} closed, removed {} ephemeral entr{}",
                session.0,
                removed,
                if removed == 1 { "y" } else { "ies" }
            );
        }

        removed
    }

    /// Closes every session that has not been touched within the TTL.
    pub fn expire_stale(&self) -> Vec<SessionId> {
        let now = Instant::now();

        let stale: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| now.duration_since(*entry.value()) > self.session_ttl)
            .map(|entry| entry.key().clone())
            .collect();

        for session in &stale {
            tracing::warn!("Session {} expired (no keepalive for {:?})", session.0, self.session_ttl);
            self.close_session(session);
        }

        stale
    }

    /// Spawns the background loop that expires stale sessions.
    pub fn start_reaper(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.expire_stale();
            }
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}
