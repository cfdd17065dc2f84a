//! Coordination Service Contract
//!
//! The minimal ZooKeeper-like surface the peer registry needs: ephemeral entries under a
//! path hierarchy, child listing, existence checks and deletion.

use super::types::SessionId;

use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("coordination service unavailable: {0}")]
    Unavailable(String),

    #[error("entry already exists: {0}")]
    NodeExists(String),

    #[error("no such entry: {0}")]
    NoNode(String),

    #[error("coordination protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for CoordinationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            CoordinationError::Unavailable(e.to_string())
        } else {
            CoordinationError::Protocol(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Client side of a distributed coordination service.
pub trait CoordinationService: Send + Sync + 'static {
    /// Session that owns the entries this client creates.
    fn session(&self) -> &SessionId;

    /// Creates an entry that lives as long as this client's session.
    fn create_ephemeral_entry(
        &self,
        path: &str,
        payload: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Names (last path segment) of the direct children of `path`, sorted.
    fn list_children(&self, path: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn entry_exists(&self, path: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Session owning `path`, or `None` if there is no such entry.
    fn entry_owner(&self, path: &str)
    -> impl Future<Output = Result<Option<SessionId>>> + Send;

    fn delete_entry(&self, path: &str) -> impl Future<Output = Result<()>> + Send;

    /// Ends the session and releases the connection.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

pub fn join_path(base: &str, child: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), child)
}
