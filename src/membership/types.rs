use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of one coordination-service session.
///
/// Ephemeral entries belong to the session that created them and disappear with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Address a monitor instance advertises to its peers, `host:port` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerAddress {
    pub host: String,
    pub port: u16,
}

impl PeerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("peer address '{}' is not host:port", s))?;

        if host.is_empty() {
            return Err(anyhow::anyhow!("peer address '{}' has an empty host", s));
        }

        Ok(Self {
            host: host.to_string(),
            port: port.parse()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LivenessState {
    /// The entry was last seen in the coordination service.
    Live,
    /// The last check could not find or recreate the entry.
    Missing,
    /// The entry was deleted on shutdown.
    Removed,
}

/// This process's entry in the coordination service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerRegistration {
    pub address: PeerAddress,
    pub path: String,
    /// Timestamp (ms) of the last successful create.
    pub registered_at: u64,
    pub state: LivenessState,
}

/// Returned by `PeerRegistry::register`, required to unregister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationHandle {
    pub path: String,
    pub address: PeerAddress,
    /// Set when the entry already existed under another session and was adopted. It then
    /// disappears with that session, not with ours.
    pub adopted_from: Option<SessionId>,
}

/// Result of `PeerRegistry::verify_registrations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The entry still exists.
    Present,
    /// The entry was gone and one replacement was created.
    Reregistered,
    /// Nothing to verify, `register` was never called or the entry was released.
    NotRegistered,
    /// The coordination service could not be reached.
    Unavailable,
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
