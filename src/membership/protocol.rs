//! Network Protocol Definitions
//!
//! DTOs and endpoints of the HTTP coordination service shared by monitor instances.

use super::types::SessionId;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_ENTRIES: &str = "/entries";
pub const ENDPOINT_ENTRY_EXISTS: &str = "/entries/exists";
pub const ENDPOINT_ENTRY_CHILDREN: &str = "/entries/children";
pub const ENDPOINT_ENTRY_OWNER: &str = "/entries/owner";
pub const ENDPOINT_SESSION_KEEPALIVE: &str = "/sessions/keepalive";
pub const ENDPOINT_SESSION_CLOSE: &str = "/sessions/close";

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub session: SessionId,
    pub path: String,
    pub payload: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerResponse {
    pub session: Option<SessionId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChildrenResponse {
    pub children: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionRequest {
    pub session: SessionId,
}
