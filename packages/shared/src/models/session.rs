use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::match_type::MatchType;

/// Identity of a client session, as assigned by the session gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        SessionId(id)
    }
}

/// Outstanding matchmaking request of a session, kept so the request can be
/// cancelled when the session logs out or disconnects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMatchHistory {
    pub account_id: String,
    pub match_type: MatchType,
}

/// Addressee of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRef {
    Session(SessionId),
    Account(String),
}

impl fmt::Display for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionRef::Session(id) => write!(f, "session={}", id),
            SessionRef::Account(account_id) => write!(f, "account={}", account_id),
        }
    }
}
