use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::models::match_type::MatchType;

/// A live dedicated server process and the accounts currently on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub server_id: Uuid,
    pub match_type: MatchType,
    pub launch_data: Value,
    pub roster: BTreeSet<String>,
}

impl ServerRecord {
    pub fn new(server_id: Uuid, match_type: MatchType, launch_data: Value) -> Self {
        ServerRecord {
            server_id,
            match_type,
            launch_data,
            roster: BTreeSet::new(),
        }
    }

    pub fn has_room(&self) -> bool {
        self.roster.len() < self.match_type.capacity()
    }
}
