pub mod requests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::models::match_type::MatchType;

/// Client supplied profile attached to a match request. Fields other than
/// `level` and `mmr_score` are kept so they reach the dedicated server as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub level: i64,
    pub mmr_score: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserData {
    pub fn new(level: i64, mmr_score: i64) -> Self {
        UserData {
            level,
            mmr_score,
            extra: Map::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert("level".to_string(), json!(self.level));
        object.insert("mmr_score".to_string(), json!(self.mmr_score));
        Value::Object(object)
    }
}

/// A player waiting in the matchmaking queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub account_id: String,
    pub user_data: UserData,
    pub request_time: DateTime<Utc>,
    /// Whole seconds since `request_time`, as of the last refresh.
    pub elapsed_time: i64,
}

impl PlayerEntry {
    pub fn new(account_id: &str, user_data: UserData) -> Self {
        PlayerEntry {
            account_id: account_id.to_string(),
            user_data,
            request_time: Utc::now(),
            elapsed_time: 0,
        }
    }

    pub fn refresh_elapsed(&mut self, now: DateTime<Utc>) {
        self.elapsed_time = (now - self.request_time).num_seconds().max(0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamContext {
    pub red: Vec<String>,
    pub blue: Vec<String>,
}

impl TeamContext {
    /// Greedy balancing: blue first, red whenever blue is ahead.
    pub fn assign(&mut self, account_id: &str) -> Team {
        if self.blue.len() > self.red.len() {
            self.red.push(account_id.to_string());
            Team::Red
        } else {
            self.blue.push(account_id.to_string());
            Team::Blue
        }
    }

    /// No rebalancing happens here; a leave can leave the teams uneven.
    pub fn remove(&mut self, account_id: &str) -> Option<Team> {
        if let Some(pos) = self.red.iter().position(|id| id == account_id) {
            self.red.remove(pos);
            return Some(Team::Red);
        }
        if let Some(pos) = self.blue.iter().position(|id| id == account_id) {
            self.blue.remove(pos);
            return Some(Team::Blue);
        }
        None
    }

    pub fn team_of(&self, account_id: &str) -> Option<Team> {
        if self.red.iter().any(|id| id == account_id) {
            Some(Team::Red)
        } else if self.blue.iter().any(|id| id == account_id) {
            Some(Team::Blue)
        } else {
            None
        }
    }
}

/// A match in formation. Lives only inside the matchmaking queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormingGroup {
    pub match_id: Uuid,
    pub match_type: MatchType,
    pub players: Vec<PlayerEntry>,
    pub team_context: TeamContext,
}

impl FormingGroup {
    pub fn new(match_type: MatchType) -> Self {
        FormingGroup {
            match_id: Uuid::new_v4(),
            match_type,
            players: Vec::new(),
            team_context: TeamContext::default(),
        }
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.players.iter().any(|p| p.account_id == account_id)
    }

    pub fn remove_player(&mut self, account_id: &str) -> Option<PlayerEntry> {
        let pos = self.players.iter().position(|p| p.account_id == account_id)?;
        self.team_context.remove(account_id);
        Some(self.players.remove(pos))
    }

    pub fn refresh_elapsed(&mut self, now: DateTime<Utc>) {
        for player in self.players.iter_mut() {
            player.refresh_elapsed(now);
        }
    }

    pub fn account_ids(&self) -> Vec<String> {
        self.players.iter().map(|p| p.account_id.clone()).collect()
    }
}
