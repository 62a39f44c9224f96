use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::match_type::MatchType;
use crate::models::server::ServerRecord;
use crate::repositories::errors::server_pool_errors::ServerPoolError;

#[derive(Debug, Default)]
struct PoolState {
    by_id: HashMap<Uuid, ServerRecord>,
    by_type: HashMap<MatchType, BTreeSet<Uuid>>,
}

/// Registry of live dedicated servers.
///
/// Both indexes sit behind one lock. Every method is synchronous so the lock
/// can never be held across an await point.
#[derive(Debug, Default)]
pub struct ServerPool {
    state: Mutex<PoolState>,
}

impl ServerPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, server_id: Uuid, match_type: MatchType, launch_data: Value) {
        let mut state = self.lock();
        if state.by_id.contains_key(&server_id) {
            warn!("Server already registered: server_id={}", server_id);
            return;
        }

        state
            .by_id
            .insert(server_id, ServerRecord::new(server_id, match_type, launch_data));
        state.by_type.entry(match_type).or_default().insert(server_id);
        info!(
            "Registered server: server_id={}, match_type={}",
            server_id, match_type
        );
    }

    /// First server of `match_type`, in id order, with a free slot.
    pub fn find_joinable(&self, match_type: MatchType) -> Option<(Uuid, Value)> {
        let state = self.lock();
        let ids = state.by_type.get(&match_type)?;

        ids.iter()
            .filter_map(|id| state.by_id.get(id))
            .find(|record| record.has_room())
            .map(|record| (record.server_id, record.launch_data.clone()))
    }

    pub fn add_player(&self, server_id: Uuid, account_id: &str) -> Result<(), ServerPoolError> {
        let mut state = self.lock();
        let Some(record) = state.by_id.get_mut(&server_id) else {
            warn!(
                "Player joined unknown server: server_id={}, account_id={}",
                server_id, account_id
            );
            return Ok(());
        };

        if record.roster.contains(account_id) {
            debug!(
                "Player already on server: server_id={}, account_id={}",
                server_id, account_id
            );
            return Ok(());
        }

        if !record.has_room() {
            return Err(ServerPoolError::CapacityExceeded {
                server_id,
                capacity: record.match_type.capacity(),
            });
        }

        record.roster.insert(account_id.to_string());
        info!(
            "Player joined server: server_id={}, account_id={}, players={}",
            server_id,
            account_id,
            record.roster.len()
        );
        Ok(())
    }

    pub fn remove_player(&self, server_id: Uuid, account_id: &str) {
        let mut state = self.lock();
        let Some(record) = state.by_id.get_mut(&server_id) else {
            warn!(
                "Player left unknown server: server_id={}, account_id={}",
                server_id, account_id
            );
            return;
        };

        if record.roster.remove(account_id) {
            info!(
                "Player left server: server_id={}, account_id={}, players={}",
                server_id,
                account_id,
                record.roster.len()
            );
        }
    }

    /// Removes a server that posted its final result, or returns `None` if
    /// the id is not registered. Lookup and removal happen under one lock.
    pub fn try_retire(&self, server_id: Uuid) -> Option<ServerRecord> {
        let retired = {
            let mut state = self.lock();
            let record = state.by_id.remove(&server_id);
            if let Some(record) = &record {
                let now_empty = match state.by_type.get_mut(&record.match_type) {
                    Some(ids) => {
                        ids.remove(&server_id);
                        ids.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    state.by_type.remove(&record.match_type);
                }
            }
            record
        };

        if let Some(record) = &retired {
            info!(
                "Retired server: server_id={}, match_type={}",
                server_id, record.match_type
            );
        }
        retired
    }

    /// Like [`ServerPool::try_retire`] for callers that know the server is
    /// registered.
    ///
    /// # Panics
    ///
    /// Panics if `server_id` is not registered. Results are posted once per
    /// server, so an unknown id means the caller's bookkeeping is broken.
    pub fn retire(&self, server_id: Uuid) -> ServerRecord {
        match self.try_retire(server_id) {
            Some(record) => record,
            None => panic!("retire called for unknown server {}", server_id),
        }
    }

    pub fn get(&self, server_id: Uuid) -> Option<ServerRecord> {
        self.lock().by_id.get(&server_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let state = self.lock();
        for (id, record) in &state.by_id {
            assert!(record.roster.len() <= record.match_type.capacity());
            assert!(state
                .by_type
                .get(&record.match_type)
                .is_some_and(|ids| ids.contains(id)));
        }
        for (match_type, ids) in &state.by_type {
            assert!(!ids.is_empty());
            for id in ids {
                assert_eq!(state.by_id.get(id).map(|r| r.match_type), Some(*match_type));
            }
        }
    }
}
