use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::match_type::MatchType;
use crate::models::matchmaking::{FormingGroup, PlayerEntry, UserData};
use crate::models::response::MATCH_MESSAGE;
use crate::models::server::ServerRecord;
use crate::models::session::SessionRef;
use crate::repositories::launch_service::{JoinRequest, LaunchRequest, LaunchService};
use crate::repositories::matchmaking_client::MatchCompletionHandler;
use crate::repositories::server_pool::ServerPool;
use crate::services::errors::dedicated_server_service_errors::DedicatedServerServiceError;
use crate::services::response_service::{ResponseService, INTERNAL_SERVER_ERROR, OK};

pub fn default_process_args() -> Vec<String> {
    vec!["HighRise?game=FFA".to_string(), "-log".to_string()]
}

pub fn launch_data_for(match_type: MatchType) -> Value {
    json!({ "match_type": match_type.as_wire() })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(Uuid),
    Spawned(Uuid),
    Failed,
}

/// Starts dedicated servers for completed groups and places single players
/// into running servers, keeping the [`ServerPool`] in step with what the
/// servers report back.
#[derive(Clone)]
pub struct DedicatedServerService {
    launcher: Arc<dyn LaunchService + Send + Sync>,
    pool: Arc<ServerPool>,
    responses: ResponseService,
    process_args: Vec<String>,
}

impl DedicatedServerService {
    pub fn new(
        launcher: Arc<dyn LaunchService + Send + Sync>,
        pool: Arc<ServerPool>,
        responses: ResponseService,
        process_args: Vec<String>,
    ) -> Self {
        DedicatedServerService {
            launcher,
            pool,
            responses,
            process_args,
        }
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }

    /// Launches a server for `players`, registers it on success and tells
    /// every player that is still connected how it went.
    pub async fn spawn_new(
        &self,
        match_id: Uuid,
        match_type: MatchType,
        launch_data: Value,
        players: &[PlayerEntry],
    ) -> bool {
        let account_ids: Vec<String> = players.iter().map(|p| p.account_id.clone()).collect();
        let user_data_list = players.iter().map(|p| p.user_data.to_json()).collect();
        let request = LaunchRequest::new(
            match_id,
            launch_data.clone(),
            self.process_args.clone(),
            account_ids.clone(),
            user_data_list,
        );

        if !self.launcher.spawn(request).await {
            error!(
                "Failed to spawn dedicated server: match_id={}, match_type={}",
                match_id, match_type
            );
            for account_id in account_ids {
                self.responses
                    .dispatch_empty(
                        SessionRef::Account(account_id),
                        MATCH_MESSAGE,
                        500,
                        INTERNAL_SERVER_ERROR,
                    )
                    .await;
            }
            return false;
        }

        self.pool.register(match_id, match_type, launch_data);
        info!(
            "Dedicated server spawned: server_id={}, match_type={}, players={}",
            match_id,
            match_type,
            account_ids.len()
        );

        let data = json!({
            "server_id": match_id,
            "match_type": match_type.as_wire(),
        });
        for account_id in account_ids {
            self.responses
                .dispatch(
                    SessionRef::Account(account_id),
                    MATCH_MESSAGE,
                    200,
                    OK,
                    data.clone(),
                )
                .await;
        }
        true
    }

    /// Puts a single player into the first running server of `match_type`
    /// with room, or a new server if there is none or the join fails.
    pub async fn try_join_then_spawn(
        &self,
        account_id: &str,
        user_data: UserData,
        match_type: MatchType,
    ) -> JoinOutcome {
        if let Some((server_id, launch_data)) = self.pool.find_joinable(match_type) {
            let request = JoinRequest::new(
                server_id,
                launch_data,
                vec![account_id.to_string()],
                vec![user_data.to_json()],
            );
            if self.launcher.send_users(request).await {
                info!(
                    "Player sent to running server: account_id={}, server_id={}",
                    account_id, server_id
                );
                return JoinOutcome::Joined(server_id);
            }
            warn!(
                "Join failed, spawning a new server: account_id={}, server_id={}",
                account_id, server_id
            );
        }

        let server_id = Uuid::new_v4();
        let player = PlayerEntry::new(account_id, user_data);
        let spawned = self
            .spawn_new(
                server_id,
                match_type,
                launch_data_for(match_type),
                std::slice::from_ref(&player),
            )
            .await;

        if spawned {
            JoinOutcome::Spawned(server_id)
        } else {
            JoinOutcome::Failed
        }
    }

    pub fn on_player_joined(
        &self,
        server_id: Uuid,
        account_id: &str,
    ) -> Result<(), DedicatedServerServiceError> {
        self.pool.add_player(server_id, account_id).map_err(|e| {
            error!(
                "Rejected player join: server_id={}, account_id={}, error={}",
                server_id, account_id, e
            );
            DedicatedServerServiceError::from(e)
        })
    }

    pub fn on_player_left(&self, server_id: Uuid, account_id: &str) {
        self.pool.remove_player(server_id, account_id);
    }

    /// Retires the server that posted a result. Returns `None` when the
    /// server is not in the pool, including a second post for the same id.
    pub fn on_result_posted(
        &self,
        server_id: Uuid,
        result_data: &Value,
        success: bool,
    ) -> Option<ServerRecord> {
        if success {
            info!(
                "Match result posted: server_id={}, result={}",
                server_id, result_data
            );
        } else {
            warn!("Match ended without a result: server_id={}", server_id);
        }
        self.pool.try_retire(server_id)
    }

    pub fn on_custom_callback(&self, server_id: Uuid, data: &Value) {
        debug!("Custom callback: server_id={}, data={}", server_id, data);
    }
}

#[async_trait]
impl MatchCompletionHandler for DedicatedServerService {
    async fn on_match_complete(&self, group: FormingGroup) {
        self.spawn_new(
            group.match_id,
            group.match_type,
            launch_data_for(group.match_type),
            &group.players,
        )
        .await;
    }
}
