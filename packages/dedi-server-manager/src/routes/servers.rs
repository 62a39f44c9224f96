use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/servers/{server_id}/players/{account_id}",
            post(player_joined).delete(player_left),
        )
        .route("/servers/{server_id}/result", post(result_posted))
        .route("/servers/{server_id}/callback", post(custom_callback))
}

#[derive(Debug, Deserialize)]
pub struct ResultPosted {
    #[serde(default)]
    pub result_data: Value,
    pub success: bool,
}

async fn player_joined(
    State(state): State<AppState>,
    Path((server_id, account_id)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .dedicated_server_service
        .on_player_joined(server_id, &account_id)?;
    Ok(StatusCode::OK)
}

async fn player_left(
    State(state): State<AppState>,
    Path((server_id, account_id)): Path<(Uuid, String)>,
) -> StatusCode {
    state
        .dedicated_server_service
        .on_player_left(server_id, &account_id);
    StatusCode::OK
}

async fn result_posted(
    State(state): State<AppState>,
    Path(server_id): Path<Uuid>,
    Json(payload): Json<ResultPosted>,
) -> Result<StatusCode, ApiError> {
    let Some(record) = state.dedicated_server_service.on_result_posted(
        server_id,
        &payload.result_data,
        payload.success,
    ) else {
        error!("Result posted for unknown server: server_id={}", server_id);
        return Err(ApiError::UnknownServer(server_id));
    };
    info!(
        "Server retired: server_id={}, match_type={}, players={}",
        record.server_id,
        record.match_type,
        record.roster.len()
    );
    Ok(StatusCode::OK)
}

async fn custom_callback(
    State(state): State<AppState>,
    Path(server_id): Path<Uuid>,
    Json(data): Json<Value>,
) -> StatusCode {
    state
        .dedicated_server_service
        .on_custom_callback(server_id, &data);
    StatusCode::OK
}
