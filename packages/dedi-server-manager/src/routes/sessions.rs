use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};
use shared::models::session::SessionId;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/{session_id}", post(open_session).delete(close_session))
        .route("/sessions/{session_id}/detached", post(transport_detached))
        .route(
            "/sessions/{session_id}/messages/{message_type}",
            post(handle_message),
        )
}

async fn open_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> StatusCode {
    state.message_service.session_opened(SessionId(session_id));
    StatusCode::OK
}

async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> StatusCode {
    state.message_service.session_closed(SessionId(session_id));
    StatusCode::OK
}

async fn transport_detached(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> StatusCode {
    state.message_service.transport_detached(SessionId(session_id));
    StatusCode::OK
}

/// An empty body is read as JSON `null`, since `logout` carries nothing.
async fn handle_message(
    State(state): State<AppState>,
    Path((session_id, message_type)): Path<(Uuid, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidBody(e.to_string()))?
    };

    if !state
        .message_service
        .handle_message(SessionId(session_id), &message_type, body)
    {
        return Err(ApiError::UnknownMessageType(message_type));
    }

    debug!(
        "Message queued: session_id={}, message_type={}",
        session_id, message_type
    );
    Ok(StatusCode::ACCEPTED)
}
