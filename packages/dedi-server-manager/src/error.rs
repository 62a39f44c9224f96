use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::repositories::errors::server_pool_errors::ServerPoolError;
use shared::services::errors::dedicated_server_service_errors::DedicatedServerServiceError;
use uuid::Uuid;

#[derive(Debug)]
pub enum ApiError {
    DedicatedServerService(DedicatedServerServiceError),
    UnknownMessageType(String),
    UnknownServer(Uuid),
    InvalidBody(String),
}

impl From<DedicatedServerServiceError> for ApiError {
    fn from(error: DedicatedServerServiceError) -> Self {
        ApiError::DedicatedServerService(error)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::DedicatedServerService(e) => write!(f, "{}", e),
            ApiError::UnknownMessageType(message_type) => {
                write!(f, "Unknown message type: {}", message_type)
            }
            ApiError::UnknownServer(server_id) => write!(f, "Unknown server: {}", server_id),
            ApiError::InvalidBody(msg) => write!(f, "Invalid body: {}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::DedicatedServerService(DedicatedServerServiceError::PoolError(
                ServerPoolError::CapacityExceeded { .. },
            )) => StatusCode::CONFLICT,
            ApiError::UnknownMessageType(_) | ApiError::UnknownServer(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}
