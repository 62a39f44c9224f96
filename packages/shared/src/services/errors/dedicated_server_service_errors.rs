use crate::repositories::errors::server_pool_errors::ServerPoolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedicatedServerServiceError {
    PoolError(ServerPoolError),
}

impl std::fmt::Display for DedicatedServerServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedicatedServerServiceError::PoolError(err) => write!(f, "Server pool error: {}", err),
        }
    }
}

impl std::error::Error for DedicatedServerServiceError {}

impl From<ServerPoolError> for DedicatedServerServiceError {
    fn from(err: ServerPoolError) -> Self {
        DedicatedServerServiceError::PoolError(err)
    }
}
