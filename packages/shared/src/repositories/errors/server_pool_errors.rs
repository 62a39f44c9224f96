use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerPoolError {
    CapacityExceeded { server_id: Uuid, capacity: usize },
}

impl std::fmt::Display for ServerPoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerPoolError::CapacityExceeded {
                server_id,
                capacity,
            } => write!(
                f,
                "Server {} is already at capacity ({} players)",
                server_id, capacity
            ),
        }
    }
}

impl std::error::Error for ServerPoolError {}
