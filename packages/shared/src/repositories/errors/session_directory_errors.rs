#[derive(Debug)]
pub enum SessionDirectoryError {
    SessionClosed(String),
    Http(String),
    Serialization(String),
}

impl std::fmt::Display for SessionDirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionDirectoryError::SessionClosed(id) => write!(f, "Session {} is closed", id),
            SessionDirectoryError::Http(msg) => write!(f, "Session gateway error: {}", msg),
            SessionDirectoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SessionDirectoryError {}
