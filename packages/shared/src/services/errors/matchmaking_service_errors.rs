use crate::models::matchmaking::requests::RequestValidationError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchmakingServiceError {
    ValidationError(RequestValidationError),
    AccessDenied,
    AlreadyRequested,
    Timeout,
    MatchmakingError,
}

impl MatchmakingServiceError {
    /// Response code and message sent back to the client.
    pub fn response(&self) -> (u16, &'static str) {
        match self {
            MatchmakingServiceError::ValidationError(RequestValidationError::MissingFields) => {
                (400, "Missing required fields.")
            }
            MatchmakingServiceError::ValidationError(RequestValidationError::InvalidArguments) => {
                (400, "Invalid arguments.")
            }
            MatchmakingServiceError::AccessDenied => (400, "Access denied for this account."),
            MatchmakingServiceError::AlreadyRequested => (400, "Already requested."),
            MatchmakingServiceError::Timeout => (400, "Timed out."),
            MatchmakingServiceError::MatchmakingError => (500, "Internal server error."),
        }
    }
}

impl fmt::Display for MatchmakingServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatchmakingServiceError::ValidationError(err) => write!(f, "Validation error: {}", err),
            MatchmakingServiceError::AccessDenied => {
                write!(f, "Account is not logged in on this session")
            }
            MatchmakingServiceError::AlreadyRequested => write!(f, "Matchmaking already requested"),
            MatchmakingServiceError::Timeout => write!(f, "Matchmaking timed out"),
            MatchmakingServiceError::MatchmakingError => write!(f, "Matchmaking service error"),
        }
    }
}

impl std::error::Error for MatchmakingServiceError {}

impl From<RequestValidationError> for MatchmakingServiceError {
    fn from(err: RequestValidationError) -> Self {
        MatchmakingServiceError::ValidationError(err)
    }
}
