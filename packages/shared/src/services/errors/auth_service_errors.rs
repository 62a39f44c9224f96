use crate::models::matchmaking::requests::RequestValidationError;
use crate::repositories::errors::platform_auth_errors::PlatformAuthError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthServiceError {
    ValidationError(RequestValidationError),
    PlatformAuthError(PlatformAuthError),
    DuplicateLogin,
    NotLoggedIn,
}

impl AuthServiceError {
    /// Response code and message sent back to the client.
    pub fn response(&self) -> (u16, &'static str) {
        match self {
            AuthServiceError::ValidationError(RequestValidationError::MissingFields) => {
                (400, "Missing required fields.")
            }
            AuthServiceError::ValidationError(RequestValidationError::InvalidArguments) => {
                (400, "Invalid arguments.")
            }
            AuthServiceError::PlatformAuthError(_) => (400, "Authentication failed."),
            AuthServiceError::DuplicateLogin => (500, "Internal server error."),
            AuthServiceError::NotLoggedIn => (400, "The user did not login."),
        }
    }
}

impl fmt::Display for AuthServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthServiceError::ValidationError(err) => write!(f, "Validation error: {}", err),
            AuthServiceError::PlatformAuthError(err) => {
                write!(f, "Platform authentication error: {}", err)
            }
            AuthServiceError::DuplicateLogin => {
                write!(f, "Account still logged in after forced logout")
            }
            AuthServiceError::NotLoggedIn => write!(f, "Session is not logged in"),
        }
    }
}

impl std::error::Error for AuthServiceError {}

impl From<RequestValidationError> for AuthServiceError {
    fn from(err: RequestValidationError) -> Self {
        AuthServiceError::ValidationError(err)
    }
}

impl From<PlatformAuthError> for AuthServiceError {
    fn from(err: PlatformAuthError) -> Self {
        AuthServiceError::PlatformAuthError(err)
    }
}
