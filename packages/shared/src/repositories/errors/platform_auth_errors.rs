#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformAuthError {
    UnsupportedPlatform(String),
    Rejected(u16),
    Http(String),
}

impl std::fmt::Display for PlatformAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformAuthError::UnsupportedPlatform(platform) => {
                write!(f, "Unsupported platform: {}", platform)
            }
            PlatformAuthError::Rejected(status) => {
                write!(f, "Access token rejected with status {}", status)
            }
            PlatformAuthError::Http(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for PlatformAuthError {}
