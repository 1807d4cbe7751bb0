//! Error types for Watchtower
//!
//! Network failures are classified into a structured [`NetworkErrorKind`] at the
//! transport boundary so callers never have to inspect message strings.

/// Classification of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The call did not complete within the configured timeout
    Timeout,
    /// 401 from the remote service (token missing, expired, or invalid)
    Unauthorized,
    /// 403 from the remote service
    Forbidden,
    /// 5xx from the remote service
    ServerError,
    /// Connection failures and everything else
    Unknown,
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::ServerError => "server error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Main error type for Watchtower operations
#[derive(Debug, thiserror::Error)]
pub enum WatchtowerError {
    #[error("Network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("No location available")]
    NoLocationAvailable,

    #[error("No profile available")]
    NoProfileAvailable,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Maximum number of emergency contacts (2) reached")]
    ContactLimitExceeded,

    #[error("This contact is already added as an emergency contact")]
    DuplicateContact,

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Bad response from remote service: {0}")]
    BadResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WatchtowerError {
    /// The network classification, when this error came from a remote call
    pub fn network_kind(&self) -> Option<NetworkErrorKind> {
        match self {
            Self::Network { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

// Implement From conversions for common error types

impl From<reqwest::Error> for WatchtowerError {
    fn from(err: reqwest::Error) -> Self {
        // Non-2xx statuses are classified where the response body is read;
        // a reqwest::Error here is a transport-level failure.
        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else {
            NetworkErrorKind::Unknown
        };
        Self::Network {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for WatchtowerError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadResponse(format!("JSON error: {}", err))
    }
}

/// Map an HTTP status code to a network error kind
pub fn classify_status(status: reqwest::StatusCode) -> NetworkErrorKind {
    use reqwest::StatusCode;
    match status {
        StatusCode::UNAUTHORIZED => NetworkErrorKind::Unauthorized,
        StatusCode::FORBIDDEN => NetworkErrorKind::Forbidden,
        s if s.is_server_error() => NetworkErrorKind::ServerError,
        _ => NetworkErrorKind::Unknown,
    }
}

/// Result type alias for Watchtower operations
pub type Result<T> = std::result::Result<T, WatchtowerError>;
