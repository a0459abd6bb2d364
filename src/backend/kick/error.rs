use std::fmt;

/// Errors that can occur while talking to the Kick API
#[derive(Debug)]
pub enum KickError {
    /// Transport-level HTTP failure (connection refused, TLS, timeout)
    HttpError(String),

    /// Response body could not be decoded
    JsonError(String),

    /// Token endpoint rejected the credentials or returned no token
    AuthError(String),

    /// Authenticated API call returned a non-success status
    ///
    /// `status_text` is the canonical reason phrase for `status`; reqwest does
    /// not expose the phrase the server actually sent.
    RequestError { status: u16, status_text: String },

    /// Event subscription registration was rejected
    SubscriptionError(String),

    /// Configuration could not be loaded
    ConfigError(String),
}

impl KickError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            KickError::RequestError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for KickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KickError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            KickError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            KickError::AuthError(msg) => write!(f, "Authentication failed: {}", msg),
            KickError::RequestError { status, status_text } => {
                write!(f, "API request failed: {} {}", status, status_text)
            }
            KickError::SubscriptionError(msg) => write!(f, "Subscription error: {}", msg),
            KickError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for KickError {}

impl From<serde_json::Error> for KickError {
    fn from(err: serde_json::Error) -> Self {
        KickError::JsonError(err.to_string())
    }
}

impl From<reqwest::Error> for KickError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            KickError::JsonError(err.to_string())
        } else {
            KickError::HttpError(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, KickError>;
