// ================================================================
// File: rolegate-common/src/error.rs
// ================================================================

use thiserror::Error;

/// Coarse classification of a failed game-platform call.
///
/// Decided once by the platform client from the HTTP status, so callers
/// (the inventory scanner in particular) match on this instead of
/// re-reading error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    /// Private inventory, access denied (401/403).
    Forbidden,
    /// Bad request or unknown asset category (400).
    InvalidRequest,
    /// Too many requests (429).
    RateLimited,
    Other,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Typed game-platform failures:
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),
}

impl Error {
    pub fn kind(&self) -> PlatformErrorKind {
        match self {
            Error::Forbidden(_) => PlatformErrorKind::Forbidden,
            Error::BadRequest(_) => PlatformErrorKind::InvalidRequest,
            Error::RateLimited(_) => PlatformErrorKind::RateLimited,
            _ => PlatformErrorKind::Other,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_variant() {
        assert_eq!(Error::Forbidden("private".into()).kind(), PlatformErrorKind::Forbidden);
        assert_eq!(Error::BadRequest("bad type".into()).kind(), PlatformErrorKind::InvalidRequest);
        assert_eq!(Error::RateLimited("429".into()).kind(), PlatformErrorKind::RateLimited);
        assert_eq!(Error::Platform("HTTP 500".into()).kind(), PlatformErrorKind::Other);
        assert_eq!(Error::NotFound("user".into()).kind(), PlatformErrorKind::Other);
    }
}
