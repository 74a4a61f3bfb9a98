use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced while issuing, parsing, or verifying download tokens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The wire string is not a well-formed token.
    #[error("malformed token: {0}")]
    Parse(String),

    /// No configured key reproduces the signature.
    #[error("token signature is invalid")]
    BadSignature,

    /// The token is bound to a different blob than the one requested.
    #[error("token is scoped to blob {bound}, not {requested}")]
    ScopeMismatch {
        /// Blob id the token carries.
        bound: String,
        /// Blob id of the request.
        requested: String,
    },

    /// The token was issued to a different user.
    #[error("token was issued to another user")]
    UserMismatch,

    /// The token expiry instant has been reached.
    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),

    /// Key material is unusable.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The configured lifetime is zero, negative, or too large.
    #[error("invalid token ttl: {0}")]
    InvalidTtl(String),

    /// Adding the lifetime to the issuance instant leaves the representable range.
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
}
