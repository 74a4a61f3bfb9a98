//! Session credential verification.
//!
//! The general session credential is issued by an external authentication
//! subsystem; this crate only verifies it. Two verifiers ship with the
//! server: a static table of hashed credentials and an HS256 JWT verifier.

pub mod jwt;
pub mod static_table;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

pub use self::jwt::JwtSessionVerifier;
pub use self::static_table::{StaticSessionVerifier, hash_credential};

/// The identity proven by a verified session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    /// User identifier.
    pub user: String,
    /// Verifier that accepted the credential (`"static"` or `"jwt"`).
    pub auth_method: String,
}

/// Verifies raw session credentials.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Return the user the credential belongs to, or `None` if it is not valid.
    async fn verify(&self, raw: &str) -> Option<SessionUser>;
}

/// Extract the raw session credential from the `Authorization` header.
///
/// The header carries the credential verbatim; a `Bearer ` prefix is
/// accepted and stripped. Empty values count as absent.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let value = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!value.is_empty()).then_some(value)
}
