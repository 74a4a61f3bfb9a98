//! The download authorization decision procedure.
//!
//! Every download request resolves to exactly one [`Decision`]. The
//! procedure holds no state between requests: it is a function of the
//! requested blob id, the presented credentials, and the current instant.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use wicket_blob::BlobId;
use wicket_token::{ScopedDownloadToken, TokenCodec, TokenError};

use crate::auth::SessionVerifier;

/// How an authorized caller proved their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantSource {
    /// A blob-scoped download token from the `access_token` query parameter.
    Token,
    /// The general session credential from the `Authorization` header.
    Session,
}

/// A successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub user: String,
    pub blob_id: BlobId,
    pub via: GrantSource,
}

/// Why a caller was not authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// Neither a session credential nor a download token was presented.
    NoCredentials,
    /// The session credential was rejected by the verifier.
    InvalidSession,
    /// The download token could not be parsed.
    MalformedToken,
    /// The download token parsed but failed verification.
    Token(TokenError),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => f.write_str("missing authentication credentials"),
            Self::InvalidSession => f.write_str("invalid session credential"),
            // Parse details are not echoed to the client.
            Self::MalformedToken | Self::Token(_) => f.write_str("invalid access token"),
        }
    }
}

/// Outcome of authorizing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Authorized(Grant),
    /// The blob id is malformed; rejected before any credential is examined.
    BadRequest(String),
    Unauthorized(DenyReason),
}

/// Outcome of a token issuance request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issuance {
    Issued(ScopedDownloadToken),
    BadRequest(String),
    Unauthorized(DenyReason),
}

/// Decides whether a caller may download a blob, and mints scoped tokens for
/// callers holding a valid session credential.
pub struct DownloadAuthorizer {
    codec: Arc<TokenCodec>,
    sessions: Arc<dyn SessionVerifier>,
}

impl DownloadAuthorizer {
    pub fn new(codec: Arc<TokenCodec>, sessions: Arc<dyn SessionVerifier>) -> Self {
        Self { codec, sessions }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authorize a download of `raw_blob_id`.
    ///
    /// A non-empty `access_token` takes precedence over the session
    /// credential: when one is offered it alone decides the outcome. An
    /// empty token is the same as no token.
    pub async fn authorize(
        &self,
        raw_blob_id: &str,
        credential: Option<&str>,
        access_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Decision {
        let blob_id = match BlobId::parse(raw_blob_id) {
            Ok(id) => id,
            Err(e) => return Decision::BadRequest(e.to_string()),
        };

        if let Some(raw_token) = access_token.filter(|t| !t.is_empty()) {
            return self.authorize_token(blob_id, raw_token, now);
        }

        let Some(credential) = credential else {
            debug!(%blob_id, "download denied: no credentials");
            return Decision::Unauthorized(DenyReason::NoCredentials);
        };
        match self.sessions.verify(credential).await {
            Some(session) => Decision::Authorized(Grant {
                user: session.user,
                blob_id,
                via: GrantSource::Session,
            }),
            None => {
                debug!(%blob_id, "download denied: invalid session credential");
                Decision::Unauthorized(DenyReason::InvalidSession)
            }
        }
    }

    fn authorize_token(&self, blob_id: BlobId, raw_token: &str, now: DateTime<Utc>) -> Decision {
        let wire = match TokenCodec::deserialize(raw_token) {
            Ok(wire) => wire,
            Err(e) => {
                debug!(%blob_id, reason = %e, "download denied: malformed token");
                return Decision::Unauthorized(DenyReason::MalformedToken);
            }
        };

        let token = wire.bind(blob_id.clone());
        match self.codec.verify(&token, None, &blob_id, now) {
            Ok(()) => Decision::Authorized(Grant {
                user: token.user,
                blob_id,
                via: GrantSource::Token,
            }),
            Err(e) => {
                debug!(%blob_id, user = %token.user, reason = %e, "download denied: token rejected");
                Decision::Unauthorized(DenyReason::Token(e))
            }
        }
    }

    /// Mint a download token for `raw_blob_id`.
    ///
    /// Requires a valid session credential; a download token cannot be used
    /// to obtain another one.
    pub async fn issue(
        &self,
        raw_blob_id: &str,
        credential: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Issuance, TokenError> {
        let blob_id = match BlobId::parse(raw_blob_id) {
            Ok(id) => id,
            Err(e) => return Ok(Issuance::BadRequest(e.to_string())),
        };
        let Some(credential) = credential else {
            return Ok(Issuance::Unauthorized(DenyReason::NoCredentials));
        };
        let Some(session) = self.sessions.verify(credential).await else {
            debug!(%blob_id, "token issuance denied: invalid session credential");
            return Ok(Issuance::Unauthorized(DenyReason::InvalidSession));
        };

        let token = self.codec.issue(&session.user, &blob_id, now)?;
        info!(
            user = %token.user,
            %blob_id,
            expires_at = %token.expires_at,
            "download token issued"
        );
        Ok(Issuance::Issued(token))
    }
}
