use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SessionUser, SessionVerifier};

/// Claims the verifier reads from a session JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier).
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: u64,
}

/// Verifies HS256 session JWTs issued by the authentication subsystem.
///
/// Signature and `exp` are checked by `jsonwebtoken` against the wall clock.
pub struct JwtSessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl SessionVerifier for JwtSessionVerifier {
    async fn verify(&self, raw: &str) -> Option<SessionUser> {
        match decode::<Claims>(raw, &self.decoding_key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(SessionUser {
                user: data.claims.sub,
                auth_method: "jwt".to_owned(),
            }),
            Ok(_) => {
                debug!("session jwt has empty subject");
                None
            }
            Err(e) => {
                debug!(error = %e, "session jwt rejected");
                None
            }
        }
    }
}
