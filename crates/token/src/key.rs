use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::{OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::TokenError;

/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Length of generated secrets in bytes.
const GENERATED_SECRET_LEN: usize = 32;

/// A named HMAC secret, zeroized when dropped.
///
/// The [`Debug`] implementation only shows the key id.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    kid: String,
    secret: Vec<u8>,
}

impl SigningKey {
    /// Build a key from raw secret bytes.
    pub fn new(kid: impl Into<String>, secret: Vec<u8>) -> Result<Self, TokenError> {
        let kid = kid.into();
        if kid.is_empty() {
            return Err(TokenError::InvalidKey("key id must not be empty".to_owned()));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::InvalidKey(format!(
                "key {kid}: secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }
        Ok(Self { kid, secret })
    }

    /// Parse a secret encoded as hex, falling back to base64.
    pub fn from_encoded(kid: impl Into<String>, raw: &str) -> Result<Self, TokenError> {
        let kid = kid.into();
        let trimmed = raw.trim();
        if trimmed.len() % 2 == 0
            && let Ok(bytes) = hex::decode(trimmed)
        {
            return Self::new(kid, bytes);
        }
        if let Ok(bytes) = B64.decode(trimmed) {
            return Self::new(kid, bytes);
        }
        Err(TokenError::InvalidKey(format!(
            "key {kid}: secret must be hex or base64"
        )))
    }

    /// Generate a fresh random key.
    pub fn generate(kid: impl Into<String>) -> Self {
        let mut secret = vec![0u8; GENERATED_SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        Self {
            kid: kid.into(),
            secret,
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Ordered set of signing keys. Index 0 is the current signing key; every
/// key is accepted during verification so tokens signed before a rotation
/// stay valid until they expire.
#[derive(Debug, Clone)]
pub struct SigningKeySet {
    keys: Vec<SigningKey>,
}

impl SigningKeySet {
    /// Create a key set. Fails if `keys` is empty or key ids repeat.
    pub fn new(keys: Vec<SigningKey>) -> Result<Self, TokenError> {
        if keys.is_empty() {
            return Err(TokenError::InvalidKey(
                "at least one signing key is required".to_owned(),
            ));
        }
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].iter().any(|k| k.kid == key.kid) {
                return Err(TokenError::InvalidKey(format!(
                    "duplicate key id {}",
                    key.kid
                )));
            }
        }
        Ok(Self { keys })
    }

    /// Key set holding a single key.
    pub fn from_single(key: SigningKey) -> Self {
        Self { keys: vec![key] }
    }

    /// Key set holding one freshly generated key. Tokens it signs do not
    /// survive a restart.
    pub fn ephemeral() -> Self {
        Self::from_single(SigningKey::generate("k0"))
    }

    /// The current signing key.
    pub fn current(&self) -> &SigningKey {
        &self.keys[0]
    }

    pub fn all(&self) -> &[SigningKey] {
        &self.keys
    }
}
