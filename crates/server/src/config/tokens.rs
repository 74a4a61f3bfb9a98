use chrono::TimeDelta;
use serde::Deserialize;
use wicket_token::{DEFAULT_TTL_SECONDS, SigningKey, SigningKeySet, TokenCodec, TokenError};

/// A named HMAC key for signing/verifying download tokens (config representation).
#[derive(Debug, Deserialize)]
pub struct SigningKeyConfig {
    /// Key identifier (e.g. `"k1"`, `"k2"`).
    pub id: String,
    /// Hex- or base64-encoded HMAC secret.
    pub secret: String,
}

/// Download token configuration.
#[derive(Debug, Deserialize)]
pub struct TokensConfig {
    /// Lifetime of issued tokens in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Hex- or base64-encoded HMAC secret.
    ///
    /// If neither this nor `signing_keys` is set, a random secret is
    /// generated on startup (tokens will not survive server restarts).
    pub signing_secret: Option<String>,
    /// Named HMAC keys. The first key signs; all keys verify, which lets a
    /// new key be introduced while tokens signed by the old one are still
    /// outstanding. Removing a key invalidates every token it signed.
    ///
    /// Takes precedence over `signing_secret` when set.
    pub signing_keys: Option<Vec<SigningKeyConfig>>,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            signing_secret: None,
            signing_keys: None,
        }
    }
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECONDS
}

impl TokensConfig {
    /// Resolve the signing key set.
    ///
    /// Precedence: `env_secret` (from `WICKET_SIGNING_SECRET`), then
    /// `signing_keys`, then `signing_secret`, then a generated key. The
    /// returned flag is `true` when the key was generated.
    pub fn key_set(&self, env_secret: Option<&str>) -> Result<(SigningKeySet, bool), TokenError> {
        if let Some(secret) = env_secret {
            let key = SigningKey::from_encoded("env", secret)?;
            return Ok((SigningKeySet::from_single(key), false));
        }
        if let Some(ref key_configs) = self.signing_keys {
            let keys = key_configs
                .iter()
                .map(|kc| SigningKey::from_encoded(kc.id.clone(), &kc.secret))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok((SigningKeySet::new(keys)?, false));
        }
        if let Some(ref secret) = self.signing_secret {
            let key = SigningKey::from_encoded("k0", secret)?;
            return Ok((SigningKeySet::from_single(key), false));
        }
        Ok((SigningKeySet::ephemeral(), true))
    }

    /// Token lifetime as a [`TimeDelta`].
    pub fn ttl(&self) -> Result<TimeDelta, TokenError> {
        i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| TokenError::InvalidTtl(format!("{} seconds", self.ttl_seconds)))
    }

    /// Build the token codec from this configuration.
    pub fn codec(&self, env_secret: Option<&str>) -> Result<(TokenCodec, bool), TokenError> {
        let (keys, generated) = self.key_set(env_secret)?;
        Ok((TokenCodec::new(keys, self.ttl()?)?, generated))
    }
}
