use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{SessionUser, SessionVerifier};
use crate::config::CredentialConfig;

/// Hash a raw credential to the lookup format (lowercase hex SHA-256).
pub fn hash_credential(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verifies credentials against a fixed `sha256_hex(credential) -> user`
/// table. Raw credentials never appear in configuration.
#[derive(Debug, Default)]
pub struct StaticSessionVerifier {
    table: HashMap<String, String>,
}

impl StaticSessionVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from configured `(user, credential_hash)` entries.
    pub fn from_config(entries: &[CredentialConfig]) -> Self {
        let table = entries
            .iter()
            .map(|e| (e.credential_hash.trim().to_ascii_lowercase(), e.user.clone()))
            .collect();
        Self { table }
    }

    /// Register a raw credential for `user`.
    #[must_use]
    pub fn with_credential(mut self, user: impl Into<String>, raw: &str) -> Self {
        self.table.insert(hash_credential(raw), user.into());
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[async_trait]
impl SessionVerifier for StaticSessionVerifier {
    async fn verify(&self, raw: &str) -> Option<SessionUser> {
        self.table.get(&hash_credential(raw)).map(|user| SessionUser {
            user: user.clone(),
            auth_method: "static".to_owned(),
        })
    }
}
