use serde::Deserialize;

/// A user credential entry for the static session verifier.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    /// User identifier the credential proves.
    pub user: String,
    /// SHA-256 hex hash of the raw credential.
    pub credential_hash: String,
}

/// Session credential verification configuration.
#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    /// Which verifier to use: `"static"` or `"jwt"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// HS256 secret for the `"jwt"` backend.
    pub jwt_secret: Option<String>,
    /// Credential table for the `"static"` backend.
    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            jwt_secret: None,
            credentials: Vec::new(),
        }
    }
}

fn default_backend() -> String {
    "static".to_owned()
}
