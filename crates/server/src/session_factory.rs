use std::sync::Arc;

use tracing::warn;

use crate::auth::{JwtSessionVerifier, SessionVerifier, StaticSessionVerifier};
use crate::config::SessionsConfig;
use crate::error::ServerError;

/// Create the session credential verifier selected by `[sessions] backend`.
pub fn create_session_verifier(
    config: &SessionsConfig,
) -> Result<Arc<dyn SessionVerifier>, ServerError> {
    let verifier: Arc<dyn SessionVerifier> = match config.backend.as_str() {
        "static" => {
            let verifier = StaticSessionVerifier::from_config(&config.credentials);
            if verifier.is_empty() {
                warn!("static session backend has no credentials; only download tokens will work");
            }
            Arc::new(verifier)
        }
        "jwt" => {
            let secret = config
                .jwt_secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ServerError::Config("jwt session backend requires [sessions] jwt_secret".into())
                })?;
            Arc::new(JwtSessionVerifier::new(secret))
        }
        other => {
            return Err(ServerError::Config(format!(
                "unknown sessions backend: {other}"
            )));
        }
    };
    Ok(verifier)
}
