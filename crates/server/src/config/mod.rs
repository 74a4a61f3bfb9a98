mod blobs;
mod download;
mod server;
mod sessions;
mod tokens;

#[cfg(test)]
mod tests;

pub use blobs::*;
pub use download::*;
pub use server::*;
pub use sessions::*;
pub use tokens::*;

use serde::Deserialize;

/// Top-level configuration for the Wicket server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct WicketConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Download token signing and lifetime.
    #[serde(default)]
    pub tokens: TokensConfig,
    /// Download endpoint behavior.
    #[serde(default)]
    pub download: DownloadConfig,
    /// Session credential verification.
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Blob store seeding.
    #[serde(default)]
    pub blobs: BlobsConfig,
}
