use serde::Deserialize;

/// Blob store configuration.
#[derive(Debug, Default, Deserialize)]
pub struct BlobsConfig {
    /// Optional directory whose regular files are loaded into the in-memory
    /// store at startup, each under its file name.
    pub directory: Option<String>,
}
