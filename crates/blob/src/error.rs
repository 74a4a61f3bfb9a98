use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The identifier is not a 40-character hexadecimal digest.
    #[error("malformed blob id: {0}")]
    MalformedId(String),

    /// A storage backend error occurred.
    #[error("blob storage error: {0}")]
    Storage(String),
}
