use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;
use crate::types::{Blob, BlobId};

/// Content-addressed blob storage for extracted mail attachments.
///
/// Ids are derived from the content, so storing the same bytes twice yields
/// the same id. Stored blobs are immutable. Implementations must be safe to
/// share across concurrent requests; the download path only ever reads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` and return its content-derived id.
    ///
    /// Used by the message ingestion path. Storing content that already
    /// exists keeps the original entry.
    async fn put(&self, data: Bytes, suggested_name: Option<String>) -> Result<BlobId, BlobError>;

    /// Retrieve a blob by id. Returns `None` if it does not exist.
    async fn get(&self, id: &BlobId) -> Result<Option<Blob>, BlobError>;

    /// Check whether a blob exists without fetching its content.
    async fn contains(&self, id: &BlobId) -> Result<bool, BlobError> {
        Ok(self.get(id).await?.is_some())
    }
}
