use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;

use crate::error::BlobError;
use crate::store::BlobStore;
use crate::types::{Blob, BlobId};

/// In-memory [`BlobStore`] backed by a [`DashMap`].
///
/// Reads never block each other. The async trait methods return
/// immediately.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    data: DashMap<BlobId, Blob>,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, data: Bytes, suggested_name: Option<String>) -> Result<BlobId, BlobError> {
        let blob = Blob::new(data, suggested_name);
        let id = blob.id.clone();
        let size = blob.size();
        // Content addressing: an existing entry already holds identical bytes.
        self.data.entry(id.clone()).or_insert(blob);
        debug!(blob_id = %id, size, "blob stored");
        Ok(id)
    }

    async fn get(&self, id: &BlobId) -> Result<Option<Blob>, BlobError> {
        Ok(self.data.get(id).map(|entry| entry.value().clone()))
    }

    async fn contains(&self, id: &BlobId) -> Result<bool, BlobError> {
        Ok(self.data.contains_key(id))
    }
}
