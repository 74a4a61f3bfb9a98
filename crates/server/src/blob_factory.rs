use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use wicket_blob::{BlobStore, MemoryBlobStore};

use crate::config::BlobsConfig;
use crate::error::ServerError;

/// Create the blob store, seeding it from `[blobs] directory` when set.
pub async fn create_blob_store(config: &BlobsConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    let store = MemoryBlobStore::new();
    if let Some(dir) = config.directory.as_deref() {
        let loaded = seed_from_directory(&store, Path::new(dir)).await?;
        info!(directory = dir, blobs = loaded, "blob store seeded");
    }
    Ok(Arc::new(store))
}

/// Store every regular file in `dir`, suggesting its file name.
async fn seed_from_directory(store: &MemoryBlobStore, dir: &Path) -> Result<usize, ServerError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        ServerError::Config(format!("cannot read blob directory {}: {e}", dir.display()))
    })?;

    let mut loaded = 0;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let data = tokio::fs::read(entry.path()).await?;
        let id = store.put(Bytes::from(data), Some(name.clone())).await?;
        debug!(blob_id = %id, file = %name, "seeded blob");
        loaded += 1;
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use wicket_blob::BlobId;

    use super::*;

    #[tokio::test]
    async fn no_directory_gives_empty_store() {
        let store = create_blob_store(&BlobsConfig::default()).await.unwrap();
        let id = BlobId::for_content(b"hello");
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeds_files_with_their_names() {
        let dir = std::env::temp_dir().join(format!("wicket-seed-{}", std::process::id()));
        tokio::fs::create_dir_all(dir.join("nested")).await.unwrap();
        tokio::fs::write(dir.join("hello.txt"), b"hello").await.unwrap();
        tokio::fs::write(dir.join("nested").join("skipped.txt"), b"skip")
            .await
            .unwrap();

        let config = BlobsConfig {
            directory: Some(dir.to_string_lossy().into_owned()),
        };
        let store = create_blob_store(&config).await.unwrap();

        let blob = store
            .get(&BlobId::for_content(b"hello"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(blob.data.as_ref(), b"hello");
        assert_eq!(blob.suggested_name.as_deref(), Some("hello.txt"));
        assert!(
            !store
                .contains(&BlobId::for_content(b"skip"))
                .await
                .unwrap()
        );

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_directory_is_config_error() {
        let config = BlobsConfig {
            directory: Some("/nonexistent/wicket/blobs".into()),
        };
        assert!(matches!(
            create_blob_store(&config).await,
            Err(ServerError::Config(_))
        ));
    }
}
