use std::sync::Arc;

use thiserror::Error;

use storefront_catalog::{ImageRef, LocalFile};
use storefront_core::CatalogError;

/// Blob store operation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetStoreError {
    #[error("upload of {file} failed: {reason}")]
    Upload { file: String, reason: String },

    #[error("delete of {deletion_key} failed: {reason}")]
    Delete { deletion_key: String, reason: String },

    #[error("no object stored under {deletion_key}")]
    NotFound { deletion_key: String },

    #[error("asset io error: {0}")]
    Io(String),
}

impl From<AssetStoreError> for CatalogError {
    fn from(err: AssetStoreError) -> Self {
        match err {
            AssetStoreError::Delete {
                deletion_key,
                reason,
            } => CatalogError::AssetDelete {
                deletion_key,
                reason,
            },
            AssetStoreError::NotFound { deletion_key } => CatalogError::AssetDelete {
                deletion_key,
                reason: "no such object".to_string(),
            },
            other => CatalogError::asset_upload(other.to_string()),
        }
    }
}

/// Remote blob storage for images.
///
/// Uploads return a stable reference; deletes are keyed by the opaque deletion key the
/// upload handed out. Neither operation is transactional with the document store.
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, file: &LocalFile, folder: &str) -> Result<ImageRef, AssetStoreError>;

    async fn delete(&self, deletion_key: &str) -> Result<(), AssetStoreError>;
}

#[async_trait::async_trait]
impl<S> AssetStore for Arc<S>
where
    S: AssetStore + ?Sized,
{
    async fn upload(&self, file: &LocalFile, folder: &str) -> Result<ImageRef, AssetStoreError> {
        (**self).upload(file, folder).await
    }

    async fn delete(&self, deletion_key: &str) -> Result<(), AssetStoreError> {
        (**self).delete(deletion_key).await
    }
}
