use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use storefront_catalog::{ImageRef, LocalFile};

use super::r#trait::{AssetStore, AssetStoreError};

/// Metadata kept for each stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub folder: String,
    pub source: PathBuf,
    pub remote_url: String,
}

/// In-memory blob store for tests/dev.
///
/// Objects are never read from disk; only the source path is recorded. Uploads of paths
/// registered with [`InMemoryAssetStore::fail_uploads_of`] fail, and every delete fails
/// while [`InMemoryAssetStore::set_deletes_failing`] is on.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    objects: RwLock<BTreeMap<String, StoredAsset>>,
    next_key: AtomicU64,
    failing_uploads: RwLock<BTreeSet<PathBuf>>,
    deletes_failing: AtomicBool,
    delete_attempts: AtomicU64,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads_of(&self, path: impl Into<PathBuf>) {
        if let Ok(mut failing) = self.failing_uploads.write() {
            failing.insert(path.into());
        }
    }

    pub fn set_deletes_failing(&self, failing: bool) {
        self.deletes_failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, deletion_key: &str) -> bool {
        self.objects
            .read()
            .map(|o| o.contains_key(deletion_key))
            .unwrap_or(false)
    }

    pub fn get(&self, deletion_key: &str) -> Option<StoredAsset> {
        self.objects.read().ok()?.get(deletion_key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of delete calls received, successful or not.
    pub fn delete_attempts(&self) -> u64 {
        self.delete_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn upload(&self, file: &LocalFile, folder: &str) -> Result<ImageRef, AssetStoreError> {
        let failing = self
            .failing_uploads
            .read()
            .map_err(|_| AssetStoreError::Io("lock poisoned".to_string()))?
            .contains(file.path());
        if failing {
            return Err(AssetStoreError::Upload {
                file: file.path().display().to_string(),
                reason: "rejected by blob store".to_string(),
            });
        }

        let n = self.next_key.fetch_add(1, Ordering::SeqCst) + 1;
        let deletion_key = format!("{folder}/{n:06}");
        let remote_url = format!("memory://{deletion_key}");

        let mut objects = self
            .objects
            .write()
            .map_err(|_| AssetStoreError::Io("lock poisoned".to_string()))?;
        objects.insert(
            deletion_key.clone(),
            StoredAsset {
                folder: folder.to_string(),
                source: file.path.clone(),
                remote_url: remote_url.clone(),
            },
        );

        Ok(ImageRef::new(remote_url, deletion_key))
    }

    async fn delete(&self, deletion_key: &str) -> Result<(), AssetStoreError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.deletes_failing.load(Ordering::SeqCst) {
            return Err(AssetStoreError::Delete {
                deletion_key: deletion_key.to_string(),
                reason: "blob store unavailable".to_string(),
            });
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|_| AssetStoreError::Io("lock poisoned".to_string()))?;
        match objects.remove(deletion_key) {
            Some(_) => Ok(()),
            None => Err(AssetStoreError::NotFound {
                deletion_key: deletion_key.to_string(),
            }),
        }
    }
}
