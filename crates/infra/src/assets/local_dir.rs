use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use storefront_catalog::{ImageRef, LocalFile};

use super::r#trait::{AssetStore, AssetStoreError};

/// Blob store backed by a local directory served under `base_url`.
///
/// Objects land at `<root>/<namespace>/<folder>/<uuid>.<ext>`; the deletion key is the
/// path relative to `root`.
#[derive(Debug, Clone)]
pub struct LocalDirAssetStore {
    root: PathBuf,
    base_url: String,
    namespace: String,
}

impl LocalDirAssetStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            namespace: namespace.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, deletion_key: &str) -> Result<PathBuf, AssetStoreError> {
        let relative = Path::new(deletion_key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if deletion_key.is_empty() || escapes {
            return Err(AssetStoreError::Delete {
                deletion_key: deletion_key.to_string(),
                reason: "key escapes the asset root".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl AssetStore for LocalDirAssetStore {
    async fn upload(&self, file: &LocalFile, folder: &str) -> Result<ImageRef, AssetStoreError> {
        let object = match file.path().extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::now_v7(), ext.to_ascii_lowercase()),
            None => Uuid::now_v7().to_string(),
        };
        let deletion_key = format!("{}/{folder}/{object}", self.namespace);
        let target = self.root.join(&deletion_key);

        let upload_err = |e: std::io::Error| AssetStoreError::Upload {
            file: file.path().display().to_string(),
            reason: e.to_string(),
        };
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(upload_err)?;
        }
        tokio::fs::copy(file.path(), &target).await.map_err(upload_err)?;

        tracing::debug!(%deletion_key, target = %target.display(), "asset stored");
        Ok(ImageRef::new(format!("{}/{deletion_key}", self.base_url), deletion_key))
    }

    async fn delete(&self, deletion_key: &str) -> Result<(), AssetStoreError> {
        let target = self.resolve(deletion_key)?;
        tokio::fs::remove_file(&target).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetStoreError::NotFound {
                deletion_key: deletion_key.to_string(),
            },
            _ => AssetStoreError::Delete {
                deletion_key: deletion_key.to_string(),
                reason: e.to_string(),
            },
        })?;
        tracing::debug!(%deletion_key, "asset removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(dir: &Path, name: &str) -> LocalFile {
        let path = dir.join(name);
        std::fs::write(&path, b"not really a png").unwrap();
        LocalFile::new(path)
    }

    #[tokio::test]
    async fn upload_copies_under_namespace_and_folder() {
        let uploads = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let store = LocalDirAssetStore::new(root.path(), "http://cdn.test/assets/", "shop");

        let image = store
            .upload(&source(uploads.path(), "Shoe.PNG"), "products")
            .await
            .unwrap();

        assert!(image.deletion_key.starts_with("shop/products/"));
        assert!(image.deletion_key.ends_with(".png"));
        assert_eq!(
            image.remote_url,
            format!("http://cdn.test/assets/{}", image.deletion_key)
        );
        let stored = std::fs::read(root.path().join(&image.deletion_key)).unwrap();
        assert_eq!(stored, b"not really a png");
    }

    #[tokio::test]
    async fn delete_removes_the_copy_but_not_the_source() {
        let uploads = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let store = LocalDirAssetStore::new(root.path(), "http://cdn.test", "shop");
        let file = source(uploads.path(), "a.jpg");

        let image = store.upload(&file, "brands").await.unwrap();
        store.delete(&image.deletion_key).await.unwrap();

        assert!(!root.path().join(&image.deletion_key).exists());
        assert!(file.path().exists());
        assert!(matches!(
            store.delete(&image.deletion_key).await,
            Err(AssetStoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn missing_source_is_an_upload_error() {
        let root = tempfile::tempdir().unwrap();
        let store = LocalDirAssetStore::new(root.path(), "http://cdn.test", "shop");

        let err = store
            .upload(&LocalFile::new(root.path().join("gone.png")), "category")
            .await
            .unwrap_err();
        assert!(matches!(err, AssetStoreError::Upload { .. }));
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_root() {
        let root = tempfile::tempdir().unwrap();
        let store = LocalDirAssetStore::new(root.path(), "http://cdn.test", "shop");

        for key in ["../outside.png", "/etc/passwd", "shop/../../x", ""] {
            assert!(store.delete(key).await.is_err(), "{key}");
        }
    }
}
