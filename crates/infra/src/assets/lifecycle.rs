//! Image lifecycle around entity writes: upload before create, replace on update,
//! release on delete.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, warn};

use storefront_catalog::{Document, Draft, ImageRef, ImageUpdate, LocalFile};
use storefront_core::{CatalogError, CatalogResult};

use super::janitor::AssetJanitor;
use super::r#trait::{AssetStore, AssetStoreError};

/// Outcome of resolving an [`ImageUpdate`] against an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageReplacement {
    /// New image list to persist; `None` leaves the stored list untouched.
    pub images: Option<Vec<ImageRef>>,
    /// Previously owned images to release once the new list is persisted.
    pub superseded: Vec<ImageRef>,
    /// Images uploaded for this update; to be released if the persist fails.
    pub uploaded: Vec<ImageRef>,
}

impl ImageReplacement {
    fn keep() -> Self {
        Self::default()
    }
}

/// Coordinates image uploads and deletions with entity writes.
pub struct AssetLifecycleManager<A: AssetStore + 'static> {
    store: Arc<A>,
    janitor: AssetJanitor<A>,
}

impl<A: AssetStore + 'static> AssetLifecycleManager<A> {
    pub fn new(store: Arc<A>) -> Self {
        let janitor = AssetJanitor::new(Arc::clone(&store));
        Self { store, janitor }
    }

    pub fn janitor(&self) -> &AssetJanitor<A> {
        &self.janitor
    }

    /// Uploads `files` and turns the draft into a document owning them.
    ///
    /// Nothing is persisted here; the caller inserts the returned document.
    pub async fn create_with_images<D: Draft>(
        &self,
        draft: D,
        files: &[LocalFile],
    ) -> CatalogResult<D::Document> {
        if files.is_empty() {
            return Err(CatalogError::NoImagesProvided);
        }
        let images = self
            .upload_all(files, <D::Document as Document>::ASSET_FOLDER)
            .await?;
        Ok(draft.into_document(images))
    }

    /// Uploads every file concurrently and returns the references in file order.
    ///
    /// The first failure aborts the batch. Uploads that already completed, and those
    /// still running, are released by the janitor.
    pub async fn upload_all(&self, files: &[LocalFile], folder: &str) -> CatalogResult<Vec<ImageRef>> {
        let mut pending: FuturesUnordered<_> = files
            .iter()
            .cloned()
            .enumerate()
            .map(|(slot, file)| {
                let store = Arc::clone(&self.store);
                let folder = folder.to_string();
                async move { (slot, store.upload(&file, &folder).await) }
            })
            .collect();

        let mut slots: Vec<Option<ImageRef>> = vec![None; files.len()];
        while let Some((slot, result)) = pending.next().await {
            match result {
                Ok(image) => {
                    debug!(folder, deletion_key = %image.deletion_key, "image uploaded");
                    slots[slot] = Some(image);
                }
                Err(e) => {
                    warn!(folder, error = %e, "image upload failed; aborting batch");
                    self.abandon(slots.into_iter().flatten().collect(), pending, folder);
                    return Err(e.into());
                }
            }
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CatalogError::asset_upload("upload batch lost a result"))
    }

    fn abandon<F>(&self, completed: Vec<ImageRef>, still_running: FuturesUnordered<F>, folder: &str)
    where
        F: std::future::Future<Output = (usize, Result<ImageRef, AssetStoreError>)> + Send + 'static,
    {
        let owner = format!("failed {folder} batch");
        self.janitor.release(completed, &owner);
        if still_running.is_empty() {
            return;
        }
        let janitor = self.janitor.clone();
        self.janitor.track(async move {
            let late: Vec<ImageRef> = still_running
                .filter_map(|(_, result)| async move { result.ok() })
                .collect()
                .await;
            janitor.release(late, owner);
        });
    }

    /// Resolves an image update into the list to persist and the images it supersedes.
    ///
    /// `Retain` may only name images the entity already owns, each at most once; anything
    /// else is a validation error and nothing is uploaded.
    pub async fn replace_images<D: Document>(
        &self,
        existing: &D,
        update: ImageUpdate,
    ) -> CatalogResult<ImageReplacement> {
        match update {
            ImageUpdate::Keep => Ok(ImageReplacement::keep()),
            ImageUpdate::Upload(files) if files.is_empty() => Ok(ImageReplacement::keep()),
            ImageUpdate::Upload(files) => {
                let images = self.upload_all(&files, D::ASSET_FOLDER).await?;
                Ok(ImageReplacement {
                    images: Some(images.clone()),
                    superseded: existing.images().to_vec(),
                    uploaded: images,
                })
            }
            ImageUpdate::Retain(descriptors) => {
                let owned: BTreeSet<&ImageRef> = existing.images().iter().collect();
                if let Some(foreign) = descriptors.iter().find(|d| !owned.contains(d)) {
                    return Err(CatalogError::validation(format!(
                        "{} {} does not own image {}",
                        D::KIND,
                        existing.id(),
                        foreign.deletion_key
                    )));
                }
                let mut kept: BTreeSet<&ImageRef> = BTreeSet::new();
                if let Some(repeated) = descriptors.iter().find(|d| !kept.insert(*d)) {
                    return Err(CatalogError::validation(format!(
                        "image {} listed more than once",
                        repeated.deletion_key
                    )));
                }
                let superseded = existing
                    .images()
                    .iter()
                    .filter(|i| !kept.contains(i))
                    .cloned()
                    .collect();
                Ok(ImageReplacement {
                    images: Some(descriptors),
                    superseded,
                    uploaded: Vec::new(),
                })
            }
        }
    }

    /// Releases images replaced by a persisted update.
    pub fn release_superseded(&self, replacement: ImageReplacement, owner: impl Display) {
        if !replacement.superseded.is_empty() {
            self.janitor.release(replacement.superseded, owner);
        }
    }

    /// Undoes the uploads of an update whose document never got persisted.
    pub fn discard_uploaded(&self, replacement: ImageReplacement, owner: impl Display) {
        if !replacement.uploaded.is_empty() {
            self.janitor.release(replacement.uploaded, owner);
        }
    }

    /// Best-effort release of every image a deleted entity owned.
    pub fn release_images<D: Document>(&self, entity: &D) {
        let owner = format!("{} {}", D::KIND, entity.id());
        self.janitor.release(entity.images().to_vec(), owner);
    }
}
