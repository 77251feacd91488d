//! Image descriptors and image-change requests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use storefront_core::ValueObject;

/// A remotely stored image: where it is served from, and the opaque key the blob store
/// needs to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageRef {
    pub remote_url: String,
    pub deletion_key: String,
}

impl ImageRef {
    pub fn new(remote_url: impl Into<String>, deletion_key: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            deletion_key: deletion_key.into(),
        }
    }
}

impl ValueObject for ImageRef {}

/// An uploaded file handed over by the transport layer, still on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub content_type: Option<String>,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component, used as a hint when naming the remote object.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// What an update does with an entity's images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageUpdate {
    /// Leave the current images untouched.
    #[default]
    Keep,
    /// Upload these files and supersede every current image.
    Upload(Vec<LocalFile>),
    /// Replace the image list with exactly these already-owned descriptors.
    Retain(Vec<ImageRef>),
}

impl ImageUpdate {
    /// Normalizes the transport's optional inputs: new files win over descriptors, and
    /// an empty file list counts as "no files".
    pub fn from_parts(files: Option<Vec<LocalFile>>, descriptors: Option<Vec<ImageRef>>) -> Self {
        match (files, descriptors) {
            (Some(files), _) if !files.is_empty() => ImageUpdate::Upload(files),
            (_, Some(descriptors)) => ImageUpdate::Retain(descriptors),
            _ => ImageUpdate::Keep,
        }
    }
}
