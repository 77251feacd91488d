//! Document-store facing traits shared by the three catalog collections.

use std::collections::BTreeSet;

use storefront_core::{Entity, ParentRef, ProductId};

use crate::image::ImageRef;

/// A document persisted in one catalog collection.
///
/// Patches and filters are collection-specific; applying a patch is a pure, single-document
/// mutation, which is exactly the atomicity a document store is expected to provide.
pub trait Document: Entity + Clone + Send + Sync + 'static {
    /// Partial update understood by the store's `update_one`.
    type Patch: Clone + Send + Sync + core::fmt::Debug + 'static;

    /// Store-native filter understood by the store's `find`.
    type Filter: Default + Clone + Send + Sync + core::fmt::Debug + 'static;

    /// Collection name (`"products"`, `"brands"`, `"categories"`).
    const COLLECTION: &'static str;

    /// Folder hint handed to the asset store for this entity's images.
    const ASSET_FOLDER: &'static str;

    fn name(&self) -> &str;

    fn images(&self) -> &[ImageRef];

    fn apply(&mut self, patch: &Self::Patch);

    fn matches(&self, filter: &Self::Filter) -> bool;
}

/// A not-yet-persisted entity that becomes a document once its images are uploaded.
pub trait Draft: Send {
    type Document: Document;

    fn into_document(self, images: Vec<ImageRef>) -> Self::Document;
}

/// Partial update of a brand or category.
///
/// Product membership is only ever changed one id at a time (set-add / set-remove), never
/// by overwriting the whole set.
#[derive(Debug, Clone, PartialEq)]
pub enum ParentPatch<U> {
    Fields {
        update: U,
        images: Option<Vec<ImageRef>>,
    },
    AddProduct(ProductId),
    RemoveProduct(ProductId),
}

impl<U> ParentPatch<U> {
    pub(crate) fn apply_membership(&self, products: &mut BTreeSet<ProductId>) {
        match self {
            ParentPatch::AddProduct(id) => {
                products.insert(*id);
            }
            ParentPatch::RemoveProduct(id) => {
                products.remove(id);
            }
            ParentPatch::Fields { .. } => {}
        }
    }
}

/// A document that owns a back-reference set of products.
pub trait ParentDocument: Document<Patch = ParentPatch<Self::Update>> {
    /// Caller-facing field update (never carries product membership).
    type Update: Clone + Send + Sync + core::fmt::Debug + 'static;

    fn products(&self) -> &BTreeSet<ProductId>;

    fn parent_ref(&self) -> ParentRef;

    fn parent_ref_for(id: Self::Id) -> ParentRef;
}
