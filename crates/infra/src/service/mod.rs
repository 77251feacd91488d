//! `CatalogService`: the operations the transport layer calls.
//!
//! Writes run in a fixed order: images first, then the document, then back-references.
//! Reads go store → query engine → pagination.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use storefront_catalog::{
    Brand, CatalogQueryEngine, Category, Document, Draft, ImageUpdate, LocalFile, Page,
    ParentDocument, ParentPatch, PricedProduct, Product, ProductFilter, SearchTerm, paginate,
};
use storefront_core::{CatalogError, CatalogResult, Entity, PartialUpdateFailure};

use crate::assets::{AssetJanitor, AssetLifecycleManager, AssetStore};
use crate::config::CatalogConfig;
use crate::document_store::{CatalogStore, DocumentStore, StoreError};
use crate::relationships::{RelationshipMaintainer, RepairReport};

mod brands;
mod categories;
mod products;

/// A product with its parents resolved. A parent that no longer exists is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: PricedProduct,
    pub brand: Option<Brand>,
    pub category: Option<Category>,
}

/// Result of a product delete.
///
/// The delete itself succeeded; `relationship_failure` is set when detaching from the
/// parents only partially applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedProduct {
    pub product: Product,
    pub relationship_failure: Option<PartialUpdateFailure>,
}

/// Catalog facade over a document store and a blob store.
pub struct CatalogService<S: CatalogStore, A: AssetStore + 'static> {
    store: Arc<S>,
    assets: AssetLifecycleManager<A>,
    relationships: RelationshipMaintainer<S>,
    products: CatalogQueryEngine,
    brands_per_page: NonZeroUsize,
    categories_per_page: NonZeroUsize,
}

impl<S: CatalogStore, A: AssetStore + 'static> CatalogService<S, A> {
    pub fn new(store: Arc<S>, assets: Arc<A>, config: &CatalogConfig) -> Self {
        Self {
            relationships: RelationshipMaintainer::new(Arc::clone(&store)),
            store,
            assets: AssetLifecycleManager::new(assets),
            products: CatalogQueryEngine::new(config.products_per_page),
            brands_per_page: config.brands_per_page,
            categories_per_page: config.categories_per_page,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn janitor(&self) -> &AssetJanitor<A> {
        self.assets.janitor()
    }

    /// Reconciles every brand and category product set with the product documents.
    pub async fn repair_back_references(&self) -> CatalogResult<RepairReport> {
        self.relationships.repair().await
    }

    /// Uploads the draft's images and inserts the resulting document. If the insert
    /// fails the uploads are released.
    async fn create_document<D, C>(&self, collection: &C, draft: D, files: &[LocalFile]) -> CatalogResult<D::Document>
    where
        D: Draft,
        C: DocumentStore<D::Document> + ?Sized,
    {
        let doc = self.assets.create_with_images(draft, files).await?;
        let images = doc.images().to_vec();
        match collection.insert(doc).await {
            Ok(doc) => {
                info!(
                    collection = <D::Document as Document>::COLLECTION,
                    id = %doc.id(),
                    images = images.len(),
                    "document created"
                );
                Ok(doc)
            }
            Err(e) => {
                self.assets.janitor().release(images, "rejected insert");
                Err(e.into())
            }
        }
    }

    /// Field and image update of a brand or category. Product membership is untouched.
    async fn update_parent<P, C>(&self, collection: &C, id: P::Id, update: P::Update, images: ImageUpdate) -> CatalogResult<P>
    where
        P: ParentDocument,
        C: DocumentStore<P> + ?Sized,
    {
        let existing = collection.find_by_id(&id).await?;
        let replacement = self.assets.replace_images(&existing, images).await?;
        let owner = format!("{} {id}", P::KIND);
        let patch = ParentPatch::Fields {
            update,
            images: replacement.images.clone(),
        };

        let updated = match collection.update_one(&id, &patch).await {
            Ok(doc) => doc,
            Err(e) => {
                self.assets.discard_uploaded(replacement, owner);
                return Err(e.into());
            }
        };
        self.assets.release_superseded(replacement, owner);
        info!(collection = P::COLLECTION, %id, "document updated");
        Ok(updated)
    }

    /// Deletes a brand or category that no product references, then releases its images.
    async fn delete_parent<P, C>(&self, collection: &C, id: P::Id, dependents: usize) -> CatalogResult<P>
    where
        P: ParentDocument,
        C: DocumentStore<P> + ?Sized,
    {
        if dependents > 0 {
            return Err(CatalogError::HasDependents {
                entity: P::KIND,
                id: id.to_string(),
                count: dependents,
            });
        }
        let removed = collection.delete_one(&id).await?;
        self.assets.release_images(&removed);
        info!(collection = P::COLLECTION, %id, "document deleted");
        Ok(removed)
    }

    async fn count_products(&self, filter: ProductFilter) -> CatalogResult<usize> {
        Ok(self.store.products().find(&filter).await?.len())
    }
}

/// Fails with the document's own `NotFound` when `id` does not resolve.
async fn require<D, C>(collection: &C, id: &D::Id) -> CatalogResult<()>
where
    D: Document,
    C: DocumentStore<D> + ?Sized,
{
    collection.find_by_id(id).await.map(|_| ()).map_err(Into::into)
}

/// Turns a not-found lookup into `None`.
fn optional<D>(result: Result<D, StoreError>) -> CatalogResult<Option<D>> {
    match result {
        Ok(doc) => Ok(Some(doc)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Name-or-id search shared by brands and categories.
fn search_by_name<D: Document>(docs: Vec<D>, term: &SearchTerm, page: u32, page_size: NonZeroUsize) -> Page<D> {
    let matching: Vec<D> = docs
        .into_iter()
        .filter(|d| term.matches_any([d.name(), d.id().to_string().as_str()]))
        .collect();
    paginate(matching, page, page_size)
}
