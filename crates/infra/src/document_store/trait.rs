use std::sync::Arc;

use thiserror::Error;

use storefront_catalog::{Brand, Category, Document, Product};
use storefront_core::CatalogError;

/// Document store operation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The id did not resolve in its collection.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An insert collided with an existing id.
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },

    /// Storage backend failure (connection, poisoned lock, ...).
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found<D: Document>(id: &D::Id) -> Self {
        Self::NotFound {
            entity: D::KIND,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CatalogError::NotFound { entity, id },
            other => CatalogError::store(other.to_string()),
        }
    }
}

/// One collection of a document store.
///
/// Every method touches at most one document, except `find` which only reads.
#[async_trait::async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    async fn find_by_id(&self, id: &D::Id) -> Result<D, StoreError>;

    /// Documents matching `filter`, in store-native order.
    async fn find(&self, filter: &D::Filter) -> Result<Vec<D>, StoreError>;

    async fn insert(&self, doc: D) -> Result<D, StoreError>;

    /// Applies `patch` atomically to one document and returns the updated document.
    async fn update_one(&self, id: &D::Id, patch: &D::Patch) -> Result<D, StoreError>;

    /// Removes one document and returns it.
    async fn delete_one(&self, id: &D::Id) -> Result<D, StoreError>;

    /// Resolves each id in order, skipping ids that no longer exist.
    async fn find_existing(&self, ids: &[D::Id]) -> Result<Vec<D>, StoreError> {
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            match self.find_by_id(id).await {
                Ok(doc) => docs.push(doc),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(docs)
    }
}

#[async_trait::async_trait]
impl<D, S> DocumentStore<D> for Arc<S>
where
    D: Document,
    S: DocumentStore<D> + ?Sized,
{
    async fn find_by_id(&self, id: &D::Id) -> Result<D, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find(&self, filter: &D::Filter) -> Result<Vec<D>, StoreError> {
        (**self).find(filter).await
    }

    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        (**self).insert(doc).await
    }

    async fn update_one(&self, id: &D::Id, patch: &D::Patch) -> Result<D, StoreError> {
        (**self).update_one(id, patch).await
    }

    async fn delete_one(&self, id: &D::Id) -> Result<D, StoreError> {
        (**self).delete_one(id).await
    }
}

/// The catalog's document store: one collection per entity type.
pub trait CatalogStore: Send + Sync {
    type Products: DocumentStore<Product>;
    type Brands: DocumentStore<Brand>;
    type Categories: DocumentStore<Category>;

    fn products(&self) -> &Self::Products;
    fn brands(&self) -> &Self::Brands;
    fn categories(&self) -> &Self::Categories;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    type Products = S::Products;
    type Brands = S::Brands;
    type Categories = S::Categories;

    fn products(&self) -> &Self::Products {
        (**self).products()
    }

    fn brands(&self) -> &Self::Brands {
        (**self).brands()
    }

    fn categories(&self) -> &Self::Categories {
        (**self).categories()
    }
}
