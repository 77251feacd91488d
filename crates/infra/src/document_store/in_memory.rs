use std::collections::BTreeSet;
use std::sync::RwLock;

use storefront_catalog::{Brand, Category, Document, Product};

use super::r#trait::{CatalogStore, DocumentStore, StoreError};

/// In-memory collection keeping documents in insertion order.
///
/// Intended for tests/dev. Not optimized for performance. Updates to ids registered
/// with [`InMemoryCollection::fail_updates_on`] fail with a backend error, which lets
/// tests exercise partial back-reference updates.
#[derive(Debug)]
pub struct InMemoryCollection<D: Document> {
    docs: RwLock<Vec<D>>,
    failing_updates: RwLock<BTreeSet<D::Id>>,
}

impl<D: Document> Default for InMemoryCollection<D> {
    fn default() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            failing_updates: RwLock::new(BTreeSet::new()),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl<D: Document> InMemoryCollection<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `update_one` on `id` fail until [`Self::heal`] is called.
    pub fn fail_updates_on(&self, id: D::Id) {
        if let Ok(mut failing) = self.failing_updates.write() {
            failing.insert(id);
        }
    }

    pub fn heal(&self, id: &D::Id) {
        if let Ok(mut failing) = self.failing_updates.write() {
            failing.remove(id);
        }
    }

    /// Overwrites a stored document wholesale, bypassing patches. Test/repair tooling only.
    pub fn replace(&self, doc: D) -> Result<(), StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        match docs.iter_mut().find(|d| d.id() == doc.id()) {
            Some(slot) => {
                *slot = doc;
                Ok(())
            }
            None => Err(StoreError::not_found::<D>(doc.id())),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl<D: Document> DocumentStore<D> for InMemoryCollection<D> {
    async fn find_by_id(&self, id: &D::Id) -> Result<D, StoreError> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        docs.iter()
            .find(|d| d.id() == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found::<D>(id))
    }

    async fn find(&self, filter: &D::Filter) -> Result<Vec<D>, StoreError> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.iter().filter(|d| d.matches(filter)).cloned().collect())
    }

    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        if docs.iter().any(|d| d.id() == doc.id()) {
            return Err(StoreError::Duplicate {
                entity: D::KIND,
                id: doc.id().to_string(),
            });
        }
        docs.push(doc.clone());
        tracing::debug!(collection = D::COLLECTION, id = %doc.id(), "document inserted");
        Ok(doc)
    }

    async fn update_one(&self, id: &D::Id, patch: &D::Patch) -> Result<D, StoreError> {
        let failing = self
            .failing_updates
            .read()
            .map_err(|_| poisoned())?
            .contains(id);
        if failing {
            return Err(StoreError::Backend(format!(
                "update of {} {id} rejected by backend",
                D::KIND
            )));
        }

        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        let doc = docs
            .iter_mut()
            .find(|d| d.id() == id)
            .ok_or_else(|| StoreError::not_found::<D>(id))?;
        doc.apply(patch);
        tracing::debug!(collection = D::COLLECTION, %id, "document updated");
        Ok(doc.clone())
    }

    async fn delete_one(&self, id: &D::Id) -> Result<D, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        let pos = docs
            .iter()
            .position(|d| d.id() == id)
            .ok_or_else(|| StoreError::not_found::<D>(id))?;
        let removed = docs.remove(pos);
        tracing::debug!(collection = D::COLLECTION, %id, "document deleted");
        Ok(removed)
    }
}

/// In-memory catalog store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    products: InMemoryCollection<Product>,
    brands: InMemoryCollection<Brand>,
    categories: InMemoryCollection<Category>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    type Products = InMemoryCollection<Product>;
    type Brands = InMemoryCollection<Brand>;
    type Categories = InMemoryCollection<Category>;

    fn products(&self) -> &Self::Products {
        &self.products
    }

    fn brands(&self) -> &Self::Brands {
        &self.brands
    }

    fn categories(&self) -> &Self::Categories {
        &self.categories
    }
}
