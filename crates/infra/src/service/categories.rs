use storefront_catalog::{
    Category, CategoryDraft, CategoryFilter, CategoryUpdate, ImageUpdate, LocalFile, Page,
    ProductFilter, SearchTerm, paginate,
};
use storefront_core::{CatalogResult, CategoryId};

use super::{CatalogService, search_by_name};
use crate::assets::AssetStore;
use crate::document_store::{CatalogStore, DocumentStore};

impl<S: CatalogStore, A: AssetStore + 'static> CatalogService<S, A> {
    pub async fn list_categories(&self, page: u32) -> CatalogResult<Page<Category>> {
        let categories = self.store.categories().find(&CategoryFilter::default()).await?;
        Ok(paginate(categories, page, self.categories_per_page))
    }

    pub async fn get_category(&self, id: CategoryId) -> CatalogResult<Category> {
        Ok(self.store.categories().find_by_id(&id).await?)
    }

    pub async fn search_categories(&self, term: &str, page: u32) -> CatalogResult<Page<Category>> {
        let categories = self.store.categories().find(&CategoryFilter::default()).await?;
        Ok(search_by_name(
            categories,
            &SearchTerm::new(term),
            page,
            self.categories_per_page,
        ))
    }

    pub async fn create_category(&self, draft: CategoryDraft, files: &[LocalFile]) -> CatalogResult<Category> {
        self.create_document(self.store.categories(), draft, files).await
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
        images: ImageUpdate,
    ) -> CatalogResult<Category> {
        self.update_parent::<Category, _>(self.store.categories(), id, update, images)
            .await
    }

    /// Refused with `HasDependents` while any product still belongs to the category.
    pub async fn delete_category(&self, id: CategoryId) -> CatalogResult<Category> {
        let dependents = self
            .count_products(ProductFilter {
                brand: None,
                category: Some(id),
            })
            .await?;
        self.delete_parent::<Category, _>(self.store.categories(), id, dependents)
            .await
    }
}
