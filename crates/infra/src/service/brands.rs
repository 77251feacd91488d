use storefront_catalog::{
    Brand, BrandDraft, BrandFilter, BrandUpdate, ImageUpdate, LocalFile, Page, Product,
    ProductFilter, SearchTerm, paginate,
};
use storefront_core::{BrandId, CatalogError, CatalogResult};

use super::{CatalogService, search_by_name};
use crate::assets::AssetStore;
use crate::document_store::{CatalogStore, DocumentStore};

impl<S: CatalogStore, A: AssetStore + 'static> CatalogService<S, A> {
    pub async fn list_brands(&self, page: u32) -> CatalogResult<Page<Brand>> {
        let brands = self.store.brands().find(&BrandFilter::default()).await?;
        Ok(paginate(brands, page, self.brands_per_page))
    }

    pub async fn get_brand(&self, id: BrandId) -> CatalogResult<Brand> {
        Ok(self.store.brands().find_by_id(&id).await?)
    }

    pub async fn search_brands(&self, term: &str, page: u32) -> CatalogResult<Page<Brand>> {
        let brands = self.store.brands().find(&BrandFilter::default()).await?;
        Ok(search_by_name(brands, &SearchTerm::new(term), page, self.brands_per_page))
    }

    pub async fn create_brand(&self, draft: BrandDraft, files: &[LocalFile]) -> CatalogResult<Brand> {
        self.create_document(self.store.brands(), draft, files).await
    }

    pub async fn update_brand(&self, id: BrandId, update: BrandUpdate, images: ImageUpdate) -> CatalogResult<Brand> {
        self.update_parent::<Brand, _>(self.store.brands(), id, update, images)
            .await
    }

    /// Refused with `HasDependents` while any product still belongs to the brand.
    pub async fn delete_brand(&self, id: BrandId) -> CatalogResult<Brand> {
        let dependents = self
            .count_products(ProductFilter {
                brand: Some(id),
                category: None,
            })
            .await?;
        self.delete_parent::<Brand, _>(self.store.brands(), id, dependents)
            .await
    }

    /// The brand's products, resolved from its back-reference set.
    pub async fn brand_products(&self, id: BrandId) -> CatalogResult<Vec<Product>> {
        let brand = self.store.brands().find_by_id(&id).await?;
        let ids: Vec<_> = brand.products.into_iter().collect();
        Ok(self.store.products().find_existing(&ids).await?)
    }

    /// Products of every brand whose category label equals `label`.
    pub async fn products_by_brand_label(&self, label: &str) -> CatalogResult<Vec<Product>> {
        let brands = self
            .store
            .brands()
            .find(&BrandFilter {
                category_label: Some(label.to_string()),
            })
            .await?;
        if brands.is_empty() {
            return Err(CatalogError::not_found("brand", format!("category label {label:?}")));
        }

        let ids: Vec<_> = brands.into_iter().flat_map(|b| b.products).collect();
        Ok(self.store.products().find_existing(&ids).await?)
    }
}
