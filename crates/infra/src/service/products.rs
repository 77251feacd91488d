use std::collections::BTreeMap;

use tracing::info;

use storefront_catalog::{
    Brand, BrandFilter, Category, CategoryFilter, ImageUpdate, ListingFilter, ListingPage,
    LocalFile, Page, PriceSort, PricedProduct, Product, ProductDraft, ProductFilter, ProductPatch,
    ProductUpdate, SearchTerm, paginate,
};
use storefront_core::{BrandId, CatalogResult, CategoryId, ProductId};

use super::{CatalogService, DeletedProduct, ProductView, optional, require};
use crate::assets::AssetStore;
use crate::document_store::{CatalogStore, DocumentStore};
use crate::relationships::ParentChange;

impl<S: CatalogStore, A: AssetStore + 'static> CatalogService<S, A> {
    /// Storefront listing: filter, optional price sort, one page plus price bounds.
    pub async fn list_products(
        &self,
        filter: &ListingFilter,
        sort: Option<PriceSort>,
        page: u32,
    ) -> CatalogResult<ListingPage> {
        let candidates = self.store.products().find(&filter.store_filter()).await?;
        Ok(self.products.query(candidates, filter, sort, page))
    }

    pub async fn get_product(&self, id: ProductId) -> CatalogResult<ProductView> {
        let product = self.store.products().find_by_id(&id).await?;
        let (brand, category) = futures::join!(
            self.store.brands().find_by_id(&product.brand),
            self.store.categories().find_by_id(&product.category),
        );
        Ok(ProductView {
            product: PricedProduct::from(product),
            brand: optional(brand)?,
            category: optional(category)?,
        })
    }

    /// Matches the term against product name, product id, brand name and category name.
    pub async fn search_products(&self, term: &str, page: u32) -> CatalogResult<ListingPage> {
        let term = SearchTerm::new(term);
        let products = self.store.products().find(&ProductFilter::default()).await?;
        let (brand_names, category_names) = self.parent_names().await?;

        let matching: Vec<Product> = products
            .into_iter()
            .filter(|p| {
                let id = p.id.to_string();
                term.matches_any([
                    p.name.as_str(),
                    id.as_str(),
                    brand_names.get(&p.brand).map_or("", String::as_str),
                    category_names.get(&p.category).map_or("", String::as_str),
                ])
            })
            .collect();
        Ok(self
            .products
            .query(matching, &ListingFilter::default(), None, page))
    }

    /// Admin dashboard: every product with its parents resolved.
    pub async fn dashboard_products(&self, page: u32) -> CatalogResult<Page<ProductView>> {
        let products = self.store.products().find(&ProductFilter::default()).await?;
        let brands: BTreeMap<BrandId, _> = self
            .store
            .brands()
            .find(&BrandFilter::default())
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let categories: BTreeMap<CategoryId, _> = self
            .store
            .categories()
            .find(&CategoryFilter::default())
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let page = paginate(products, page, self.products.page_size());
        Ok(Page {
            data: page
                .data
                .into_iter()
                .map(|p| ProductView {
                    brand: brands.get(&p.brand).cloned(),
                    category: categories.get(&p.category).cloned(),
                    product: PricedProduct::from(p),
                })
                .collect(),
            total_pages: page.total_pages,
            total: page.total,
        })
    }

    /// Uploads the images, inserts the product, then adds it to both parents.
    ///
    /// Unknown parents are rejected before anything is uploaded. A back-reference failure
    /// after the insert is returned as `PartialUpdate`; the product stays persisted.
    pub async fn create_product(&self, draft: ProductDraft, files: &[LocalFile]) -> CatalogResult<Product> {
        require::<Brand, _>(self.store.brands(), &draft.brand).await?;
        require::<Category, _>(self.store.categories(), &draft.category).await?;

        let product = self.create_document(self.store.products(), draft, files).await?;
        self.relationships
            .attach(product.id, product.brand, product.category)
            .await?;
        Ok(product)
    }

    /// Applies field and image changes, then moves the product between parents if its
    /// brand or category changed.
    ///
    /// Superseded images are released only after the new list is persisted.
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
        images: ImageUpdate,
    ) -> CatalogResult<Product> {
        let existing = self.store.products().find_by_id(&id).await?;
        if let Some(brand) = update.brand.filter(|b| *b != existing.brand) {
            require::<Brand, _>(self.store.brands(), &brand).await?;
        }
        if let Some(category) = update.category.filter(|c| *c != existing.category) {
            require::<Category, _>(self.store.categories(), &category).await?;
        }

        let replacement = self.assets.replace_images(&existing, images).await?;
        let owner = format!("product {id}");
        let patch = ProductPatch {
            update,
            images: replacement.images.clone(),
        };
        let updated = match self.store.products().update_one(&id, &patch).await {
            Ok(product) => product,
            Err(e) => {
                self.assets.discard_uploaded(replacement, owner);
                return Err(e.into());
            }
        };
        self.assets.release_superseded(replacement, owner);
        info!(product_id = %id, "product updated");

        self.relationships
            .reparent(
                id,
                ParentChange::between(existing.brand, updated.brand),
                ParentChange::between(existing.category, updated.category),
            )
            .await?;
        Ok(updated)
    }

    /// Deletes the document, releases its images and detaches it from its parents.
    ///
    /// Image release never fails the delete, and neither does a partial detach; the
    /// latter is reported on the returned value.
    pub async fn delete_product(&self, id: ProductId) -> CatalogResult<DeletedProduct> {
        let product = self.store.products().delete_one(&id).await?;
        self.assets.release_images(&product);
        let relationship_failure = self
            .relationships
            .detach(id, product.brand, product.category)
            .await
            .err();
        info!(
            product_id = %id,
            detached = relationship_failure.is_none(),
            "product deleted"
        );
        Ok(DeletedProduct {
            product,
            relationship_failure,
        })
    }

    async fn parent_names(&self) -> CatalogResult<(BTreeMap<BrandId, String>, BTreeMap<CategoryId, String>)> {
        let (brand_filter, category_filter) = (BrandFilter::default(), CategoryFilter::default());
        let (brands, categories) = futures::join!(
            self.store.brands().find(&brand_filter),
            self.store.categories().find(&category_filter),
        );
        Ok((
            brands?.into_iter().map(|b| (b.id, b.name)).collect(),
            categories?.into_iter().map(|c| (c.id, c.name)).collect(),
        ))
    }
}
