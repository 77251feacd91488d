//! Integration tests for the full catalog write/read path.
//!
//! Tests: CatalogService → AssetLifecycleManager → CatalogStore → RelationshipMaintainer
//!
//! Verifies:
//! - Back-references follow products through create, reparent and delete
//! - Image uploads and releases line up with document writes
//! - Partial back-reference failures are surfaced and repairable
//! - Listing, search and pagination semantics

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::num::NonZeroUsize;
    use std::sync::Arc;

    use storefront_catalog::{
        Brand, BrandDraft, BrandUpdate, Category, CategoryDraft, Discount, ImageUpdate,
        ListingFilter, LocalFile, ParentPatch, Price, PriceSort, Product, ProductDraft,
        ProductUpdate,
    };
    use storefront_core::{BackRefOp, BrandId, CatalogError, CategoryId, ParentRef, ProductId};

    use crate::assets::InMemoryAssetStore;
    use crate::config::CatalogConfig;
    use crate::document_store::{CatalogStore, DocumentStore, InMemoryCatalogStore};
    use crate::service::CatalogService;

    type Service = CatalogService<InMemoryCatalogStore, InMemoryAssetStore>;

    struct Harness {
        store: Arc<InMemoryCatalogStore>,
        assets: Arc<InMemoryAssetStore>,
        service: Service,
    }

    fn setup() -> Harness {
        setup_with(CatalogConfig::default())
    }

    fn setup_with(config: CatalogConfig) -> Harness {
        storefront_observability::init_with_default("error");
        let store = Arc::new(InMemoryCatalogStore::new());
        let assets = Arc::new(InMemoryAssetStore::new());
        let service = CatalogService::new(Arc::clone(&store), Arc::clone(&assets), &config);
        Harness {
            store,
            assets,
            service,
        }
    }

    fn files(names: &[impl AsRef<str>]) -> Vec<LocalFile> {
        names
            .iter()
            .map(|n| LocalFile::new(format!("/uploads/{}", n.as_ref())))
            .collect()
    }

    fn product_draft(name: &str, price: f64, discount: u8, brand: BrandId, category: CategoryId) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Price::new(price).unwrap(),
            discount: Discount::new(discount).unwrap(),
            colors: vec![],
            brand,
            category,
        }
    }

    impl Harness {
        async fn brand(&self, name: &str, label: &str) -> Brand {
            self.service
                .create_brand(
                    BrandDraft {
                        name: name.to_string(),
                        category_label: label.to_string(),
                    },
                    &files(&[format!("{name}.png")]),
                )
                .await
                .unwrap()
        }

        async fn category(&self, name: &str) -> Category {
            self.service
                .create_category(
                    CategoryDraft {
                        name: name.to_string(),
                    },
                    &files(&[format!("{name}.png")]),
                )
                .await
                .unwrap()
        }

        async fn product(&self, name: &str, price: f64, discount: u8, brand: BrandId, category: CategoryId) -> Product {
            self.service
                .create_product(
                    product_draft(name, price, discount, brand, category),
                    &files(&[format!("{name}-1.png"), format!("{name}-2.png")]),
                )
                .await
                .unwrap()
        }

        async fn brand_set(&self, id: BrandId) -> BTreeSet<ProductId> {
            self.store.brands().find_by_id(&id).await.unwrap().products
        }

        async fn category_set(&self, id: CategoryId) -> BTreeSet<ProductId> {
            self.store.categories().find_by_id(&id).await.unwrap().products
        }
    }

    #[tokio::test]
    async fn create_attaches_product_to_both_parents() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;

        let p = h.product("Dome", 300.0, 0, b.id, c.id).await;

        assert_eq!(p.images.len(), 2);
        assert!(p.images.iter().all(|i| h.assets.contains(&i.deletion_key)));
        assert_eq!(h.brand_set(b.id).await, BTreeSet::from([p.id]));
        assert_eq!(h.category_set(c.id).await, BTreeSet::from([p.id]));
    }

    #[tokio::test]
    async fn create_without_files_writes_nothing() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let assets_before = h.assets.len();

        let err = h
            .service
            .create_product(product_draft("Dome", 300.0, 0, b.id, c.id), &[])
            .await
            .unwrap_err();

        assert_eq!(err, CatalogError::NoImagesProvided);
        assert!(h.store.products().is_empty());
        assert_eq!(h.assets.len(), assets_before);
        assert!(h.brand_set(b.id).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_parent_is_rejected_before_upload() {
        let h = setup();
        let c = h.category("Tents").await;
        let assets_before = h.assets.len();

        let err = h
            .service
            .create_product(
                product_draft("Dome", 300.0, 0, BrandId::new(), c.id),
                &files(&["dome.png"]),
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(h.assets.len(), assets_before);
        assert!(h.store.products().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_aborts_create_and_releases_the_batch() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let assets_before = h.assets.len();
        h.assets.fail_uploads_of("/uploads/dome-2.png");

        let err = h
            .service
            .create_product(
                product_draft("Dome", 300.0, 0, b.id, c.id),
                &files(&["dome-1.png", "dome-2.png", "dome-3.png"]),
            )
            .await
            .unwrap_err();
        h.service.janitor().settle().await;

        assert!(matches!(err, CatalogError::AssetUpload(_)));
        assert!(h.store.products().is_empty());
        assert_eq!(h.assets.len(), assets_before);
        assert!(h.brand_set(b.id).await.is_empty());
        assert!(h.category_set(c.id).await.is_empty());
    }

    #[tokio::test]
    async fn reparent_moves_product_between_brands_only() {
        let h = setup();
        let b1 = h.brand("Acme", "outdoor").await;
        let b2 = h.brand("Globex", "outdoor").await;
        let c1 = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b1.id, c1.id).await;

        let updated = h
            .service
            .update_product(
                p.id,
                ProductUpdate {
                    brand: Some(b2.id),
                    ..Default::default()
                },
                ImageUpdate::Keep,
            )
            .await
            .unwrap();

        assert_eq!(updated.brand, b2.id);
        assert_eq!(updated.images, p.images);
        assert!(h.brand_set(b1.id).await.is_empty());
        assert_eq!(h.brand_set(b2.id).await, BTreeSet::from([p.id]));
        assert_eq!(h.category_set(c1.id).await, BTreeSet::from([p.id]));
    }

    #[tokio::test]
    async fn new_images_supersede_old_ones_after_persist() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b.id, c.id).await;

        let updated = h
            .service
            .update_product(
                p.id,
                ProductUpdate::default(),
                ImageUpdate::Upload(files(&["dome-new.png"])),
            )
            .await
            .unwrap();
        h.service.janitor().settle().await;

        assert_eq!(updated.images.len(), 1);
        assert!(h.assets.contains(&updated.images[0].deletion_key));
        assert!(p.images.iter().all(|i| !h.assets.contains(&i.deletion_key)));
        assert_eq!(h.service.janitor().stats().deleted, 2);
    }

    #[tokio::test]
    async fn retained_descriptors_replace_the_list_without_upload() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b.id, c.id).await;
        let assets_before = h.assets.len();

        let updated = h
            .service
            .update_product(
                p.id,
                ProductUpdate::default(),
                ImageUpdate::Retain(vec![p.images[1].clone()]),
            )
            .await
            .unwrap();
        h.service.janitor().settle().await;

        assert_eq!(updated.images, vec![p.images[1].clone()]);
        assert_eq!(h.assets.len(), assets_before - 1);
        assert!(!h.assets.contains(&p.images[0].deletion_key));
    }

    #[tokio::test]
    async fn failed_push_during_reparent_is_reported() {
        let h = setup();
        let b1 = h.brand("Acme", "outdoor").await;
        let b2 = h.brand("Globex", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b1.id, c.id).await;
        h.store.brands().fail_updates_on(b2.id);

        let err = h
            .service
            .update_product(
                p.id,
                ProductUpdate {
                    brand: Some(b2.id),
                    ..Default::default()
                },
                ImageUpdate::Keep,
            )
            .await
            .unwrap_err();

        let failure = match err {
            CatalogError::PartialUpdate(failure) => failure,
            other => panic!("expected a partial update, got {other:?}"),
        };
        assert_eq!(failure.product_id, p.id);
        assert_eq!(failure.applied, vec![BackRefOp::remove(ParentRef::Brand(b1.id))]);
        assert_eq!(failure.failed[0].op, BackRefOp::add(ParentRef::Brand(b2.id)));

        // The document change stands; only the back-references are behind.
        let stored = h.store.products().find_by_id(&p.id).await.unwrap();
        assert_eq!(stored.brand, b2.id);

        h.store.brands().heal(&b2.id);
        let report = h.service.repair_back_references().await.unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(h.brand_set(b2.id).await, BTreeSet::from([p.id]));
    }

    #[tokio::test]
    async fn failed_push_during_create_keeps_the_product() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        h.store.brands().fail_updates_on(b.id);

        let err = h
            .service
            .create_product(
                product_draft("Dome", 300.0, 0, b.id, c.id),
                &files(&["dome.png"]),
            )
            .await
            .unwrap_err();

        let failure = match err {
            CatalogError::PartialUpdate(failure) => failure,
            other => panic!("expected a partial update, got {other:?}"),
        };
        assert_eq!(failure.applied, vec![BackRefOp::add(ParentRef::Category(c.id))]);
        assert_eq!(failure.failed.len(), 1);
        assert_eq!(failure.failed[0].op, BackRefOp::add(ParentRef::Brand(b.id)));

        let stored = h.store.products().find_by_id(&failure.product_id).await.unwrap();
        assert_eq!(stored.brand, b.id);
        assert!(stored.images.iter().all(|i| h.assets.contains(&i.deletion_key)));
        assert!(h.brand_set(b.id).await.is_empty());
        assert_eq!(h.category_set(c.id).await, BTreeSet::from([stored.id]));

        h.store.brands().heal(&b.id);
        let report = h.service.repair_back_references().await.unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(h.brand_set(b.id).await, BTreeSet::from([stored.id]));
    }

    #[tokio::test]
    async fn retain_with_repeated_descriptor_is_rejected() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b.id, c.id).await;
        let first = p.images[0].clone();

        let err = h
            .service
            .update_product(
                p.id,
                ProductUpdate::default(),
                ImageUpdate::Retain(vec![first.clone(), first]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
        let stored = h.store.products().find_by_id(&p.id).await.unwrap();
        assert_eq!(stored.images, p.images);
    }

    #[tokio::test]
    async fn delete_detaches_even_when_image_deletes_fail() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b.id, c.id).await;
        h.assets.set_deletes_failing(true);

        let deleted = h.service.delete_product(p.id).await.unwrap();
        h.service.janitor().settle().await;

        assert_eq!(deleted.product.id, p.id);
        assert!(deleted.relationship_failure.is_none());
        assert!(h.brand_set(b.id).await.is_empty());
        assert!(h.category_set(c.id).await.is_empty());
        assert!(h.service.get_product(p.id).await.unwrap_err().is_not_found());

        let stats = h.service.janitor().stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.pending_retry, 2);

        h.assets.set_deletes_failing(false);
        assert_eq!(h.service.janitor().retry_failed().await, 2);
        assert!(p.images.iter().all(|i| !h.assets.contains(&i.deletion_key)));
    }

    #[tokio::test]
    async fn delete_reports_partial_detach_but_succeeds() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b.id, c.id).await;
        h.store.categories().fail_updates_on(c.id);

        let deleted = h.service.delete_product(p.id).await.unwrap();

        let failure = deleted.relationship_failure.expect("partial detach");
        assert_eq!(failure.applied, vec![BackRefOp::remove(ParentRef::Brand(b.id))]);
        assert_eq!(failure.failed[0].op, BackRefOp::remove(ParentRef::Category(c.id)));
        assert!(h.store.products().is_empty());

        h.store.categories().heal(&c.id);
        let report = h.service.repair_back_references().await.unwrap();
        assert_eq!(report.removed, 1);
        assert!(h.category_set(c.id).await.is_empty());
    }

    #[tokio::test]
    async fn listing_filters_and_sorts_on_discounted_price() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p90 = h.product("Ninety", 100.0, 10, b.id, c.id).await;

        let within = |ceiling| ListingFilter {
            price_ceiling: Some(ceiling),
            ..Default::default()
        };
        let page = h.service.list_products(&within(90.0), None, 1).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.page_data[0].product.id, p90.id);
        assert_eq!(page.page_data[0].discounted_price, 90.0);
        let page = h.service.list_products(&within(80.0), None, 1).await.unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!((page.min_price, page.max_price), (None, None));

        h.service.delete_product(p90.id).await.unwrap();
        for (name, price) in [("Fifty", 50.0), ("Thirty", 30.0), ("Seventy", 70.0)] {
            h.product(name, price, 0, b.id, c.id).await;
        }
        for (direction, expected) in [
            (1, vec![30.0, 50.0, 70.0]),
            (-1, vec![70.0, 50.0, 30.0]),
            (0, vec![50.0, 30.0, 70.0]),
        ] {
            let page = h
                .service
                .list_products(&ListingFilter::default(), PriceSort::from_direction(direction), 1)
                .await
                .unwrap();
            let prices: Vec<f64> = page.page_data.iter().map(|p| p.discounted_price).collect();
            assert_eq!(prices, expected, "direction {direction}");
        }
    }

    #[tokio::test]
    async fn listing_paginates_with_the_configured_page_size() {
        let h = setup_with(CatalogConfig {
            products_per_page: NonZeroUsize::new(2).unwrap(),
            ..CatalogConfig::default()
        });
        let b = h.brand("Acme", "outdoor").await;
        let other = h.brand("Globex", "kitchen").await;
        let c = h.category("Tents").await;
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(h.product(&format!("p{i}"), 10.0 + i as f64, 0, b.id, c.id).await.id);
        }
        h.product("elsewhere", 1.0, 0, other.id, c.id).await;

        let filter = ListingFilter {
            brand: Some(b.id),
            ..Default::default()
        };
        let third = h.service.list_products(&filter, None, 3).await.unwrap();
        assert_eq!(third.total_pages, 3);
        assert_eq!(third.total, 5);
        assert_eq!(third.page_data.len(), 1);
        assert_eq!(third.page_data[0].product.id, ids[4]);
        assert_eq!((third.min_price, third.max_price), (Some(10.0), Some(14.0)));

        let fourth = h.service.list_products(&filter, None, 4).await.unwrap();
        assert!(fourth.page_data.is_empty());
        assert_eq!(fourth.total_pages, 3);
    }

    #[tokio::test]
    async fn search_matches_names_of_products_and_parents() {
        let h = setup();
        let acme = h.brand("Acme", "outdoor").await;
        let globex = h.brand("Globex", "kitchen").await;
        let tents = h.category("Tents").await;
        let pans = h.category("Frying Pans").await;
        let dome = h.product("Dome", 300.0, 0, acme.id, tents.id).await;
        let skillet = h.product("Skillet", 40.0, 0, globex.id, pans.id).await;

        let by_brand = h.service.search_products("ACME", 1).await.unwrap();
        assert_eq!(by_brand.page_data.len(), 1);
        assert_eq!(by_brand.page_data[0].product.id, dome.id);

        let by_category = h.service.search_products("pan", 1).await.unwrap();
        assert_eq!(by_category.page_data[0].product.id, skillet.id);

        let by_id = h.service.search_products(&skillet.id.to_string(), 1).await.unwrap();
        assert_eq!(by_id.total, 1);

        // Pattern characters are literal.
        assert_eq!(h.service.search_products("d.me", 1).await.unwrap().total, 0);

        let brands = h.service.search_brands("glob", 1).await.unwrap();
        assert_eq!(brands.data.iter().map(|b| b.id).collect::<Vec<_>>(), vec![globex.id]);
        let categories = h.service.search_categories("TENT", 1).await.unwrap();
        assert_eq!(categories.data.iter().map(|c| c.id).collect::<Vec<_>>(), vec![tents.id]);
    }

    #[tokio::test]
    async fn product_views_resolve_parents() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 200.0, 25, b.id, c.id).await;

        let view = h.service.get_product(p.id).await.unwrap();
        assert_eq!(view.product.discounted_price, 150.0);
        assert_eq!(view.brand.map(|b| b.name), Some("Acme".to_string()));
        assert_eq!(view.category.map(|c| c.name), Some("Tents".to_string()));

        let dashboard = h.service.dashboard_products(1).await.unwrap();
        assert_eq!(dashboard.total, 1);
        assert_eq!(dashboard.data[0].brand.as_ref().map(|b| b.id), Some(b.id));

        // A parent removed behind the service's back shows up as absent.
        h.store.brands().delete_one(&b.id).await.unwrap();
        let view = h.service.get_product(p.id).await.unwrap();
        assert!(view.brand.is_none());
        assert!(view.category.is_some());
    }

    #[tokio::test]
    async fn parents_with_products_cannot_be_deleted() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b.id, c.id).await;

        let err = h.service.delete_brand(b.id).await.unwrap_err();
        assert!(matches!(err, CatalogError::HasDependents { entity: "brand", count: 1, .. }));
        let err = h.service.delete_category(c.id).await.unwrap_err();
        assert!(matches!(err, CatalogError::HasDependents { entity: "category", .. }));

        h.service.delete_product(p.id).await.unwrap();
        let removed = h.service.delete_brand(b.id).await.unwrap();
        h.service.delete_category(c.id).await.unwrap();
        h.service.janitor().settle().await;

        assert!(!h.assets.contains(&removed.images[0].deletion_key));
        assert!(h.assets.is_empty());
        assert!(h.service.get_brand(b.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn brand_updates_keep_membership() {
        let h = setup();
        let b = h.brand("Acme", "outdoor").await;
        let c = h.category("Tents").await;
        let p = h.product("Dome", 300.0, 0, b.id, c.id).await;

        let updated = h
            .service
            .update_brand(
                b.id,
                BrandUpdate {
                    name: Some("Acme Outdoor".to_string()),
                    category_label: None,
                },
                ImageUpdate::Upload(files(&["acme-v2.png"])),
            )
            .await
            .unwrap();
        h.service.janitor().settle().await;

        assert_eq!(updated.name, "Acme Outdoor");
        assert_eq!(updated.category_label, "outdoor");
        assert_eq!(updated.products, BTreeSet::from([p.id]));
        assert!(!h.assets.contains(&b.images[0].deletion_key));

        let err = h
            .service
            .update_category(
                c.id,
                Default::default(),
                ImageUpdate::Retain(vec![b.images[0].clone()]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn brand_product_lookups() {
        let h = setup();
        let acme = h.brand("Acme", "outdoor").await;
        let initech = h.brand("Initech", "outdoor").await;
        let globex = h.brand("Globex", "kitchen").await;
        let c = h.category("Misc").await;
        let a = h.product("a", 1.0, 0, acme.id, c.id).await;
        let i = h.product("i", 1.0, 0, initech.id, c.id).await;
        h.product("g", 1.0, 0, globex.id, c.id).await;

        let own = h.service.brand_products(acme.id).await.unwrap();
        assert_eq!(own.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a.id]);

        let outdoor: BTreeSet<_> = h
            .service
            .products_by_brand_label("outdoor")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(outdoor, BTreeSet::from([a.id, i.id]));

        let err = h.service.products_by_brand_label("garden").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn listings_of_parents_are_paginated() {
        let h = setup_with(CatalogConfig {
            brands_per_page: NonZeroUsize::new(2).unwrap(),
            categories_per_page: NonZeroUsize::new(1).unwrap(),
            ..CatalogConfig::default()
        });
        for name in ["A", "B", "C"] {
            h.brand(name, "x").await;
        }
        let c1 = h.category("One").await;
        h.category("Two").await;

        let brands = h.service.list_brands(2).await.unwrap();
        assert_eq!(brands.total, 3);
        assert_eq!(brands.total_pages, 2);
        assert_eq!(brands.data.len(), 1);

        let categories = h.service.list_categories(0).await.unwrap();
        assert_eq!(categories.data.iter().map(|c| c.id).collect::<Vec<_>>(), vec![c1.id]);
        assert_eq!(categories.total_pages, 2);
    }

    #[tokio::test]
    async fn repair_restores_invariants_after_corruption() {
        let h = setup();
        let b1 = h.brand("Acme", "outdoor").await;
        let b2 = h.brand("Globex", "outdoor").await;
        let c = h.category("Tents").await;
        let p1 = h.product("p1", 1.0, 0, b1.id, c.id).await;
        let p2 = h.product("p2", 1.0, 0, b2.id, c.id).await;

        // Drop p1 from its brand and duplicate p2 into the wrong one.
        h.store
            .brands()
            .update_one(&b1.id, &ParentPatch::RemoveProduct(p1.id))
            .await
            .unwrap();
        h.store
            .brands()
            .update_one(&b1.id, &ParentPatch::AddProduct(p2.id))
            .await
            .unwrap();
        h.store
            .categories()
            .update_one(&c.id, &ParentPatch::RemoveProduct(p2.id))
            .await
            .unwrap();

        let report = h.service.repair_back_references().await.unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(report.removed, 1);

        for p in [&p1, &p2] {
            assert!(h.brand_set(p.brand).await.contains(&p.id));
            assert!(h.category_set(p.category).await.contains(&p.id));
        }
        assert_eq!(h.brand_set(b1.id).await, BTreeSet::from([p1.id]));
        assert!(h.service.repair_back_references().await.unwrap().is_clean());
    }
}
