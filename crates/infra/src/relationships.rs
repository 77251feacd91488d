//! Maintenance of the `products` back-reference sets on brands and categories.
//!
//! Every mutation is a single-document set-add or set-remove. There are no cross-document
//! transactions, so a multi-step change can apply partially; that outcome is reported as
//! a [`PartialUpdateFailure`] and can be reconciled later with [`RelationshipMaintainer::repair`].

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use storefront_catalog::{
    BackReferenceIndex, Brand, BrandFilter, Category, CategoryFilter, ParentDocument, ParentPatch,
    ProductFilter,
};
use storefront_core::{
    BackRefOp, BrandId, CatalogResult, CategoryId, FailedBackRefOp, PartialUpdateFailure, ProductId,
};

use crate::document_store::{CatalogStore, DocumentStore};

/// A parent reference that changes from one document to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentChange<Id> {
    pub from: Id,
    pub to: Id,
}

impl<Id: PartialEq> ParentChange<Id> {
    /// `Some` only when the parent actually changes.
    pub fn between(from: Id, to: Id) -> Option<Self> {
        (from != to).then_some(Self { from, to })
    }
}

type Outcome = (BackRefOp, Result<(), String>);

async fn push<P, C>(collection: &C, parent: P::Id, product: ProductId) -> Outcome
where
    P: ParentDocument,
    C: DocumentStore<P> + ?Sized,
{
    let op = BackRefOp::add(P::parent_ref_for(parent));
    let outcome = collection
        .update_one(&parent, &ParentPatch::AddProduct(product))
        .await
        .map(|_| ())
        .map_err(|e| e.to_string());
    (op, outcome)
}

/// A missing parent has nothing to remove, so a not-found pull counts as applied.
async fn pull<P, C>(collection: &C, parent: P::Id, product: ProductId) -> Outcome
where
    P: ParentDocument,
    C: DocumentStore<P> + ?Sized,
{
    let op = BackRefOp::remove(P::parent_ref_for(parent));
    let outcome = match collection
        .update_one(&parent, &ParentPatch::RemoveProduct(product))
        .await
    {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!(%product, parent = %op.parent, "parent already gone; nothing to pull");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    };
    (op, outcome)
}

/// Pull from the old parent, then push to the new one. Both halves always run.
async fn move_between<P, C>(
    collection: &C,
    change: Option<ParentChange<P::Id>>,
    product: ProductId,
) -> Vec<Outcome>
where
    P: ParentDocument,
    C: DocumentStore<P> + ?Sized,
{
    match change {
        Some(ParentChange { from, to }) => vec![
            pull::<P, C>(collection, from, product).await,
            push::<P, C>(collection, to, product).await,
        ],
        None => Vec::new(),
    }
}

fn report(product: ProductId, outcomes: Vec<Outcome>, what: &str) -> Result<(), PartialUpdateFailure> {
    PartialUpdateFailure::check(product, outcomes).inspect_err(|failure| {
        let failed: Vec<String> = failure
            .failed
            .iter()
            .map(|f| format!("{}: {}", f.op, f.reason))
            .collect();
        warn!(
            product_id = %product,
            applied = failure.applied.len(),
            failed = ?failed,
            "{what} left back-references partially updated"
        );
    })
}

/// A back-reference mutation the repair pass could not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairFailure {
    pub product_id: ProductId,
    pub failure: FailedBackRefOp,
}

/// Summary of one repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Set-adds applied.
    pub added: usize,
    /// Set-removes applied (stale and dangling ids).
    pub removed: usize,
    pub failed: Vec<RepairFailure>,
    /// Products whose brand or category no longer exists.
    pub orphaned: BTreeSet<ProductId>,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.failed.is_empty() && self.orphaned.is_empty()
    }

    fn record(&mut self, product_id: ProductId, (op, outcome): Outcome) {
        match outcome {
            Ok(()) if op.action == storefront_core::BackRefAction::Add => self.added += 1,
            Ok(()) => self.removed += 1,
            Err(reason) => self.failed.push(RepairFailure {
                product_id,
                failure: FailedBackRefOp { op, reason },
            }),
        }
    }
}

/// The only writer of brand/category product sets.
pub struct RelationshipMaintainer<S: CatalogStore> {
    store: Arc<S>,
}

impl<S: CatalogStore> Clone for RelationshipMaintainer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CatalogStore> RelationshipMaintainer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adds `product` to both parents. Idempotent.
    pub async fn attach(
        &self,
        product: ProductId,
        brand: BrandId,
        category: CategoryId,
    ) -> Result<(), PartialUpdateFailure> {
        let (b, c) = futures::join!(
            push::<Brand, _>(self.store.brands(), brand, product),
            push::<Category, _>(self.store.categories(), category, product),
        );
        report(product, vec![b, c], "attach")?;
        debug!(product_id = %product, %brand, %category, "product attached");
        Ok(())
    }

    /// Moves `product` between parents. Brand and category are handled independently; a
    /// failure on one side never stops the other.
    pub async fn reparent(
        &self,
        product: ProductId,
        brand: Option<ParentChange<BrandId>>,
        category: Option<ParentChange<CategoryId>>,
    ) -> Result<(), PartialUpdateFailure> {
        if brand.is_none() && category.is_none() {
            return Ok(());
        }
        let (mut outcomes, by_category) = futures::join!(
            move_between::<Brand, _>(self.store.brands(), brand, product),
            move_between::<Category, _>(self.store.categories(), category, product),
        );
        outcomes.extend(by_category);
        report(product, outcomes, "reparent")?;
        debug!(product_id = %product, ?brand, ?category, "product reparented");
        Ok(())
    }

    /// Removes `product` from both parents.
    pub async fn detach(
        &self,
        product: ProductId,
        brand: BrandId,
        category: CategoryId,
    ) -> Result<(), PartialUpdateFailure> {
        let (b, c) = futures::join!(
            pull::<Brand, _>(self.store.brands(), brand, product),
            pull::<Category, _>(self.store.categories(), category, product),
        );
        report(product, vec![b, c], "detach")?;
        debug!(product_id = %product, %brand, %category, "product detached");
        Ok(())
    }

    /// Rebuilds the expected back-references from product documents and applies the
    /// minimal set-adds and set-removes to every brand and category.
    pub async fn repair(&self) -> CatalogResult<RepairReport> {
        let products = self.store.products().find(&ProductFilter::default()).await?;
        let brands = self.store.brands().find(&BrandFilter::default()).await?;
        let categories = self.store.categories().find(&CategoryFilter::default()).await?;
        let index = BackReferenceIndex::from_products(&products);

        let mut report = RepairReport::default();
        for brand in &brands {
            let diff = index.diff_brand(brand);
            for product in diff.missing {
                report.record(product, push::<Brand, _>(self.store.brands(), brand.id, product).await);
            }
            for product in diff.stale {
                report.record(product, pull::<Brand, _>(self.store.brands(), brand.id, product).await);
            }
        }
        for category in &categories {
            let diff = index.diff_category(category);
            for product in diff.missing {
                report.record(product, push::<Category, _>(self.store.categories(), category.id, product).await);
            }
            for product in diff.stale {
                report.record(product, pull::<Category, _>(self.store.categories(), category.id, product).await);
            }
        }

        let known_brands = brands.iter().map(|b| b.id).collect();
        let known_categories = categories.iter().map(|c| c.id).collect();
        report.orphaned = index.orphans(&known_brands, &known_categories);
        if !report.orphaned.is_empty() {
            warn!(orphaned = ?report.orphaned, "products reference missing parents");
        }

        info!(
            added = report.added,
            removed = report.removed,
            failed = report.failed.len(),
            orphaned = report.orphaned.len(),
            "back-reference repair finished"
        );
        Ok(report)
    }
}
