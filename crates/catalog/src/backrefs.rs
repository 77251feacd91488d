//! Back-reference index: which products each brand and category should own.
//!
//! Product documents are the source of truth. The index is rebuilt from them and diffed
//! against the `products` sets stored on the parents to drive repairs.

use std::collections::{BTreeMap, BTreeSet};

use storefront_core::{BrandId, CategoryId, ProductId};

use crate::brand::Brand;
use crate::category::Category;
use crate::product::Product;

/// Difference between a parent's stored product set and the expected one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDiff {
    /// Expected but not stored (needs a set-add).
    pub missing: Vec<ProductId>,
    /// Stored but not expected (needs a set-remove).
    pub stale: Vec<ProductId>,
}

impl SetDiff {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty()
    }

    fn between(expected: Option<&BTreeSet<ProductId>>, actual: &BTreeSet<ProductId>) -> Self {
        let empty = BTreeSet::new();
        let expected = expected.unwrap_or(&empty);
        Self {
            missing: expected.difference(actual).copied().collect(),
            stale: actual.difference(expected).copied().collect(),
        }
    }
}

/// Parent id → expected child ids, derived from product documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackReferenceIndex {
    brands: BTreeMap<BrandId, BTreeSet<ProductId>>,
    categories: BTreeMap<CategoryId, BTreeSet<ProductId>>,
}

impl BackReferenceIndex {
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut index = Self::default();
        for product in products {
            index
                .brands
                .entry(product.brand)
                .or_default()
                .insert(product.id);
            index
                .categories
                .entry(product.category)
                .or_default()
                .insert(product.id);
        }
        index
    }

    pub fn brand_products(&self, brand: &BrandId) -> Option<&BTreeSet<ProductId>> {
        self.brands.get(brand)
    }

    pub fn category_products(&self, category: &CategoryId) -> Option<&BTreeSet<ProductId>> {
        self.categories.get(category)
    }

    pub fn diff_brand(&self, brand: &Brand) -> SetDiff {
        SetDiff::between(self.brands.get(&brand.id), &brand.products)
    }

    pub fn diff_category(&self, category: &Category) -> SetDiff {
        SetDiff::between(self.categories.get(&category.id), &category.products)
    }

    /// Products whose brand or category is not among the known parents. These cannot be
    /// repaired by editing back-references.
    pub fn orphans(
        &self,
        known_brands: &BTreeSet<BrandId>,
        known_categories: &BTreeSet<CategoryId>,
    ) -> BTreeSet<ProductId> {
        let by_brand = self
            .brands
            .iter()
            .filter(|(id, _)| !known_brands.contains(id))
            .flat_map(|(_, products)| products.iter().copied());
        let by_category = self
            .categories
            .iter()
            .filter(|(id, _)| !known_categories.contains(id))
            .flat_map(|(_, products)| products.iter().copied());
        by_brand.chain(by_category).collect()
    }
}
