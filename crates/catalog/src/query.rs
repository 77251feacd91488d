//! Discount-aware product listing: filter, sort, price bounds, paginate.
//!
//! Every step works on the derived discounted price; the raw list price is never compared
//! against a ceiling or used for ordering.

use std::num::NonZeroUsize;

use serde::Serialize;

use storefront_core::{BrandId, CategoryId};

use crate::page::paginate;
use crate::product::{Product, ProductFilter};

/// A product together with its derived discounted price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub discounted_price: f64,
}

impl From<Product> for PricedProduct {
    fn from(product: Product) -> Self {
        let discounted_price = product.discounted_price();
        Self {
            product,
            discounted_price,
        }
    }
}

/// Sort direction on the discounted price.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PriceSort {
    Ascending,
    Descending,
}

impl PriceSort {
    /// `1` → ascending, `-1` → descending, anything else → no sorting.
    pub fn from_direction(direction: i8) -> Option<Self> {
        match direction {
            1 => Some(PriceSort::Ascending),
            -1 => Some(PriceSort::Descending),
            _ => None,
        }
    }
}

/// Conjunctive listing filter. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub brand: Option<BrandId>,
    pub category: Option<CategoryId>,
    /// Inclusive upper bound on the discounted price.
    pub price_ceiling: Option<f64>,
}

impl ListingFilter {
    /// The subset of this filter a document store can evaluate natively.
    pub fn store_filter(&self) -> ProductFilter {
        ProductFilter {
            brand: self.brand,
            category: self.category,
        }
    }

    fn accepts(&self, candidate: &PricedProduct) -> bool {
        let product = &candidate.product;
        self.brand.is_none_or(|b| b == product.brand)
            && self.category.is_none_or(|c| c == product.category)
            && self
                .price_ceiling
                .is_none_or(|ceiling| candidate.discounted_price <= ceiling)
    }
}

/// One page of a product listing plus the price bounds of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
    pub page_data: Vec<PricedProduct>,
    pub total_pages: u32,
    pub total: usize,
    /// `None` when the filtered set is empty.
    pub min_price: Option<f64>,
    /// `None` when the filtered set is empty.
    pub max_price: Option<f64>,
}

/// Listing engine for one surface (its page size is fixed per surface).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CatalogQueryEngine {
    page_size: NonZeroUsize,
}

impl CatalogQueryEngine {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self { page_size }
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Runs a listing over `products`, which arrive in store-native order.
    pub fn query(
        &self,
        products: Vec<Product>,
        filter: &ListingFilter,
        sort: Option<PriceSort>,
        page: u32,
    ) -> ListingPage {
        let mut candidates: Vec<PricedProduct> = products
            .into_iter()
            .map(PricedProduct::from)
            .filter(|p| filter.accepts(p))
            .collect();

        // Stable sorts: ties keep store-native order.
        match sort {
            Some(PriceSort::Ascending) => {
                candidates.sort_by(|a, b| a.discounted_price.total_cmp(&b.discounted_price))
            }
            Some(PriceSort::Descending) => {
                candidates.sort_by(|a, b| b.discounted_price.total_cmp(&a.discounted_price))
            }
            None => {}
        }

        let (min_price, max_price) = price_bounds(&candidates);
        let page = paginate(candidates, page, self.page_size);

        ListingPage {
            page_data: page.data,
            total_pages: page.total_pages,
            total: page.total,
            min_price,
            max_price,
        }
    }
}

/// Min/max discounted price, or `(None, None)` for an empty set.
fn price_bounds(candidates: &[PricedProduct]) -> (Option<f64>, Option<f64>) {
    candidates
        .iter()
        .map(|p| p.discounted_price)
        .fold((None, None), |(min, max), price| {
            (
                Some(min.map_or(price, |m: f64| m.min(price))),
                Some(max.map_or(price, |m: f64| m.max(price))),
            )
        })
}
