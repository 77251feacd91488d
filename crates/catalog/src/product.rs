//! Product documents.

use serde::{Deserialize, Serialize};

use storefront_core::{BrandId, CategoryId, Entity, ProductId, ValueObject};

use crate::document::{Document, Draft};
use crate::image::ImageRef;
use crate::pricing::{Discount, Price, discounted_price};

/// Opaque color descriptor supplied by the storefront admin (name, hex, swatch ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorDescriptor(pub serde_json::Value);

impl ValueObject for ColorDescriptor {}

/// De-duplicates colors while keeping first-seen order.
fn color_set(colors: Vec<ColorDescriptor>) -> Vec<ColorDescriptor> {
    let mut set: Vec<ColorDescriptor> = Vec::with_capacity(colors.len());
    for color in colors {
        if !set.contains(&color) {
            set.push(color);
        }
    }
    set
}

/// A sellable product. Belongs to exactly one brand and one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub discount: Discount,
    pub images: Vec<ImageRef>,
    pub colors: Vec<ColorDescriptor>,
    pub brand: BrandId,
    pub category: CategoryId,
}

impl Product {
    pub fn discounted_price(&self) -> f64 {
        discounted_price(self.price, self.discount)
    }
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "product";

    fn id(&self) -> &ProductId {
        &self.id
    }
}

/// Store-native product filter (parent equality only; price filtering happens on the
/// derived discounted price in the query engine).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub brand: Option<BrandId>,
    pub category: Option<CategoryId>,
}

/// Caller-facing product update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub discount: Option<Discount>,
    pub colors: Option<Vec<ColorDescriptor>>,
    pub brand: Option<BrandId>,
    pub category: Option<CategoryId>,
}

/// Store-level product patch: the caller's update plus the resolved image list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub update: ProductUpdate,
    pub images: Option<Vec<ImageRef>>,
}

impl Document for Product {
    type Patch = ProductPatch;
    type Filter = ProductFilter;
    const COLLECTION: &'static str = "products";
    const ASSET_FOLDER: &'static str = "products";

    fn name(&self) -> &str {
        &self.name
    }

    fn images(&self) -> &[ImageRef] {
        &self.images
    }

    fn apply(&mut self, patch: &ProductPatch) {
        let update = &patch.update;
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(discount) = update.discount {
            self.discount = discount;
        }
        if let Some(colors) = &update.colors {
            self.colors = color_set(colors.clone());
        }
        if let Some(brand) = update.brand {
            self.brand = brand;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
    }

    fn matches(&self, filter: &ProductFilter) -> bool {
        filter.brand.is_none_or(|b| b == self.brand)
            && filter.category.is_none_or(|c| c == self.category)
    }
}

/// Everything needed to create a product except its images.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub discount: Discount,
    pub colors: Vec<ColorDescriptor>,
    pub brand: BrandId,
    pub category: CategoryId,
}

impl Draft for ProductDraft {
    type Document = Product;

    fn into_document(self, images: Vec<ImageRef>) -> Product {
        Product {
            id: ProductId::new(),
            name: self.name,
            description: self.description,
            price: self.price,
            discount: self.discount,
            images,
            colors: color_set(self.colors),
            brand: self.brand,
            category: self.category,
        }
    }
}
