//! Brand documents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use storefront_core::{BrandId, Entity, ParentRef, ProductId};

use crate::document::{Document, Draft, ParentDocument, ParentPatch};
use crate::image::ImageRef;

/// A brand. `category_label` is free text, not a category reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub category_label: String,
    pub images: Vec<ImageRef>,
    /// Back-references; maintained by the relationship maintainer only.
    pub products: BTreeSet<ProductId>,
}

impl Entity for Brand {
    type Id = BrandId;
    const KIND: &'static str = "brand";

    fn id(&self) -> &BrandId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandFilter {
    pub category_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandUpdate {
    pub name: Option<String>,
    pub category_label: Option<String>,
}

pub type BrandPatch = ParentPatch<BrandUpdate>;

impl Document for Brand {
    type Patch = BrandPatch;
    type Filter = BrandFilter;
    const COLLECTION: &'static str = "brands";
    const ASSET_FOLDER: &'static str = "brands";

    fn name(&self) -> &str {
        &self.name
    }

    fn images(&self) -> &[ImageRef] {
        &self.images
    }

    fn apply(&mut self, patch: &BrandPatch) {
        if let ParentPatch::Fields { update, images } = patch {
            if let Some(name) = &update.name {
                self.name = name.clone();
            }
            if let Some(label) = &update.category_label {
                self.category_label = label.clone();
            }
            if let Some(images) = images {
                self.images = images.clone();
            }
        }
        patch.apply_membership(&mut self.products);
    }

    fn matches(&self, filter: &BrandFilter) -> bool {
        filter
            .category_label
            .as_deref()
            .is_none_or(|label| label == self.category_label)
    }
}

impl ParentDocument for Brand {
    type Update = BrandUpdate;

    fn products(&self) -> &BTreeSet<ProductId> {
        &self.products
    }

    fn parent_ref(&self) -> ParentRef {
        ParentRef::Brand(self.id)
    }

    fn parent_ref_for(id: BrandId) -> ParentRef {
        ParentRef::Brand(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandDraft {
    pub name: String,
    pub category_label: String,
}

impl Draft for BrandDraft {
    type Document = Brand;

    fn into_document(self, images: Vec<ImageRef>) -> Brand {
        Brand {
            id: BrandId::new(),
            name: self.name,
            category_label: self.category_label,
            images,
            products: BTreeSet::new(),
        }
    }
}
