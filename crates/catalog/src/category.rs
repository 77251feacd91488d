//! Category documents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, Entity, ParentRef, ProductId};

use crate::document::{Document, Draft, ParentDocument, ParentPatch};
use crate::image::ImageRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub images: Vec<ImageRef>,
    /// Back-references; maintained by the relationship maintainer only.
    pub products: BTreeSet<ProductId>,
}

impl Entity for Category {
    type Id = CategoryId;
    const KIND: &'static str = "category";

    fn id(&self) -> &CategoryId {
        &self.id
    }
}

/// Store-native category filter (exact name match).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
}

pub type CategoryPatch = ParentPatch<CategoryUpdate>;

impl Document for Category {
    type Patch = CategoryPatch;
    type Filter = CategoryFilter;
    const COLLECTION: &'static str = "categories";
    const ASSET_FOLDER: &'static str = "category";

    fn name(&self) -> &str {
        &self.name
    }

    fn images(&self) -> &[ImageRef] {
        &self.images
    }

    fn apply(&mut self, patch: &CategoryPatch) {
        if let ParentPatch::Fields { update, images } = patch {
            if let Some(name) = &update.name {
                self.name = name.clone();
            }
            if let Some(images) = images {
                self.images = images.clone();
            }
        }
        patch.apply_membership(&mut self.products);
    }

    fn matches(&self, filter: &CategoryFilter) -> bool {
        filter.name.as_deref().is_none_or(|name| name == self.name)
    }
}

impl ParentDocument for Category {
    type Update = CategoryUpdate;

    fn products(&self) -> &BTreeSet<ProductId> {
        &self.products
    }

    fn parent_ref(&self) -> ParentRef {
        ParentRef::Category(self.id)
    }

    fn parent_ref_for(id: CategoryId) -> ParentRef {
        ParentRef::Category(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
}

impl Draft for CategoryDraft {
    type Document = Category;

    fn into_document(self, images: Vec<ImageRef>) -> Category {
        Category {
            id: CategoryId::new(),
            name: self.name,
            images,
            products: BTreeSet::new(),
        }
    }
}
