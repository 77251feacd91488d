//! Catalog error model.

use core::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::id::{BrandId, CategoryId, ProductId};

/// Result type used across the catalog core.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog-level error, the failure half of every exposed operation.
///
/// The transport layer maps these to response codes; nothing in the core knows about
/// status codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A value failed validation at construction time (e.g. a negative price).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier did not resolve to a document.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A create was attempted without any image files.
    #[error("no images provided for upload")]
    NoImagesProvided,

    /// A remote upload failed; the enclosing create/update was aborted.
    #[error("asset upload failed: {0}")]
    AssetUpload(String),

    /// A remote delete failed. Never fails a request; surfaces in logs and janitor stats.
    #[error("asset delete failed for {deletion_key}: {reason}")]
    AssetDelete { deletion_key: String, reason: String },

    /// One half of a back-reference update succeeded while its counterpart failed.
    #[error(transparent)]
    PartialUpdate(#[from] PartialUpdateFailure),

    /// A brand or category still owns products and cannot be deleted.
    #[error("{entity} {id} still owns {count} product(s)")]
    HasDependents {
        entity: &'static str,
        id: String,
        count: usize,
    },

    /// The document store failed for a reason other than a missing id.
    #[error("store error: {0}")]
    Store(String),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn asset_upload(msg: impl Into<String>) -> Self {
        Self::AssetUpload(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Parent document on the other side of a product back-reference.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ParentRef {
    Brand(BrandId),
    Category(CategoryId),
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::Brand(id) => write!(f, "brand {id}"),
            ParentRef::Category(id) => write!(f, "category {id}"),
        }
    }
}

/// Set mutation applied to a parent's product set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackRefAction {
    Add,
    Remove,
}

/// A single targeted back-reference mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BackRefOp {
    pub action: BackRefAction,
    pub parent: ParentRef,
}

impl BackRefOp {
    pub fn add(parent: ParentRef) -> Self {
        Self {
            action: BackRefAction::Add,
            parent,
        }
    }

    pub fn remove(parent: ParentRef) -> Self {
        Self {
            action: BackRefAction::Remove,
            parent,
        }
    }
}

impl fmt::Display for BackRefOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            BackRefAction::Add => write!(f, "add to {}", self.parent),
            BackRefAction::Remove => write!(f, "remove from {}", self.parent),
        }
    }
}

/// A back-reference mutation that did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBackRefOp {
    pub op: BackRefOp,
    pub reason: String,
}

/// Outcome of a back-reference update where at least one mutation failed.
///
/// Carries enough context (product id, every attempted mutation) to drive a retry or the
/// out-of-band repair pass.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error(
    "back-references of product {product_id} partially updated ({} applied, {} failed)",
    .applied.len(),
    .failed.len()
)]
pub struct PartialUpdateFailure {
    pub product_id: ProductId,
    pub applied: Vec<BackRefOp>,
    pub failed: Vec<FailedBackRefOp>,
}

impl PartialUpdateFailure {
    /// Fold per-operation outcomes into `Ok(())` or a failure report.
    pub fn check(
        product_id: ProductId,
        outcomes: impl IntoIterator<Item = (BackRefOp, Result<(), String>)>,
    ) -> Result<(), PartialUpdateFailure> {
        let mut applied = Vec::new();
        let mut failed = Vec::new();
        for (op, outcome) in outcomes {
            match outcome {
                Ok(()) => applied.push(op),
                Err(reason) => failed.push(FailedBackRefOp { op, reason }),
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(PartialUpdateFailure {
                product_id,
                applied,
                failed,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_when_every_op_applied() {
        let product_id = ProductId::new();
        let outcomes = vec![
            (BackRefOp::add(ParentRef::Brand(BrandId::new())), Ok(())),
            (BackRefOp::add(ParentRef::Category(CategoryId::new())), Ok(())),
        ];
        assert!(PartialUpdateFailure::check(product_id, outcomes).is_ok());
    }

    #[test]
    fn check_reports_applied_and_failed_ops() {
        let product_id = ProductId::new();
        let pull = BackRefOp::remove(ParentRef::Brand(BrandId::new()));
        let push = BackRefOp::add(ParentRef::Brand(BrandId::new()));

        let failure = PartialUpdateFailure::check(
            product_id,
            vec![(pull, Ok(())), (push, Err("brand not found".to_string()))],
        )
        .unwrap_err();

        assert_eq!(failure.product_id, product_id);
        assert_eq!(failure.applied, vec![pull]);
        assert_eq!(failure.failed.len(), 1);
        assert_eq!(failure.failed[0].op, push);
        assert!(failure.to_string().contains("1 applied, 1 failed"));
    }

    #[test]
    fn not_found_renders_entity_and_id() {
        let id = ProductId::new();
        let err = CatalogError::not_found("product", id);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), format!("product not found: {id}"));
    }
}
