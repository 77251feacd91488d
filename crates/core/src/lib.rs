//! `storefront-core`: catalog foundation building blocks.
//!
//! Identifiers, the error model and marker traits. No infrastructure concerns.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{
    BackRefAction, BackRefOp, CatalogError, CatalogResult, FailedBackRefOp, ParentRef,
    PartialUpdateFailure,
};
pub use id::{BrandId, CategoryId, ProductId};
pub use value_object::ValueObject;
