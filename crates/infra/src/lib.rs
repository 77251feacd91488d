//! Infrastructure layer: document and blob stores, image lifecycle, back-reference
//! maintenance, the catalog service facade and its configuration.

pub mod assets;
pub mod config;
pub mod document_store;
pub mod relationships;
pub mod service;

#[cfg(test)]
mod integration_tests;

pub use assets::{
    AssetJanitor, AssetLifecycleManager, AssetStore, AssetStoreError, ImageReplacement,
    InMemoryAssetStore, JanitorStats, LocalDirAssetStore,
};
pub use config::{CatalogConfig, ConfigError};
pub use document_store::{CatalogStore, DocumentStore, InMemoryCatalogStore, InMemoryCollection, StoreError};
pub use relationships::{ParentChange, RelationshipMaintainer, RepairFailure, RepairReport};
pub use service::{CatalogService, DeletedProduct, ProductView};
