//! Document store boundary for the three catalog collections.
//!
//! Single-document atomic writes only: no operation here spans more than one document,
//! and callers must not assume otherwise.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryCatalogStore, InMemoryCollection};
pub use r#trait::{CatalogStore, DocumentStore, StoreError};
