//! Image asset handling: blob store boundary, background cleanup and the lifecycle
//! rules applied around entity writes.

pub mod in_memory;
pub mod janitor;
pub mod lifecycle;
pub mod local_dir;
pub mod r#trait;

pub use in_memory::InMemoryAssetStore;
pub use janitor::{AssetJanitor, JanitorStats};
pub use lifecycle::{AssetLifecycleManager, ImageReplacement};
pub use local_dir::LocalDirAssetStore;
pub use r#trait::{AssetStore, AssetStoreError};
