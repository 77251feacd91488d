//! Catalog configuration.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use thiserror::Error;

use crate::assets::LocalDirAssetStore;

const DEFAULT_PRODUCTS_PER_PAGE: NonZeroUsize = per_page(12);
const DEFAULT_BRANDS_PER_PAGE: NonZeroUsize = per_page(10);
const DEFAULT_CATEGORIES_PER_PAGE: NonZeroUsize = per_page(10);
const DEFAULT_ASSET_ROOT: &str = "./assets";
const DEFAULT_ASSET_BASE_URL: &str = "http://localhost:8080/assets";
const DEFAULT_ASSET_NAMESPACE: &str = "storefront";

const fn per_page(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => NonZeroUsize::MIN,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Page sizes per listing surface and where images are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub products_per_page: NonZeroUsize,
    pub brands_per_page: NonZeroUsize,
    pub categories_per_page: NonZeroUsize,
    pub asset_root: PathBuf,
    pub asset_base_url: String,
    pub asset_namespace: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            products_per_page: DEFAULT_PRODUCTS_PER_PAGE,
            brands_per_page: DEFAULT_BRANDS_PER_PAGE,
            categories_per_page: DEFAULT_CATEGORIES_PER_PAGE,
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            asset_namespace: DEFAULT_ASSET_NAMESPACE.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from the environment, after reading a `.env` file if present.
    ///
    /// | Env Var                        | Default                          |
    /// |--------------------------------|----------------------------------|
    /// | `CATALOG_PRODUCTS_PER_PAGE`    | `12`                             |
    /// | `CATALOG_BRANDS_PER_PAGE`      | `10`                             |
    /// | `CATALOG_CATEGORIES_PER_PAGE`  | `10`                             |
    /// | `CATALOG_ASSET_ROOT`           | `./assets`                       |
    /// | `CATALOG_ASSET_BASE_URL`       | `http://localhost:8080/assets`   |
    /// | `CATALOG_ASSET_NAMESPACE`      | `storefront`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            products_per_page: page_size(&lookup, "CATALOG_PRODUCTS_PER_PAGE", defaults.products_per_page)?,
            brands_per_page: page_size(&lookup, "CATALOG_BRANDS_PER_PAGE", defaults.brands_per_page)?,
            categories_per_page: page_size(
                &lookup,
                "CATALOG_CATEGORIES_PER_PAGE",
                defaults.categories_per_page,
            )?,
            asset_root: match text(&lookup, "CATALOG_ASSET_ROOT")? {
                Some(root) => PathBuf::from(root),
                None => defaults.asset_root,
            },
            asset_base_url: text(&lookup, "CATALOG_ASSET_BASE_URL")?.unwrap_or(defaults.asset_base_url),
            asset_namespace: text(&lookup, "CATALOG_ASSET_NAMESPACE")?.unwrap_or(defaults.asset_namespace),
        })
    }

    /// Blob store writing under `asset_root`.
    pub fn local_asset_store(&self) -> LocalDirAssetStore {
        LocalDirAssetStore::new(
            self.asset_root.clone(),
            self.asset_base_url.clone(),
            self.asset_namespace.clone(),
        )
    }
}

fn page_size(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: NonZeroUsize,
) -> Result<NonZeroUsize, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<NonZeroUsize>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

/// Unset means default; set but blank is an error.
fn text(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<String>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Err(ConfigError::Invalid { key, value: raw }),
        Some(raw) => Ok(Some(raw.trim().to_string())),
    }
}
