//! Catalog domain module.
//!
//! Products, brands and categories as documents, plus the pure logic that runs over
//! them: discount pricing, the listing query engine, pagination, search and the
//! back-reference index. No IO, no storage, no transport.

pub mod backrefs;
pub mod brand;
pub mod category;
pub mod document;
pub mod image;
pub mod page;
pub mod pricing;
pub mod product;
pub mod query;
pub mod search;

pub use backrefs::{BackReferenceIndex, SetDiff};
pub use brand::{Brand, BrandDraft, BrandFilter, BrandPatch, BrandUpdate};
pub use category::{Category, CategoryDraft, CategoryFilter, CategoryPatch, CategoryUpdate};
pub use document::{Document, Draft, ParentDocument, ParentPatch};
pub use image::{ImageRef, ImageUpdate, LocalFile};
pub use page::{Page, paginate};
pub use pricing::{Discount, Price, discounted_price};
pub use product::{ColorDescriptor, Product, ProductDraft, ProductFilter, ProductPatch, ProductUpdate};
pub use query::{CatalogQueryEngine, ListingFilter, ListingPage, PriceSort, PricedProduct};
pub use search::SearchTerm;
