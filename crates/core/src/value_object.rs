//! Value object trait: equality by value, not identity.
//!
//! Prices, discounts and image descriptors carry no identity of their own. Two image
//! descriptors with the same remote URL and deletion key are the same image, whichever
//! entity they were read from.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one, build a
/// new one; constructors are where validation happens.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct ImageRef {
///     remote_url: String,
///     deletion_key: String,
/// }
///
/// impl ValueObject for ImageRef {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
