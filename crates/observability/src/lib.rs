//! Structured logging setup shared by storefront processes and test harnesses.

pub mod subscriber;

pub use subscriber::{init, init_with_default};
