//! Cache types for catalog responses.

use super::ProductQuery;
use super::types::{Collection, Product};

/// Cache key for products and collections.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products(ProductQuery),
    ProductBySlug(String),
    Collections,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Product(Box<Product>),
    Collections(Vec<Collection>),
}
