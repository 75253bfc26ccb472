//! `storekeep-products` — product catalog records (categories, products).

pub mod category;
pub mod product;

pub use category::{Category, CategoryId};
pub use product::{Product, ProductId};
