//! `storekeep-inventory` — shelf stock (store products keyed by UPC).

pub mod store_product;

pub use store_product::{StoreProduct, Upc};
