//! HTTP routes, one module per domain area.

use axum::{routing::get, Router};

pub mod admin;
pub mod auth;
pub mod categories;
pub mod checks;
pub mod customer_cards;
pub mod employees;
pub mod products;
pub mod store_products;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/store-products", store_products::router())
        .nest("/customer-cards", customer_cards::router())
        .nest("/checks", checks::router())
        .nest("/employees", employees::router())
        .nest("/admin", admin::router())
}
