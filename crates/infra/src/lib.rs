//! `storekeep-infra` — storage adapters.
//!
//! Postgres (sqlx) implementations of the auth storage contracts and the
//! domain repositories, plus in-memory repositories for tests/dev. The
//! relational schema lives in `schema.sql` next to this crate; applying it
//! is an operational concern (no migration runner here).

pub mod auth_store;
pub mod repos;

pub use auth_store::{PgAuthStore, PgAuthUnitOfWork};
pub use repos::{
    CategoryRepo, CheckFilter, CheckRepo, CustomerCardRepo, EmployeeRepo, NewProduct, Page,
    ProductRepo, RepoError, RepoResult, StoreProductRepo,
};
