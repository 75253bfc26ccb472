//! Postgres adapters for the `storekeep-auth` storage contracts.

pub mod postgres;

pub use postgres::{PgAuthStore, PgAuthUnitOfWork};
