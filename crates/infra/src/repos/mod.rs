//! Domain repository contracts.
//!
//! Thin CRUD surfaces per record type: list with search + limit/offset,
//! get, create, update, delete. Postgres implementations live in
//! [`postgres`], in-memory ones (tests/dev) in [`memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use storekeep_core::{EmployeeId, EmployeeRole};
use storekeep_inventory::{StoreProduct, Upc};
use storekeep_parties::{CardNumber, CustomerCard, Employee};
use storekeep_products::{Category, CategoryId, Product, ProductId};
use storekeep_sales::{Check, CheckNumber};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepos;
pub use postgres::PgRepos;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    /// Stock decrement would go below zero (backstop behind the domain check).
    #[error("insufficient stock for UPC {0}")]
    InsufficientStock(String),

    /// A persisted row violates a domain invariant (e.g. unknown role).
    #[error("invalid row: {0}")]
    InvalidRow(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Page {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }
}

/// Payload for creating a product (id is storage-assigned).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub category: CategoryId,
    pub name: String,
    pub characteristics: String,
}

/// Filter for check listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckFilter {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub employee_id: Option<EmployeeId>,
}

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    /// List categories, name-filtered by `search`, ordered by number.
    async fn list(&self, search: Option<&str>, page: Page) -> RepoResult<Vec<Category>>;

    async fn count(&self, search: Option<&str>) -> RepoResult<i64>;

    async fn get(&self, number: CategoryId) -> RepoResult<Option<Category>>;

    async fn create(&self, name: &str) -> RepoResult<Category>;

    async fn update(&self, number: CategoryId, name: &str) -> RepoResult<Category>;

    async fn delete(&self, number: CategoryId) -> RepoResult<()>;

    async fn delete_many(&self, numbers: &[CategoryId]) -> RepoResult<()>;
}

#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn list(
        &self,
        search: Option<&str>,
        category: Option<CategoryId>,
        page: Page,
    ) -> RepoResult<Vec<Product>>;

    async fn count(&self, search: Option<&str>, category: Option<CategoryId>) -> RepoResult<i64>;

    async fn get(&self, id: ProductId) -> RepoResult<Option<Product>>;

    async fn create(&self, product: NewProduct) -> RepoResult<Product>;

    async fn update(&self, product: &Product) -> RepoResult<Product>;

    async fn delete(&self, id: ProductId) -> RepoResult<()>;

    async fn delete_many(&self, ids: &[ProductId]) -> RepoResult<()>;
}

#[async_trait]
pub trait StoreProductRepo: Send + Sync {
    /// List shelf items ordered by UPC; `promotional` filters by flag.
    async fn list(&self, promotional: Option<bool>, page: Page) -> RepoResult<Vec<StoreProduct>>;

    async fn count(&self, promotional: Option<bool>) -> RepoResult<i64>;

    async fn get(&self, upc: &Upc) -> RepoResult<Option<StoreProduct>>;

    async fn create(&self, item: &StoreProduct) -> RepoResult<StoreProduct>;

    async fn update(&self, item: &StoreProduct) -> RepoResult<StoreProduct>;

    async fn delete(&self, upc: &Upc) -> RepoResult<()>;
}

#[async_trait]
pub trait CustomerCardRepo: Send + Sync {
    /// List cards, surname-filtered by `search`, ordered by card number.
    async fn list(&self, search: Option<&str>, page: Page) -> RepoResult<Vec<CustomerCard>>;

    async fn count(&self, search: Option<&str>) -> RepoResult<i64>;

    async fn get(&self, card_number: &CardNumber) -> RepoResult<Option<CustomerCard>>;

    async fn create(&self, card: &CustomerCard) -> RepoResult<CustomerCard>;

    async fn update(&self, card: &CustomerCard) -> RepoResult<CustomerCard>;

    async fn delete(&self, card_number: &CardNumber) -> RepoResult<()>;

    async fn delete_many(&self, card_numbers: &[CardNumber]) -> RepoResult<()>;
}

#[async_trait]
pub trait EmployeeRepo: Send + Sync {
    /// List employees, surname-filtered by `search`, role-filtered by `role`,
    /// ordered by surname.
    async fn list(
        &self,
        search: Option<&str>,
        role: Option<EmployeeRole>,
        page: Page,
    ) -> RepoResult<Vec<Employee>>;

    async fn count(&self, search: Option<&str>, role: Option<EmployeeRole>) -> RepoResult<i64>;

    async fn get(&self, id: &EmployeeId) -> RepoResult<Option<Employee>>;

    async fn create(&self, employee: &Employee) -> RepoResult<Employee>;

    async fn update(&self, employee: &Employee) -> RepoResult<Employee>;

    async fn delete(&self, id: &EmployeeId) -> RepoResult<()>;

    async fn delete_many(&self, ids: &[EmployeeId]) -> RepoResult<()>;
}

#[async_trait]
pub trait CheckRepo: Send + Sync {
    /// List checks (with their sale lines), newest first.
    async fn list(&self, filter: &CheckFilter, page: Page) -> RepoResult<Vec<Check>>;

    async fn count(&self, filter: &CheckFilter) -> RepoResult<i64>;

    async fn get(&self, number: &CheckNumber) -> RepoResult<Option<Check>>;

    /// Persist the check and its sale lines and decrement shelf stock for
    /// each line, atomically where the backend supports it.
    async fn create(&self, check: &Check) -> RepoResult<Check>;

    async fn delete(&self, number: &CheckNumber) -> RepoResult<()>;

    async fn delete_many(&self, numbers: &[CheckNumber]) -> RepoResult<()>;

    /// Every check number in storage (cleanup support).
    async fn list_numbers(&self) -> RepoResult<Vec<CheckNumber>>;
}
