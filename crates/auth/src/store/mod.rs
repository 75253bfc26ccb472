//! Storage collaborator contracts for the authorization core.
//!
//! The core depends only on these traits; concrete adapters live in
//! `storekeep-infra` (Postgres) and [`memory`] (in-memory, tests/dev).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use storekeep_core::{EmployeeId, GroupId, PermissionId, UserId};

use crate::permission::PermissionRecord;
use crate::user::{NewUser, User};

pub mod memory;

pub use memory::{MemoryAuthStore, MemoryUnitOfWork};

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-level error.
///
/// `AlreadyExists` must be distinguishable from other failures: the catalog
/// and group layers convert it into "treat as success, return existing".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Uniqueness violation on create (duplicate key).
    #[error("already exists")]
    AlreadyExists,

    /// A row a required lookup expected was not there.
    #[error("not found")]
    NotFound,

    /// The backing transaction was already committed or rolled back.
    #[error("transaction closed")]
    TransactionClosed,

    /// Any other backend failure (connection, constraint, decode).
    #[error("storage backend error: {0}")]
    Backend(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// A named role container owning permissions and members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
}

/// User↔group membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub user_id: UserId,
    pub group_id: GroupId,
}

/// Group↔permission row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupGrant {
    pub group_id: GroupId,
    pub permission_id: PermissionId,
}

/// Sparse filter for permission lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionFilter {
    pub resource_type: Option<String>,
    pub codename: Option<String>,
}

impl PermissionFilter {
    pub fn by_resource(resource_type: &str) -> Self {
        Self {
            resource_type: Some(resource_type.to_string()),
            codename: None,
        }
    }

    pub fn exact(resource_type: &str, codename: &str) -> Self {
        Self {
            resource_type: Some(resource_type.to_string()),
            codename: Some(codename.to_string()),
        }
    }
}

/// Sparse filter for user lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub username: Option<String>,
    pub employee_id: Option<EmployeeId>,
}

impl UserFilter {
    pub fn by_employee(employee_id: &EmployeeId) -> Self {
        Self {
            username: None,
            employee_id: Some(employee_id.clone()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator traits
// ─────────────────────────────────────────────────────────────────────────────

/// Durable permission storage.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn search(&self, filter: &PermissionFilter) -> StoreResult<Vec<PermissionRecord>>;

    /// Fails with [`StoreError::AlreadyExists`] on a (resource type, codename)
    /// uniqueness violation.
    async fn create(&self, resource_type: &str, codename: &str) -> StoreResult<PermissionRecord>;

    async fn get(&self, id: PermissionId) -> StoreResult<PermissionRecord>;

    async fn list_all(&self) -> StoreResult<Vec<PermissionRecord>>;
}

/// Group storage; `name` is the natural key.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn get_by_name(&self, name: &str) -> StoreResult<Option<GroupRecord>>;

    /// Fails with [`StoreError::AlreadyExists`] on a duplicate name.
    async fn create(&self, name: &str) -> StoreResult<GroupRecord>;

    async fn list_by_ids(&self, ids: &[GroupId]) -> StoreResult<Vec<GroupRecord>>;
}

/// User↔group membership relation.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Fails with [`StoreError::AlreadyExists`] on a duplicate pair.
    async fn add(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()>;

    /// Removing a non-member is a no-op, not an error.
    async fn remove(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()>;

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Membership>>;

    async fn list_for_group(&self, group_id: GroupId) -> StoreResult<Vec<Membership>>;
}

/// Group↔permission relation.
#[async_trait]
pub trait GroupPermissionStore: Send + Sync {
    /// Fails with [`StoreError::AlreadyExists`] on a duplicate pair.
    async fn add(&self, group_id: GroupId, permission_id: PermissionId) -> StoreResult<()>;

    /// Removing an unattached pair is a no-op, not an error.
    async fn remove(&self, group_id: GroupId, permission_id: PermissionId) -> StoreResult<()>;

    async fn list_for_group(&self, group_id: GroupId) -> StoreResult<Vec<GroupGrant>>;

    async fn list_for_permission(&self, permission_id: PermissionId) -> StoreResult<Vec<GroupGrant>>;
}

/// User account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: UserId) -> StoreResult<User>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::AlreadyExists`] on a duplicate username.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    /// Set or clear the employee link, returning the updated user.
    async fn set_employee(&self, id: UserId, employee_id: Option<EmployeeId>) -> StoreResult<User>;

    async fn search(&self, filter: &UserFilter) -> StoreResult<Vec<User>>;
}

/// The full bundle of auth storage handles.
///
/// Components take this by reference and keep only the handles they need;
/// a transaction yields a bundle bound to that transaction.
#[derive(Clone)]
pub struct AuthStores {
    pub permissions: Arc<dyn PermissionStore>,
    pub groups: Arc<dyn GroupStore>,
    pub memberships: Arc<dyn MembershipStore>,
    pub group_permissions: Arc<dyn GroupPermissionStore>,
    pub users: Arc<dyn UserStore>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction boundary
// ─────────────────────────────────────────────────────────────────────────────

/// Scoped transaction boundary over the auth stores.
///
/// Multi-step role-sync mutations must run against the stores of one
/// transaction so partial states are never committed.
#[async_trait]
pub trait AuthUnitOfWork: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn AuthTransaction>>;
}

/// One open transaction.
///
/// Dropping the handle without calling [`AuthTransaction::commit`] rolls the
/// transaction back (backend permitting).
#[async_trait]
pub trait AuthTransaction: Send + Sync {
    /// Store handles bound to this transaction.
    fn stores(&self) -> AuthStores;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
