//! `storekeep-auth` — authorization and authentication core.
//!
//! The centerpiece is a role-based access control engine: durable
//! permissions derived per resource type, named groups carrying permission
//! sets, static role definitions (Cashier, Manager) materialized as groups,
//! an allow/deny check engine, and a synchronizer that keeps a user's group
//! membership consistent with the role of their linked employee.
//!
//! This crate is intentionally decoupled from HTTP and from any concrete
//! storage backend: every collaborator is a trait in [`store`], with an
//! in-memory implementation for tests/dev and a Postgres one in
//! `storekeep-infra`.

pub mod cache;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod group;
pub mod hasher;
pub mod permission;
pub mod role;
pub mod session;
pub mod store;
pub mod sync;
pub mod token;
pub mod user;

pub use cache::{InMemoryPermissionCache, NoopPermissionCache, PermissionCache};
pub use catalog::PermissionCatalog;
pub use engine::AccessEngine;
pub use error::AuthError;
pub use group::GroupDirectory;
pub use hasher::{PasswordHasher, Sha256PasswordHasher};
pub use permission::{Action, BasicAction, PermissionRecord, ResourceType};
pub use role::RoleAssignments;
pub use session::{Authenticator, AuthnError};
pub use store::{AuthStores, AuthTransaction, AuthUnitOfWork, StoreError, StoreResult};
pub use sync::EmployeeRoleSync;
pub use token::{Hs256TokenService, TokenError, TokenService};
pub use user::{NewUser, User};
