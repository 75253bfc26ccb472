//! User account records.

use storekeep_core::{EmployeeId, UserId};

/// A back-office user account.
///
/// The credential is an opaque hash (see [`crate::hasher`]); the employee
/// link is what the role synchronizer keeps group membership in step with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub employee_id: Option<EmployeeId>,
}

/// Payload for creating a user (id is storage-assigned).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
}
