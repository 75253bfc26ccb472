//! Authorization-layer error model.

use thiserror::Error;

use crate::store::StoreError;

/// Error surfaced by the authorization components.
///
/// A denied check is **not** an error: `has_permission` and friends return
/// `Ok(false)`. These variants cover lookups that must resolve and broken
/// data invariants.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A referenced entity does not exist where a lookup expects exactly one.
    #[error("not found: {0}")]
    NotFound(String),

    /// Broken data invariant (e.g. duplicate permission rows for one codename).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Storage failure unrelated to uniqueness; propagated, never retried.
    #[error(transparent)]
    Store(#[from] StoreError),
}
