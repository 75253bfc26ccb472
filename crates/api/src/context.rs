//! Per-request context.

use storekeep_auth::User;

/// The authenticated user for a request.
///
/// Inserted by the auth middleware; must be present on all protected routes.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn user(&self) -> &User {
        &self.0
    }
}
