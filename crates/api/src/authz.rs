//! API-side permission guard.
//!
//! Enforces the (resource, action) check at the route boundary, keeping the
//! repositories authorization-agnostic. A denied check maps to 403 here; the
//! engine itself only ever answers true/false.

use axum::http::StatusCode;
use axum::response::Response;

use storekeep_auth::{Action, ResourceType, User};

use crate::app::errors;
use crate::app::services::AppServices;

/// Require `(resource, action)` for `user`, or produce the error response.
pub async fn require(
    services: &AppServices,
    user: &User,
    resource: &ResourceType,
    action: Action,
) -> Result<(), Response> {
    match services
        .engine
        .has_resource_permission(user, resource, &action)
        .await
    {
        Ok(true) => Ok(()),
        Ok(false) => Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("missing permission {}", resource.codename(&action)),
        )),
        Err(e) => Err(errors::auth_error_to_response(e)),
    }
}

/// Require the superuser flag (admin-only surface).
pub fn require_superuser(user: &User) -> Result<(), Response> {
    if user.is_superuser {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "superuser required",
        ))
    }
}
