//! Superuser-only administration endpoints: user accounts, employee links,
//! permission provisioning.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use storekeep_auth::store::{AuthTransaction, AuthUnitOfWork, PermissionStore, UserStore};
use storekeep_auth::{EmployeeRoleSync, ResourceType};
use storekeep_core::UserId;
use storekeep_infra::EmployeeRepo;

use crate::app::dto::{AssignEmployeeRequest, RegisterUserRequest, UserResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/:id/employee", post(assign_employee).delete(deassign_employee))
        .route("/permissions", get(list_permissions))
        .route("/permissions/sync", post(sync_permissions))
}

/// POST /admin/users — create a user account.
async fn register_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<RegisterUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_superuser(current.user()) {
        return resp;
    }

    match services
        .authenticator
        .register(&body.username, &body.password, body.is_superuser)
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(UserResponse::from(&user))).into_response(),
        Err(e) => errors::authn_error_to_response(e),
    }
}

/// POST /admin/users/:id/employee — link an employee to a user and put the
/// user into the matching role group, atomically.
async fn assign_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<AssignEmployeeRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_superuser(current.user()) {
        return resp;
    }

    let employee_id = match storekeep_core::EmployeeId::new(body.employee_id) {
        Ok(employee_id) => employee_id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let employee = match services.employees.get(&employee_id).await {
        Ok(Some(employee)) => employee,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "employee not found")
        }
        Err(e) => return errors::repo_error_to_response(e),
    };

    let tx = match services.uow.begin().await {
        Ok(tx) => tx,
        Err(e) => return errors::store_error_to_response(e),
    };
    let stores = tx.stores();

    let user = match stores.users.get(UserId::new(id)).await {
        Ok(user) => user,
        Err(e) => return errors::store_error_to_response(e),
    };

    let sync = EmployeeRoleSync::from_stores(&stores, services.cache.clone());
    let user = match sync.assign(&user, employee.id.clone(), employee.role).await {
        Ok(user) => user,
        Err(e) => return errors::auth_error_to_response(e),
    };
    if let Err(e) = tx.commit().await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(user = %user.username, employee = %employee.id, "assigned employee");
    (StatusCode::OK, Json(UserResponse::from(&user))).into_response()
}

/// DELETE /admin/users/:id/employee — clear the employee link and all
/// role-group membership.
async fn deassign_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_superuser(current.user()) {
        return resp;
    }

    let tx = match services.uow.begin().await {
        Ok(tx) => tx,
        Err(e) => return errors::store_error_to_response(e),
    };
    let stores = tx.stores();

    let user = match stores.users.get(UserId::new(id)).await {
        Ok(user) => user,
        Err(e) => return errors::store_error_to_response(e),
    };

    let sync = EmployeeRoleSync::from_stores(&stores, services.cache.clone());
    let user = match sync.remove(&user).await {
        Ok(user) => user,
        Err(e) => return errors::auth_error_to_response(e),
    };
    if let Err(e) = tx.commit().await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::OK, Json(UserResponse::from(&user))).into_response()
}

/// GET /admin/permissions — the whole permission catalog.
async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_superuser(current.user()) {
        return resp;
    }

    match services.auth_stores.permissions.list_all().await {
        Ok(permissions) => (
            StatusCode::OK,
            Json(serde_json::json!({ "permissions": permissions })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /admin/permissions/sync — ensure basic permissions for every
/// resource type and materialize both role groups.
async fn sync_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_superuser(current.user()) {
        return resp;
    }

    let mut created = 0usize;
    for resource in ResourceType::ALL {
        match services.catalog.ensure_basic_permissions(&resource).await {
            Ok((_, newly_created)) if newly_created => created += 1,
            Ok(_) => {}
            Err(e) => return errors::auth_error_to_response(e),
        }
    }

    for role in [
        storekeep_core::EmployeeRole::Cashier,
        storekeep_core::EmployeeRole::Manager,
    ] {
        if let Err(e) = services.roles.ensure_role_group(role).await {
            return errors::auth_error_to_response(e);
        }
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "resource_types_created": created })),
    )
        .into_response()
}
