//! Employee endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use storekeep_auth::store::{AuthTransaction, AuthUnitOfWork};
use storekeep_auth::{Action, BasicAction, EmployeeRoleSync, ResourceType};
use storekeep_core::{EmployeeId, EmployeeRole};
use storekeep_infra::{EmployeeRepo, Page};
use storekeep_parties::Employee;

use crate::app::dto::{BulkDeleteRequest, EmployeeListQuery, EmployeeRequest, Paginated};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/me", get(me))
        .route("/:id", get(get_one).put(update).delete(delete_one))
        .route("/bulk-delete", post(bulk_delete))
}

fn employee_from_request(body: EmployeeRequest) -> Result<Employee, axum::response::Response> {
    let id = EmployeeId::new(body.id).map_err(errors::domain_error_to_response)?;
    let role = body
        .role
        .parse::<EmployeeRole>()
        .map_err(errors::domain_error_to_response)?;

    let employee = Employee {
        id,
        surname: body.surname,
        name: body.name,
        patronymic: body.patronymic,
        role,
        salary: body.salary,
        date_of_birth: body.date_of_birth,
        date_of_start: body.date_of_start,
        phone: body.phone,
        city: body.city,
        street: body.street,
        zip_code: body.zip_code,
    };
    employee
        .validate()
        .map_err(errors::domain_error_to_response)?;
    Ok(employee)
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<EmployeeListQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::EMPLOYEE,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let role = match query.role.as_deref().map(str::parse::<EmployeeRole>).transpose() {
        Ok(role) => role,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let limit = query.limit.unwrap_or(10).clamp(1, 1000);
    let data = match services
        .employees
        .list(query.search.as_deref(), role, Page::new(limit, query.skip))
        .await
    {
        Ok(data) => data,
        Err(e) => return errors::repo_error_to_response(e),
    };
    let total = match services.employees.count(query.search.as_deref(), role).await {
        Ok(total) => total,
        Err(e) => return errors::repo_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(Paginated::new(data, total, query.skip, limit)),
    )
        .into_response()
}

/// GET /employees/me — the employee record linked to the current user.
///
/// Guarded by the ad-hoc `view_self` permission (cashiers hold it without
/// holding full employee view rights).
async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::EMPLOYEE,
        Action::named("view_self"),
    )
    .await
    {
        return resp;
    }

    let Some(employee_id) = current.user().employee_id.clone() else {
        return errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "no employee linked to this user",
        );
    };

    match services.employees.get(&employee_id).await {
        Ok(Some(employee)) => (StatusCode::OK, Json(employee)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "employee not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::EMPLOYEE,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let id = match EmployeeId::new(id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.employees.get(&id).await {
        Ok(Some(employee)) => (StatusCode::OK, Json(employee)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "employee not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<EmployeeRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::EMPLOYEE,
        BasicAction::Create.into(),
    )
    .await
    {
        return resp;
    }

    let employee = match employee_from_request(body) {
        Ok(employee) => employee,
        Err(resp) => return resp,
    };

    match services.employees.create(&employee).await {
        Ok(employee) => (StatusCode::CREATED, Json(employee)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

/// PUT /employees/:id — update the record, then re-sync the role groups of
/// every user linked to it (inside one transaction).
async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(mut body): Json<EmployeeRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::EMPLOYEE,
        BasicAction::Update.into(),
    )
    .await
    {
        return resp;
    }

    body.id = id;
    let employee = match employee_from_request(body) {
        Ok(employee) => employee,
        Err(resp) => return resp,
    };

    let employee = match services.employees.update(&employee).await {
        Ok(employee) => employee,
        Err(e) => return errors::repo_error_to_response(e),
    };

    let tx = match services.uow.begin().await {
        Ok(tx) => tx,
        Err(e) => return errors::store_error_to_response(e),
    };
    let sync = EmployeeRoleSync::from_stores(&tx.stores(), services.cache.clone());
    if let Err(e) = sync.sync_role_change(&employee.id, employee.role).await {
        return errors::auth_error_to_response(e);
    }
    if let Err(e) = tx.commit().await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::OK, Json(employee)).into_response()
}

async fn delete_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::EMPLOYEE,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    let id = match EmployeeId::new(id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.employees.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn bulk_delete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<BulkDeleteRequest<String>>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::EMPLOYEE,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    let mut ids = Vec::with_capacity(body.ids.len());
    for raw in body.ids {
        match EmployeeId::new(raw) {
            Ok(id) => ids.push(id),
            Err(e) => return errors::domain_error_to_response(e),
        }
    }

    match services.employees.delete_many(&ids).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
