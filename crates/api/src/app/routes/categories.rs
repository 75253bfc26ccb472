//! Category endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use storekeep_auth::{BasicAction, ResourceType};
use storekeep_infra::{CategoryRepo, Page};
use storekeep_products::CategoryId;

use crate::app::dto::{BulkDeleteRequest, CategoryRequest, ListQuery, Paginated};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:number", get(get_one).put(update).delete(delete_one))
        .route("/bulk-delete", post(bulk_delete))
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CATEGORY,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let limit = query.limit();
    let data = match services
        .categories
        .list(query.search.as_deref(), Page::new(limit, query.skip))
        .await
    {
        Ok(data) => data,
        Err(e) => return errors::repo_error_to_response(e),
    };
    let total = match services.categories.count(query.search.as_deref()).await {
        Ok(total) => total,
        Err(e) => return errors::repo_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(Paginated::new(data, total, query.skip, limit)),
    )
        .into_response()
}

async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(number): Path<i64>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CATEGORY,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    match services.categories.get(CategoryId::new(number)).await {
        Ok(Some(category)) => (StatusCode::OK, Json(category)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CategoryRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CATEGORY,
        BasicAction::Create.into(),
    )
    .await
    {
        return resp;
    }

    if let Err(e) = storekeep_products::category::validate_name(&body.name) {
        return errors::domain_error_to_response(e);
    }

    match services.categories.create(&body.name).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(number): Path<i64>,
    Json(body): Json<CategoryRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CATEGORY,
        BasicAction::Update.into(),
    )
    .await
    {
        return resp;
    }

    if let Err(e) = storekeep_products::category::validate_name(&body.name) {
        return errors::domain_error_to_response(e);
    }

    match services
        .categories
        .update(CategoryId::new(number), &body.name)
        .await
    {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn delete_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(number): Path<i64>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CATEGORY,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    match services.categories.delete(CategoryId::new(number)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn bulk_delete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<BulkDeleteRequest<i64>>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CATEGORY,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    let numbers: Vec<CategoryId> = body.ids.into_iter().map(CategoryId::new).collect();
    match services.categories.delete_many(&numbers).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
