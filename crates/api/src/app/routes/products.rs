//! Product endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use storekeep_auth::{BasicAction, ResourceType};
use storekeep_infra::{NewProduct, Page, ProductRepo};
use storekeep_products::{CategoryId, Product, ProductId};

use crate::app::dto::{BulkDeleteRequest, Paginated, ProductRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete_one))
        .route("/bulk-delete", post(bulk_delete))
}

#[derive(Debug, Deserialize)]
struct ProductListQuery {
    #[serde(default)]
    skip: i64,
    limit: Option<i64>,
    search: Option<String>,
    category: Option<i64>,
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ProductListQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::PRODUCT,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let limit = query.limit.unwrap_or(10).clamp(1, 1000);
    let category = query.category.map(CategoryId::new);

    let data = match services
        .products
        .list(query.search.as_deref(), category, Page::new(limit, query.skip))
        .await
    {
        Ok(data) => data,
        Err(e) => return errors::repo_error_to_response(e),
    };
    let total = match services
        .products
        .count(query.search.as_deref(), category)
        .await
    {
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
    Path(id): Path<i64>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::PRODUCT,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    match services.products.get(ProductId::new(id)).await {
        Ok(Some(product)) => (StatusCode::OK, Json(product)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<ProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::PRODUCT,
        BasicAction::Create.into(),
    )
    .await
    {
        return resp;
    }

    let draft = Product {
        id: ProductId::new(0),
        category: body.category,
        name: body.name.clone(),
        characteristics: body.characteristics.clone(),
    };
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services
        .products
        .create(NewProduct {
            category: body.category,
            name: body.name,
            characteristics: body.characteristics,
        })
        .await
    {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<ProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::PRODUCT,
        BasicAction::Update.into(),
    )
    .await
    {
        return resp;
    }

    let product = Product {
        id: ProductId::new(id),
        category: body.category,
        name: body.name,
        characteristics: body.characteristics,
    };
    if let Err(e) = product.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.products.update(&product).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn delete_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::PRODUCT,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    match services.products.delete(ProductId::new(id)).await {
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
        &ResourceType::PRODUCT,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    let ids: Vec<ProductId> = body.ids.into_iter().map(ProductId::new).collect();
    match services.products.delete_many(&ids).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
