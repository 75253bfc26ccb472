//! Store-product (shelf stock) endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use storekeep_auth::{BasicAction, ResourceType};
use storekeep_infra::{Page, StoreProductRepo};
use storekeep_inventory::{StoreProduct, Upc};

use crate::app::dto::Paginated;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:upc", get(get_one).put(update).delete(delete_one))
}

#[derive(Debug, Deserialize)]
struct StoreProductListQuery {
    #[serde(default)]
    skip: i64,
    limit: Option<i64>,
    promotional: Option<bool>,
}

fn parse_upc(raw: &str) -> Result<Upc, axum::response::Response> {
    Upc::new(raw).map_err(errors::domain_error_to_response)
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<StoreProductListQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::STORE_PRODUCT,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let limit = query.limit.unwrap_or(10).clamp(1, 1000);
    let data = match services
        .store_products
        .list(query.promotional, Page::new(limit, query.skip))
        .await
    {
        Ok(data) => data,
        Err(e) => return errors::repo_error_to_response(e),
    };
    let total = match services.store_products.count(query.promotional).await {
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
    Path(upc): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::STORE_PRODUCT,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let upc = match parse_upc(&upc) {
        Ok(upc) => upc,
        Err(resp) => return resp,
    };

    match services.store_products.get(&upc).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "store product not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(item): Json<StoreProduct>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::STORE_PRODUCT,
        BasicAction::Create.into(),
    )
    .await
    {
        return resp;
    }

    if let Err(e) = item.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store_products.create(&item).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(upc): Path<String>,
    Json(mut item): Json<StoreProduct>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::STORE_PRODUCT,
        BasicAction::Update.into(),
    )
    .await
    {
        return resp;
    }

    let upc = match parse_upc(&upc) {
        Ok(upc) => upc,
        Err(resp) => return resp,
    };
    item.upc = upc;

    if let Err(e) = item.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store_products.update(&item).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn delete_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(upc): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::STORE_PRODUCT,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    let upc = match parse_upc(&upc) {
        Ok(upc) => upc,
        Err(resp) => return resp,
    };

    match services.store_products.delete(&upc).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
