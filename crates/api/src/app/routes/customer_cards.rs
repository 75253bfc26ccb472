//! Customer loyalty card endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use storekeep_auth::{BasicAction, ResourceType};
use storekeep_infra::{CustomerCardRepo, Page};
use storekeep_parties::{CardNumber, CustomerCard};

use crate::app::dto::{BulkDeleteRequest, ListQuery, Paginated};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:card_number", get(get_one).put(update).delete(delete_one))
        .route("/bulk-delete", post(bulk_delete))
}

fn parse_card_number(raw: &str) -> Result<CardNumber, axum::response::Response> {
    CardNumber::new(raw).map_err(errors::domain_error_to_response)
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CUSTOMER_CARD,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let limit = query.limit();
    let data = match services
        .customer_cards
        .list(query.search.as_deref(), Page::new(limit, query.skip))
        .await
    {
        Ok(data) => data,
        Err(e) => return errors::repo_error_to_response(e),
    };
    let total = match services.customer_cards.count(query.search.as_deref()).await {
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
    Path(card_number): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CUSTOMER_CARD,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let card_number = match parse_card_number(&card_number) {
        Ok(card_number) => card_number,
        Err(resp) => return resp,
    };

    match services.customer_cards.get(&card_number).await {
        Ok(Some(card)) => (StatusCode::OK, Json(card)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "customer card not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(card): Json<CustomerCard>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CUSTOMER_CARD,
        BasicAction::Create.into(),
    )
    .await
    {
        return resp;
    }

    if let Err(e) = card.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.customer_cards.create(&card).await {
        Ok(card) => (StatusCode::CREATED, Json(card)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(card_number): Path<String>,
    Json(mut card): Json<CustomerCard>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CUSTOMER_CARD,
        BasicAction::Update.into(),
    )
    .await
    {
        return resp;
    }

    let card_number = match parse_card_number(&card_number) {
        Ok(card_number) => card_number,
        Err(resp) => return resp,
    };
    card.card_number = card_number;

    if let Err(e) = card.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.customer_cards.update(&card).await {
        Ok(card) => (StatusCode::OK, Json(card)).into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn delete_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(card_number): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CUSTOMER_CARD,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    let card_number = match parse_card_number(&card_number) {
        Ok(card_number) => card_number,
        Err(resp) => return resp,
    };

    match services.customer_cards.delete(&card_number).await {
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
        &ResourceType::CUSTOMER_CARD,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    let mut card_numbers = Vec::with_capacity(body.ids.len());
    for raw in &body.ids {
        match parse_card_number(raw) {
            Ok(card_number) => card_numbers.push(card_number),
            Err(resp) => return resp,
        }
    }

    match services.customer_cards.delete_many(&card_numbers).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
