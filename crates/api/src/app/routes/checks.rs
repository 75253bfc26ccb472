//! Check (receipt) endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use storekeep_auth::{BasicAction, ResourceType};
use storekeep_core::EmployeeId;
use storekeep_infra::{CheckFilter, CheckRepo, CustomerCardRepo, Page, StoreProductRepo};
use storekeep_parties::CardNumber;
use storekeep_sales::{compute_totals, Check, CheckNumber, Sale};

use crate::app::dto::{CheckListQuery, CreateCheckRequest, Paginated};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:number", get(get_one).delete(delete_one))
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<CheckListQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CHECK,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let employee_id = match query.employee_id.as_deref().map(EmployeeId::new).transpose() {
        Ok(employee_id) => employee_id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let filter = CheckFilter {
        date_from: query.date_from,
        date_to: query.date_to,
        employee_id,
    };

    let limit = query.limit.unwrap_or(10).clamp(1, 1000);
    let data = match services.checks.list(&filter, Page::new(limit, query.skip)).await {
        Ok(data) => data,
        Err(e) => return errors::repo_error_to_response(e),
    };
    let total = match services.checks.count(&filter).await {
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
    Path(number): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CHECK,
        BasicAction::View.into(),
    )
    .await
    {
        return resp;
    }

    let number = match CheckNumber::new(number) {
        Ok(number) => number,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.checks.get(&number).await {
        Ok(Some(check)) => (StatusCode::OK, Json(check)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "check not found"),
        Err(e) => errors::repo_error_to_response(e),
    }
}

/// POST /checks — price the requested lines, apply the loyalty discount,
/// persist the check and decrement shelf stock.
async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateCheckRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CHECK,
        BasicAction::Create.into(),
    )
    .await
    {
        return resp;
    }

    let number = match CheckNumber::new(body.number) {
        Ok(number) => number,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let employee_id = match EmployeeId::new(body.employee_id) {
        Ok(employee_id) => employee_id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let card_number = match body.card_number.map(CardNumber::new).transpose() {
        Ok(card_number) => card_number,
        Err(e) => return errors::domain_error_to_response(e),
    };

    // Price every requested line from the shelf and verify availability.
    let mut sales = Vec::with_capacity(body.sales.len());
    for line in &body.sales {
        let upc = match storekeep_inventory::Upc::new(line.upc.clone()) {
            Ok(upc) => upc,
            Err(e) => return errors::domain_error_to_response(e),
        };
        let item = match services.store_products.get(&upc).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                return errors::json_error(
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("product with UPC {upc} not found"),
                )
            }
            Err(e) => return errors::repo_error_to_response(e),
        };
        if item.quantity < line.quantity {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "insufficient_stock",
                format!(
                    "insufficient stock for UPC {upc}: available {}, requested {}",
                    item.quantity, line.quantity
                ),
            );
        }
        sales.push(Sale {
            upc,
            quantity: line.quantity,
            selling_price: item.selling_price,
        });
    }

    let discount = match &card_number {
        Some(card_number) => match services.customer_cards.get(card_number).await {
            Ok(Some(card)) => Some(card.percent),
            Ok(None) => {
                return errors::json_error(
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("customer card {card_number} not found"),
                )
            }
            Err(e) => return errors::repo_error_to_response(e),
        },
        None => None,
    };

    let totals = compute_totals(&sales, discount);
    let check = Check {
        number,
        employee_id,
        card_number,
        printed_at: body.printed_at,
        total: totals.total,
        vat: totals.vat,
        sales,
    };

    if let Err(e) = check.validate(Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.checks.create(&check).await {
        Ok(check) => {
            tracing::info!(check = %check.number, total = check.total, "created check");
            (StatusCode::CREATED, Json(check)).into_response()
        }
        Err(e) => errors::repo_error_to_response(e),
    }
}

async fn delete_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(number): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(
        &services,
        current.user(),
        &ResourceType::CHECK,
        BasicAction::Delete.into(),
    )
    .await
    {
        return resp;
    }

    let number = match CheckNumber::new(number) {
        Ok(number) => number,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.checks.delete(&number).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repo_error_to_response(e),
    }
}
