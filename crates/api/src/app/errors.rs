//! Consistent JSON error responses and error-to-status mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storekeep_auth::{AuthError, AuthnError, StoreError};
use storekeep_core::DomainError;
use storekeep_infra::RepoError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub fn repo_error_to_response(err: RepoError) -> axum::response::Response {
    match err {
        RepoError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        RepoError::AlreadyExists => {
            json_error(StatusCode::CONFLICT, "already_exists", "already exists")
        }
        RepoError::InsufficientStock(upc) => json_error(
            StatusCode::BAD_REQUEST,
            "insufficient_stock",
            format!("insufficient stock for UPC {upc}"),
        ),
        RepoError::InvalidRow(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        RepoError::Backend(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        AuthError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        AuthError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::AlreadyExists => {
            json_error(StatusCode::CONFLICT, "already_exists", "already exists")
        }
        other => {
            tracing::error!(error = %other, "auth storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                other.to_string(),
            )
        }
    }
}

pub fn authn_error_to_response(err: AuthnError) -> axum::response::Response {
    match err {
        AuthnError::UserNotFound | AuthnError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        ),
        AuthnError::UserAlreadyExists => {
            json_error(StatusCode::CONFLICT, "already_exists", "user already exists")
        }
        AuthnError::InvalidToken(e) => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_token", e.to_string())
        }
        AuthnError::Store(e) => store_error_to_response(e),
    }
}
