//! Login and session endpoints.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::dto::{LoginRequest, TokenResponse, UserResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

/// POST /auth/token — password login, returns a bearer token.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    match services
        .authenticator
        .login(&body.username, &body.password)
        .await
    {
        Ok((_user, token)) => (
            StatusCode::OK,
            Json(TokenResponse {
                access_token: token,
                token_type: "bearer",
            }),
        )
            .into_response(),
        Err(e) => errors::authn_error_to_response(e),
    }
}

/// GET /auth/me — the authenticated user.
pub async fn me(Extension(current): Extension<CurrentUser>) -> axum::response::Response {
    (StatusCode::OK, Json(UserResponse::from(current.user()))).into_response()
}
