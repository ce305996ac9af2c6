//! MFA enrollment endpoints.
//!
//! Both endpoints re-check the password: enrollment changes account
//! security posture and must not ride on a possibly-stolen bearer token.

use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;

use super::{
    types::{ConfirmMfaRequest, MessageResponse, TotpUriRequest, TotpUriResponse},
    ApiError,
};
use crate::{api::AppState, auth::AuthError};

#[utoipa::path(
    post,
    path = "/v1/mfa/uri",
    request_body = TotpUriRequest,
    responses(
        (status = 201, description = "Provisioning URI for authenticator apps", body = TotpUriResponse),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "mfa"
)]
pub async fn totp_uri(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TotpUriRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation("email and password are required".to_string()).into());
    }

    let uri = state
        .login
        .totp_uri(payload.email.trim(), &payload.password)
        .await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(TotpUriResponse {
            message: "success".to_string(),
            uri,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/mfa/confirm",
    request_body = ConfirmMfaRequest,
    responses(
        (status = 200, description = "MFA enabled", body = MessageResponse),
        (status = 401, description = "Password or code rejected")
    ),
    tag = "mfa"
)]
pub async fn confirm(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ConfirmMfaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation("email and password are required".to_string()).into());
    }

    state
        .login
        .confirm_mfa(payload.email.trim(), &payload.password, &payload.code)
        .await?;
    Ok(Json(MessageResponse::success()))
}
