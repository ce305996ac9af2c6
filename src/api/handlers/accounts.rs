//! Account management endpoints (admin only).

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{
    forbidden,
    types::{AccountListResponse, AccountResponse, CreateAccountRequest},
    unprocessable, ApiError, Principal,
};
use crate::{
    api::AppState,
    store::{AccountDto, AccountRole},
};

#[utoipa::path(
    post,
    path = "/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 403, description = "Caller may not manage accounts"),
        (status = 422, description = "Invalid role or weak password")
    ),
    tag = "accounts"
)]
pub async fn create(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Response, ApiError> {
    if !principal.can_write() {
        return Ok(forbidden());
    }

    let Ok(role) = AccountRole::parse(&payload.role) else {
        return Ok(unprocessable("invalid role"));
    };

    let account = state
        .accounts
        .create(
            payload.name.trim(),
            payload.email.trim(),
            &payload.password,
            role,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            message: "success".to_string(),
            account: AccountDto::from(&account),
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/v1/accounts",
    responses(
        (status = 200, description = "All accounts", body = AccountListResponse),
        (status = 403, description = "Caller may not manage accounts")
    ),
    tag = "accounts"
)]
pub async fn list(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, ApiError> {
    if !principal.can_write() {
        return Ok(forbidden());
    }

    let accounts = state.accounts.list().await?;
    Ok(Json(AccountListResponse {
        message: "success".to_string(),
        accounts: accounts.iter().map(AccountDto::from).collect(),
    })
    .into_response())
}
