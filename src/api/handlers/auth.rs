//! Login, MFA verification, and refresh-token endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use super::{
    types::{
        LoginRequest, MessageResponse, MfaChallengeResponse, MfaVerifyRequest,
        RefreshTokenRequest, TokenResponse,
    },
    ApiError,
};
use crate::{
    api::AppState,
    auth::{AuthError, LoginOutcome, TokenPair},
};

fn token_response(pair: TokenPair) -> Json<TokenResponse> {
    Json(TokenResponse {
        message: "success".to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    })
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Tokens issued or MFA challenge created", body = TokenResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 422, description = "Malformed request")
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation("email and password are required".to_string()).into());
    }

    match state.login.login(payload.email.trim(), &payload.password).await? {
        LoginOutcome::Authenticated(pair) => Ok(token_response(pair).into_response()),
        LoginOutcome::MfaRequired { challenge_id } => Ok((
            StatusCode::OK,
            Json(MfaChallengeResponse {
                message: "success".to_string(),
                mfa_required: true,
                challenge_id,
            }),
        )
            .into_response()),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/mfa",
    request_body = MfaVerifyRequest,
    responses(
        (status = 200, description = "Tokens issued", body = TokenResponse),
        (status = 401, description = "Challenge or code rejected")
    ),
    tag = "auth"
)]
pub async fn mfa(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<MfaVerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.challenge_id.trim().is_empty() {
        return Err(AuthError::Validation("challenge_id is required".to_string()).into());
    }

    let pair = state
        .login
        .verify_mfa(payload.challenge_id.trim(), &payload.code)
        .await?;
    Ok(token_response(pair))
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Rotated token pair", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state.tokens.refresh(&payload.refresh_token).await?;
    Ok(token_response(pair))
}

#[utoipa::path(
    post,
    path = "/v1/auth/revoke",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token revoked (idempotent)", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn revoke(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.tokens.revoke(&payload.refresh_token).await?;
    Ok(Json(MessageResponse::success()))
}
