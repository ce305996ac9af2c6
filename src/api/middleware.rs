//! Bearer-token middleware for protected routes.

use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::{handlers::Principal, AppState};

/// Validate the bearer access token and stash the resolved [`Principal`] in
/// request extensions for handlers to pick up.
pub(crate) async fn require_auth(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return unauthorized();
    };

    match state.tokens.verify_access_token(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(Principal {
                account_id: claims.sub,
                email: claims.email,
                roles: claims.roles,
            });
            next.run(request).await
        }
        Err(_) => unauthorized(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized" })),
    )
        .into_response()
}
