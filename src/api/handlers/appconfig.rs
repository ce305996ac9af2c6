//! Public runtime configuration consumed by the login UI.

use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;

use super::types::ConfigResponse;
use crate::api::AppState;

#[utoipa::path(
    get,
    path = "/v1/config",
    responses(
        (status = 200, description = "Runtime configuration", body = ConfigResponse)
    ),
    tag = "config"
)]
pub async fn config(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(ConfigResponse {
        enforce_mfa: state.enforce_mfa,
    })
}
