//! Organization endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{conflict, forbidden, not_found, store_failure, types::CreateOrganizationRequest, unprocessable, Principal};
use crate::{
    api::AppState,
    store::{OrgScope, Organization, StoreError},
};

#[utoipa::path(
    post,
    path = "/v1/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 409, description = "Name or key already taken"),
        (status = 422, description = "Invalid scope")
    ),
    tag = "organizations"
)]
pub async fn create(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateOrganizationRequest>,
) -> Response {
    if !principal.can_write() {
        return forbidden();
    }
    if payload.name.trim().is_empty() || payload.key.trim().is_empty() {
        return unprocessable("name and key are required");
    }
    let Ok(scope) = OrgScope::parse(&payload.scope) else {
        return unprocessable("invalid organization scope");
    };

    let organization = Organization {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        key: payload.key.trim().to_string(),
        scope,
    };

    match state.stores.organizations.create(organization).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(json!({ "message": "success", "organization": created })),
        )
            .into_response(),
        Err(StoreError::Conflict(detail)) => conflict(&format!("{detail} already exists")),
        Err(err) => store_failure(&err),
    }
}

#[utoipa::path(
    get,
    path = "/v1/organizations/{key}",
    params(("key" = String, Path, description = "Organization key")),
    responses(
        (status = 200, description = "Organization", body = Organization),
        (status = 404, description = "Unknown key")
    ),
    tag = "organizations"
)]
pub async fn retrieve(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    match state.stores.organizations.find_by_key(&key).await {
        Ok(Some(organization)) => Json(json!({
            "message": "success",
            "organization": organization,
        }))
        .into_response(),
        Ok(None) => not_found(),
        Err(err) => store_failure(&err),
    }
}
