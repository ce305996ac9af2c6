//! Project endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{conflict, forbidden, not_found, store_failure, types::CreateProjectRequest, unprocessable, Principal};
use crate::{
    api::AppState,
    store::{AuditActor, Project, ProjectStage, ProjectStatus, StoreError},
};

#[utoipa::path(
    post,
    path = "/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 409, description = "Name or key already taken"),
        (status = 422, description = "Invalid stage")
    ),
    tag = "projects"
)]
pub async fn create(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateProjectRequest>,
) -> Response {
    if !principal.can_write() {
        return forbidden();
    }
    if payload.name.trim().is_empty() || payload.key.trim().is_empty() {
        return unprocessable("name and key are required");
    }
    let Ok(stage) = ProjectStage::parse(&payload.stage) else {
        return unprocessable("invalid project stage");
    };

    // New projects start active; the audit actor comes from the verified
    // principal, never from the payload.
    let creator_role = principal
        .roles
        .first()
        .map(|scoped| scoped.role)
        .unwrap_or(crate::store::AccountRole::Guest);
    let project = Project {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        key: payload.key.trim().to_string(),
        status: ProjectStatus::Active,
        stage,
        business_domain: payload.business_domain.trim().to_string(),
        created_by: AuditActor {
            email: principal.email.clone(),
            role: creator_role,
        },
    };

    match state.stores.projects.create(project).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(json!({ "message": "success", "project": created })),
        )
            .into_response(),
        Err(StoreError::Conflict(detail)) => conflict(&format!("{detail} already exists")),
        Err(err) => store_failure(&err),
    }
}

#[utoipa::path(
    get,
    path = "/v1/projects/{key}",
    params(("key" = String, Path, description = "Project key")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 404, description = "Unknown key")
    ),
    tag = "projects"
)]
pub async fn retrieve(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    match state.stores.projects.find_by_key(&key).await {
        Ok(Some(project)) => {
            Json(json!({ "message": "success", "project": project })).into_response()
        }
        Ok(None) => not_found(),
        Err(err) => store_failure(&err),
    }
}

#[utoipa::path(
    get,
    path = "/v1/projects",
    responses(
        (status = 200, description = "All projects")
    ),
    tag = "projects"
)]
pub async fn list(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.stores.projects.list().await {
        Ok(projects) => {
            Json(json!({ "message": "success", "projects": projects })).into_response()
        }
        Err(err) => store_failure(&err),
    }
}
