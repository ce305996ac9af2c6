//! Data source endpoints.
//!
//! Creation registers the source with the ETL provider when one is
//! configured; a provider failure rolls the request back rather than leaving
//! a half-registered source.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{
    forbidden, not_found, store_failure,
    types::{CreateDataSourceRequest, DataSourceResponse, SourceSchemasResponse},
    unprocessable, Principal,
};
use crate::{api::AppState, store::DataSource};

#[utoipa::path(
    post,
    path = "/v1/datasources",
    request_body = CreateDataSourceRequest,
    responses(
        (status = 201, description = "Data source created", body = DataSourceResponse),
        (status = 404, description = "Unknown project"),
        (status = 502, description = "ETL provider rejected the source")
    ),
    tag = "datasources"
)]
pub async fn create(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateDataSourceRequest>,
) -> Response {
    if !principal.can_write() {
        return forbidden();
    }
    if payload.name.trim().is_empty() {
        return unprocessable("name is required");
    }

    let project = match state.stores.projects.find_by_key(payload.project_key.trim()).await {
        Ok(Some(project)) => project,
        Ok(None) => return not_found(),
        Err(err) => return store_failure(&err),
    };

    let source_id = if let Some(provider) = &state.etl {
        match provider
            .create_source(payload.name.trim(), &payload.configuration)
            .await
        {
            Ok(source_id) => Some(source_id),
            Err(err) => {
                error!("provider rejected source creation: {err}");
                return (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "etl provider rejected the source" })),
                )
                    .into_response();
            }
        }
    } else {
        None
    };

    let datasource = DataSource {
        id: Uuid::new_v4(),
        project_id: project.id,
        name: payload.name.trim().to_string(),
        source_id,
    };

    match state.stores.datasources.create(datasource.clone()).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(DataSourceResponse {
                message: "success".to_string(),
                id: created.id,
                source_id: created.source_id,
            }),
        )
            .into_response(),
        Err(err) => {
            // Compensate: drop the provider-side source so it is not orphaned.
            if let (Some(provider), Some(source_id)) = (&state.etl, datasource.source_id.as_deref())
            {
                let _ = provider.delete_source(source_id).await;
            }
            store_failure(&err)
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/projects/{key}/datasources",
    params(("key" = String, Path, description = "Project key")),
    responses(
        (status = 200, description = "Data sources for the project"),
        (status = 404, description = "Unknown project")
    ),
    tag = "datasources"
)]
pub async fn list_for_project(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    let project = match state.stores.projects.find_by_key(&key).await {
        Ok(Some(project)) => project,
        Ok(None) => return not_found(),
        Err(err) => return store_failure(&err),
    };

    match state.stores.datasources.list_for_project(project.id).await {
        Ok(datasources) => {
            Json(json!({ "message": "success", "datasources": datasources })).into_response()
        }
        Err(err) => store_failure(&err),
    }
}

#[utoipa::path(
    get,
    path = "/v1/datasources/{id}/schemas",
    params(("id" = Uuid, Path, description = "Data source id")),
    responses(
        (status = 200, description = "Discovered source schemas", body = SourceSchemasResponse),
        (status = 404, description = "Unknown data source or no provider connection")
    ),
    tag = "datasources"
)]
pub async fn schemas(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    let datasource = match state.stores.datasources.find(id).await {
        Ok(Some(datasource)) => datasource,
        Ok(None) => return not_found(),
        Err(err) => return store_failure(&err),
    };

    let (Some(provider), Some(source_id)) = (&state.etl, &datasource.source_id) else {
        return not_found();
    };

    match provider.source_schemas(source_id).await {
        Ok(schemas) => Json(SourceSchemasResponse {
            message: "success".to_string(),
            schemas,
        })
        .into_response(),
        Err(err) => {
            error!("schema discovery failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "etl provider unavailable" })),
            )
                .into_response()
        }
    }
}
