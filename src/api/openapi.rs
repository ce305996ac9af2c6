//! OpenAPI document for the API surface.

use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "dataforge",
        description = "Multi-tenant data platform management API",
    ),
    paths(
        handlers::health::health,
        handlers::appconfig::config,
        handlers::auth::login,
        handlers::auth::mfa,
        handlers::auth::refresh,
        handlers::auth::revoke,
        handlers::mfa::totp_uri,
        handlers::mfa::confirm,
        handlers::accounts::create,
        handlers::accounts::list,
        handlers::orgs::create,
        handlers::orgs::retrieve,
        handlers::projects::create,
        handlers::projects::retrieve,
        handlers::projects::list,
        handlers::datasources::create,
        handlers::datasources::list_for_project,
        handlers::datasources::schemas,
    ),
    components(schemas(
        handlers::types::LoginRequest,
        handlers::types::TokenResponse,
        handlers::types::MfaChallengeResponse,
        handlers::types::MfaVerifyRequest,
        handlers::types::RefreshTokenRequest,
        handlers::types::TotpUriRequest,
        handlers::types::TotpUriResponse,
        handlers::types::ConfirmMfaRequest,
        handlers::types::MessageResponse,
        handlers::types::CreateAccountRequest,
        handlers::types::AccountResponse,
        handlers::types::AccountListResponse,
        handlers::types::ConfigResponse,
        handlers::types::CreateOrganizationRequest,
        handlers::types::CreateProjectRequest,
        handlers::types::CreateDataSourceRequest,
        handlers::types::SourceSchemasResponse,
        handlers::types::DataSourceResponse,
        crate::store::Organization,
        crate::store::Project,
    ))
)]
pub struct ApiDoc;

pub async fn serve() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
