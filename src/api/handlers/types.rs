//! Request/response types for the API surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{etl::SourceSchema, store::AccountDto};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MfaChallengeResponse {
    pub message: String,
    pub mfa_required: bool,
    pub challenge_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MfaVerifyRequest {
    pub challenge_id: String,
    /// 6 ASCII digits; a string so leading zeros survive transport.
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TotpUriRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TotpUriResponse {
    pub message: String,
    pub uri: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ConfirmMfaRequest {
    pub email: String,
    pub password: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn success() -> Self {
        Self {
            message: "success".to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// One of SUPERADMIN, ADMIN, GUEST.
    pub role: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub message: String,
    pub account: AccountDto,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountListResponse {
    pub message: String,
    pub accounts: Vec<AccountDto>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ConfigResponse {
    pub enforce_mfa: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub key: String,
    /// One of INTERNAL, EXTERNAL.
    pub scope: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateProjectRequest {
    pub name: String,
    pub key: String,
    /// One of SANDBOX, PRODUCTION.
    pub stage: String,
    pub business_domain: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateDataSourceRequest {
    pub project_key: String,
    pub name: String,
    /// Provider-specific connection settings, forwarded verbatim.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SourceSchemasResponse {
    pub message: String,
    pub schemas: Vec<SourceSchema>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DataSourceResponse {
    pub message: String,
    pub id: Uuid,
    pub source_id: Option<String>,
}
