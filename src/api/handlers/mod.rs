//! HTTP handlers and the error-normalization boundary.
//!
//! Authentication failures of any flavor leave this layer as a bare 401 so
//! the response never reveals whether an account exists, which step failed,
//! or whether a challenge was ever issued.

pub(crate) mod accounts;
pub(crate) mod appconfig;
pub(crate) mod auth;
pub(crate) mod datasources;
pub(crate) mod health;
pub(crate) mod mfa;
pub(crate) mod orgs;
pub(crate) mod projects;
pub(crate) mod types;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{auth::AuthError, store::ScopedRole};

/// The authenticated caller, resolved from a bearer token by the middleware
/// and injected into request extensions.
#[derive(Debug, Clone)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
    pub roles: Vec<ScopedRole>,
}

impl Principal {
    /// Whether any carried role permits writes to platform resources.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.roles.iter().any(|scoped| scoped.role.can_write())
    }
}

/// Wrapper so core errors can be returned straight from handlers.
pub(crate) struct ApiError(pub(crate) AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            err if err.is_unauthorized() => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response(),
            AuthError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": detail })),
            )
                .into_response(),
            AuthError::Policy(violation) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": violation.to_string() })),
            )
                .into_response(),
            AuthError::DependencyUnavailable(err) => {
                error!("dependency unavailable: {err:#}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "service unavailable" })),
                )
                    .into_response()
            }
            other => {
                error!("internal error: {other:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

pub(crate) fn conflict(detail: &str) -> Response {
    (StatusCode::CONFLICT, Json(json!({ "error": detail }))).into_response()
}

pub(crate) fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found" })),
    )
        .into_response()
}

pub(crate) fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "forbidden" })),
    )
        .into_response()
}

pub(crate) fn unprocessable(detail: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": detail })),
    )
        .into_response()
}

pub(crate) fn store_failure(err: &crate::store::StoreError) -> Response {
    error!("store failure: {err}");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "service unavailable" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AccountRole;

    fn principal(role: AccountRole) -> Principal {
        Principal {
            account_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            roles: vec![ScopedRole::org(role)],
        }
    }

    #[test]
    fn write_access_follows_roles() {
        assert!(principal(AccountRole::SuperAdmin).can_write());
        assert!(principal(AccountRole::Admin).can_write());
        assert!(!principal(AccountRole::Guest).can_write());
    }

    #[test]
    fn auth_failures_collapse_to_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::InvalidCode,
            AuthError::ChallengeExpiredOrInvalid,
            AuthError::InvalidToken,
        ] {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn policy_violations_keep_their_detail() {
        let response =
            ApiError(AuthError::Policy(crate::auth::PolicyViolation::TooShort)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
