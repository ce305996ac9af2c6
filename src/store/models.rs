//! Domain records persisted by the stores.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountRole {
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "GUEST")]
    Guest,
}

impl AccountRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPERADMIN",
            Self::Admin => "ADMIN",
            Self::Guest => "GUEST",
        }
    }

    /// Parse a stored or user-supplied role name.
    ///
    /// # Errors
    /// Returns the offending value for anything but the three known roles.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "SUPERADMIN" => Ok(Self::SuperAdmin),
            "ADMIN" => Ok(Self::Admin),
            "GUEST" => Ok(Self::Guest),
            other => Err(format!("invalid account role: {other}")),
        }
    }

    /// Whether this role may mutate platform resources.
    #[must_use]
    pub fn can_write(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

/// A role scoped to a resource tier, carried in access-token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedRole {
    pub scope: String,
    pub role: AccountRole,
}

impl ScopedRole {
    /// The organization-wide scope every account role lives in today.
    #[must_use]
    pub fn org(role: AccountRole) -> Self {
        Self {
            scope: "org".to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: AccountRole,
    pub mfa_enabled: bool,
    /// Present from creation so enabling MFA never needs a migration.
    pub mfa_secret: String,
    pub created_at_unix: i64,
}

/// Account shape exposed over the API; credential fields never leave the
/// store layer.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AccountDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[schema(value_type = String)]
    pub role: AccountRole,
    pub mfa_enabled: bool,
    pub created_at_unix: i64,
}

impl From<&Account> for AccountDto {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            mfa_enabled: account.mfa_enabled,
            created_at_unix: account.created_at_unix,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrgScope {
    #[serde(rename = "INTERNAL")]
    Internal,
    #[serde(rename = "EXTERNAL")]
    External,
}

impl OrgScope {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "INTERNAL",
            Self::External => "EXTERNAL",
        }
    }

    /// # Errors
    /// Returns the offending value for unknown scopes.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "INTERNAL" => Ok(Self::Internal),
            "EXTERNAL" => Ok(Self::External),
            other => Err(format!("invalid organization scope: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    #[schema(value_type = String)]
    pub scope: OrgScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "PAUSED")]
    Paused,
    #[serde(rename = "ARCHIVED")]
    Archived,
}

impl ProjectStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Archived => "ARCHIVED",
        }
    }

    /// # Errors
    /// Returns the offending value for unknown statuses.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "ARCHIVED" => Ok(Self::Archived),
            other => Err(format!("invalid project status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStage {
    #[serde(rename = "SANDBOX")]
    Sandbox,
    #[serde(rename = "PRODUCTION")]
    Production,
}

impl ProjectStage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "SANDBOX",
            Self::Production => "PRODUCTION",
        }
    }

    /// # Errors
    /// Returns the offending value for unknown stages.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "SANDBOX" => Ok(Self::Sandbox),
            "PRODUCTION" => Ok(Self::Production),
            other => Err(format!("invalid project stage: {other}")),
        }
    }
}

/// Who created a record, as a typed structure rather than a string map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuditActor {
    pub email: String,
    #[schema(value_type = String)]
    pub role: AccountRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    #[schema(value_type = String)]
    pub status: ProjectStatus,
    #[schema(value_type = String)]
    pub stage: ProjectStage,
    pub business_domain: String,
    pub created_by: AuditActor,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataSource {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    /// Connection id at the ETL provider, when one is configured.
    pub source_id: Option<String>,
}

#[must_use]
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [AccountRole::SuperAdmin, AccountRole::Admin, AccountRole::Guest] {
            assert_eq!(AccountRole::parse(role.as_str()), Ok(role));
        }
        assert!(AccountRole::parse("ROOT").is_err());
    }

    #[test]
    fn write_permission_follows_role() {
        assert!(AccountRole::SuperAdmin.can_write());
        assert!(AccountRole::Admin.can_write());
        assert!(!AccountRole::Guest.can_write());
    }

    #[test]
    fn dto_hides_credential_fields() {
        let account = Account {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            role: AccountRole::Admin,
            mfa_enabled: false,
            mfa_secret: "SECRET".to_string(),
            created_at_unix: 1_700_000_000,
        };
        let value = serde_json::to_value(AccountDto::from(&account)).unwrap();
        assert!(value.get("password_hash").is_none());
        assert!(value.get("mfa_secret").is_none());
        assert_eq!(value["role"], "ADMIN");
    }

    #[test]
    fn scoped_role_serializes_as_tagged_struct() {
        let value = serde_json::to_value(ScopedRole::org(AccountRole::Guest)).unwrap();
        assert_eq!(value["scope"], "org");
        assert_eq!(value["role"], "GUEST");
    }
}
