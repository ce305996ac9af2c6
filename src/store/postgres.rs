//! PostgreSQL store backend.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use super::{
    models::{
        Account, AccountRole, AuditActor, DataSource, OrgScope, Organization, Project,
        ProjectStage, ProjectStatus,
    },
    AccountStore, BootstrapStore, DataSourceStore, OrganizationStore, ProjectStore, StoreError,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        id UUID PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL,
        mfa_enabled BOOLEAN NOT NULL DEFAULT FALSE,
        mfa_secret TEXT NOT NULL,
        created_at_unix BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS app_metadata (
        id INT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
        bootstrap_token TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS organizations (
        id UUID PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        key TEXT UNIQUE NOT NULL,
        scope TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        key TEXT UNIQUE NOT NULL,
        status TEXT NOT NULL,
        stage TEXT NOT NULL,
        business_domain TEXT NOT NULL,
        created_by TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS datasources (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects (id),
        name TEXT NOT NULL,
        source_id TEXT
    )",
];

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and create any missing tables.
    ///
    /// # Errors
    /// Fails if the pool cannot be established or schema creation fails.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .map_err(backend)?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await.map_err(backend)?;
        }

        Ok(Self { pool })
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn corrupt(detail: String) -> StoreError {
    StoreError::Backend(format!("corrupt row: {detail}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Result<Account, StoreError> {
    Ok(Account {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: AccountRole::parse(row.get::<String, _>("role").as_str()).map_err(corrupt)?,
        mfa_enabled: row.get("mfa_enabled"),
        mfa_secret: row.get("mfa_secret"),
        created_at_unix: row.get("created_at_unix"),
    })
}

fn project_from_row(row: &sqlx::postgres::PgRow) -> Result<Project, StoreError> {
    let created_by: AuditActor = serde_json::from_str(row.get::<String, _>("created_by").as_str())
        .map_err(|err| corrupt(err.to_string()))?;
    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        key: row.get("key"),
        status: ProjectStatus::parse(row.get::<String, _>("status").as_str()).map_err(corrupt)?,
        stage: ProjectStage::parse(row.get::<String, _>("stage").as_str()).map_err(corrupt)?,
        business_domain: row.get("business_domain"),
        created_by,
    })
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, mfa_enabled, mfa_secret, created_at_unix
             FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, email, password_hash, role, mfa_enabled, mfa_secret, created_at_unix
             FROM accounts ORDER BY created_at_unix",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(account_from_row).collect()
    }

    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let result = sqlx::query(
            "INSERT INTO accounts
                (id, name, email, password_hash, role, mfa_enabled, mfa_secret, created_at_unix)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.mfa_enabled)
        .bind(&account.mfa_secret)
        .bind(account.created_at_unix)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(account),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict("email".to_string())),
            Err(err) => Err(backend(err)),
        }
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE accounts
             SET name = $2, password_hash = $3, role = $4, mfa_enabled = $5, mfa_secret = $6
             WHERE email = $1",
        )
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.mfa_enabled)
        .bind(&account.mfa_secret)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl BootstrapStore for PgStore {
    async fn find_record(&self) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT bootstrap_token FROM app_metadata WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(|row| row.get("bootstrap_token")))
    }

    async fn create_record(&self, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO app_metadata (id, bootstrap_token) VALUES (1, $1)")
            .bind(token)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::Conflict("bootstrap record".to_string()))
            }
            Err(err) => Err(backend(err)),
        }
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn create(&self, organization: Organization) -> Result<Organization, StoreError> {
        let result =
            sqlx::query("INSERT INTO organizations (id, name, key, scope) VALUES ($1, $2, $3, $4)")
                .bind(organization.id)
                .bind(&organization.name)
                .bind(&organization.key)
                .bind(organization.scope.as_str())
                .execute(&self.pool)
                .await;

        match result {
            Ok(_) => Ok(organization),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::Conflict("organization".to_string()))
            }
            Err(err) => Err(backend(err)),
        }
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query("SELECT id, name, key, scope FROM organizations WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|row| {
            Ok(Organization {
                id: row.get("id"),
                name: row.get("name"),
                key: row.get("key"),
                scope: OrgScope::parse(row.get::<String, _>("scope").as_str()).map_err(corrupt)?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create(&self, project: Project) -> Result<Project, StoreError> {
        let created_by = serde_json::to_string(&project.created_by)
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        let result = sqlx::query(
            "INSERT INTO projects (id, name, key, status, stage, business_domain, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.key)
        .bind(project.status.as_str())
        .bind(project.stage.as_str())
        .bind(&project.business_domain)
        .bind(created_by)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(project),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::Conflict("project".to_string()))
            }
            Err(err) => Err(backend(err)),
        }
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, key, status, stage, business_domain, created_by
             FROM projects WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(project_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, key, status, stage, business_domain, created_by
             FROM projects ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(project_from_row).collect()
    }
}

#[async_trait]
impl DataSourceStore for PgStore {
    async fn create(&self, datasource: DataSource) -> Result<DataSource, StoreError> {
        sqlx::query(
            "INSERT INTO datasources (id, project_id, name, source_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(datasource.id)
        .bind(datasource.project_id)
        .bind(&datasource.name)
        .bind(datasource.source_id.as_deref())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(datasource)
    }

    async fn find(&self, id: Uuid) -> Result<Option<DataSource>, StoreError> {
        let row = sqlx::query("SELECT id, project_id, name, source_id FROM datasources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        Ok(row.map(|row| DataSource {
            id: row.get("id"),
            project_id: row.get("project_id"),
            name: row.get("name"),
            source_id: row.get("source_id"),
        }))
    }

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<DataSource>, StoreError> {
        let rows =
            sqlx::query("SELECT id, project_id, name, source_id FROM datasources WHERE project_id = $1")
                .bind(project_id)
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;

        Ok(rows
            .iter()
            .map(|row| DataSource {
                id: row.get("id"),
                project_id: row.get("project_id"),
                name: row.get("name"),
                source_id: row.get("source_id"),
            })
            .collect())
    }
}
