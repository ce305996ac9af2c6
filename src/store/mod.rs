//! Persistence contracts and backends.
//!
//! The auth core and the handlers only ever see these traits; the backend
//! (PostgreSQL or in-process memory) is chosen once at startup from the
//! presence of a DSN, mirroring how the cache backend is selected.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{
    Account, AccountDto, AccountRole, AuditActor, DataSource, OrgScope, Organization, Project,
    ProjectStage, ProjectStatus, ScopedRole,
};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint (email, key, name) was violated.
    #[error("{0} already exists")]
    Conflict(String),

    /// The backend could not be reached or returned a malformed row.
    #[error("store unavailable: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn list(&self) -> Result<Vec<Account>, StoreError>;

    async fn create(&self, account: Account) -> Result<Account, StoreError>;

    async fn update(&self, account: &Account) -> Result<(), StoreError>;
}

#[async_trait]
pub trait BootstrapStore: Send + Sync {
    /// The persisted bootstrap token, if one was ever written.
    async fn find_record(&self) -> Result<Option<String>, StoreError>;

    async fn create_record(&self, token: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn create(&self, organization: Organization) -> Result<Organization, StoreError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<Organization>, StoreError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, project: Project) -> Result<Project, StoreError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<Project>, StoreError>;

    async fn list(&self) -> Result<Vec<Project>, StoreError>;
}

#[async_trait]
pub trait DataSourceStore: Send + Sync {
    async fn create(&self, datasource: DataSource) -> Result<DataSource, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<DataSource>, StoreError>;

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<DataSource>, StoreError>;
}

/// The full set of store handles the service runs against. All handles point
/// at the same backend instance.
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub bootstrap: Arc<dyn BootstrapStore>,
    pub organizations: Arc<dyn OrganizationStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub datasources: Arc<dyn DataSourceStore>,
}

impl Stores {
    fn from_shared<S>(backend: Arc<S>) -> Self
    where
        S: AccountStore
            + BootstrapStore
            + OrganizationStore
            + ProjectStore
            + DataSourceStore
            + 'static,
    {
        Self {
            accounts: backend.clone(),
            bootstrap: backend.clone(),
            organizations: backend.clone(),
            projects: backend.clone(),
            datasources: backend,
        }
    }

    /// In-process store, used for tests and DSN-less development runs.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_shared(Arc::new(MemoryStore::new()))
    }

    /// Connect to PostgreSQL and create missing tables.
    ///
    /// # Errors
    /// Fails if the pool cannot be established or migration fails.
    pub async fn connect_postgres(dsn: &str) -> Result<Self, StoreError> {
        let store = PgStore::connect(dsn).await?;
        Ok(Self::from_shared(Arc::new(store)))
    }
}
