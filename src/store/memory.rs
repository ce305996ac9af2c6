//! In-process store backend.

use async_trait::async_trait;
use std::{collections::HashMap, sync::RwLock};
use uuid::Uuid;

use super::{
    models::{Account, DataSource, Organization, Project},
    AccountStore, BootstrapStore, DataSourceStore, OrganizationStore, ProjectStore, StoreError,
};

/// Hash-map backed store with the same uniqueness rules as the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, Account>>,
    bootstrap_token: RwLock<Option<String>>,
    organizations: RwLock<HashMap<String, Organization>>,
    projects: RwLock<HashMap<String, Project>>,
    datasources: RwLock<HashMap<Uuid, DataSource>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl std::fmt::Debug) -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        Ok(accounts.get(email).cloned())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by_key(|account| account.created_at_unix);
        Ok(all)
    }

    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().map_err(poisoned)?;
        if accounts.contains_key(&account.email) {
            return Err(StoreError::Conflict("email".to_string()));
        }
        accounts.insert(account.email.clone(), account.clone());
        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().map_err(poisoned)?;
        match accounts.get_mut(&account.email) {
            Some(existing) => {
                *existing = account.clone();
                Ok(())
            }
            None => Err(StoreError::Backend("account vanished".to_string())),
        }
    }
}

#[async_trait]
impl BootstrapStore for MemoryStore {
    async fn find_record(&self) -> Result<Option<String>, StoreError> {
        let token = self.bootstrap_token.read().map_err(poisoned)?;
        Ok(token.clone())
    }

    async fn create_record(&self, token: &str) -> Result<(), StoreError> {
        let mut stored = self.bootstrap_token.write().map_err(poisoned)?;
        if stored.is_some() {
            return Err(StoreError::Conflict("bootstrap record".to_string()));
        }
        *stored = Some(token.to_string());
        Ok(())
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create(&self, organization: Organization) -> Result<Organization, StoreError> {
        let mut organizations = self.organizations.write().map_err(poisoned)?;
        if organizations.contains_key(&organization.key)
            || organizations
                .values()
                .any(|existing| existing.name == organization.name)
        {
            return Err(StoreError::Conflict("organization".to_string()));
        }
        organizations.insert(organization.key.clone(), organization.clone());
        Ok(organization)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Organization>, StoreError> {
        let organizations = self.organizations.read().map_err(poisoned)?;
        Ok(organizations.get(key).cloned())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create(&self, project: Project) -> Result<Project, StoreError> {
        let mut projects = self.projects.write().map_err(poisoned)?;
        if projects.contains_key(&project.key)
            || projects.values().any(|existing| existing.name == project.name)
        {
            return Err(StoreError::Conflict("project".to_string()));
        }
        projects.insert(project.key.clone(), project.clone());
        Ok(project)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Project>, StoreError> {
        let projects = self.projects.read().map_err(poisoned)?;
        Ok(projects.get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let projects = self.projects.read().map_err(poisoned)?;
        let mut all: Vec<Project> = projects.values().cloned().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(all)
    }
}

#[async_trait]
impl DataSourceStore for MemoryStore {
    async fn create(&self, datasource: DataSource) -> Result<DataSource, StoreError> {
        let mut datasources = self.datasources.write().map_err(poisoned)?;
        datasources.insert(datasource.id, datasource.clone());
        Ok(datasource)
    }

    async fn find(&self, id: Uuid) -> Result<Option<DataSource>, StoreError> {
        let datasources = self.datasources.read().map_err(poisoned)?;
        Ok(datasources.get(&id).cloned())
    }

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<DataSource>, StoreError> {
        let datasources = self.datasources.read().map_err(poisoned)?;
        Ok(datasources
            .values()
            .filter(|datasource| datasource.project_id == project_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::models::{AccountRole, AuditActor, OrgScope, ProjectStage, ProjectStatus};
    use super::*;

    fn account(email: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: email.to_string(),
            email: email.to_string(),
            password_hash: "$2b$12$hash".to_string(),
            role: AccountRole::Guest,
            mfa_enabled: false,
            mfa_secret: "SECRET".to_string(),
            created_at_unix: 0,
        }
    }

    #[tokio::test]
    async fn account_create_find_update() {
        let store = MemoryStore::new();
        AccountStore::create(&store, account("a@example.com"))
            .await
            .unwrap();

        let mut found = AccountStore::find_by_email(&store, "a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(!found.mfa_enabled);

        found.mfa_enabled = true;
        store.update(&found).await.unwrap();
        let found = AccountStore::find_by_email(&store, "a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(found.mfa_enabled);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        AccountStore::create(&store, account("a@example.com"))
            .await
            .unwrap();
        let err = AccountStore::create(&store, account("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn bootstrap_record_is_write_once() {
        let store = MemoryStore::new();
        assert_eq!(store.find_record().await.unwrap(), None);

        store.create_record("abc").await.unwrap();
        assert_eq!(store.find_record().await.unwrap(), Some("abc".to_string()));
        assert!(store.create_record("xyz").await.is_err());
    }

    #[tokio::test]
    async fn organization_key_is_unique() {
        let store = MemoryStore::new();
        let org = Organization {
            id: Uuid::new_v4(),
            name: "Core".to_string(),
            key: "core".to_string(),
            scope: OrgScope::Internal,
        };
        OrganizationStore::create(&store, org.clone()).await.unwrap();
        assert!(OrganizationStore::create(&store, org).await.is_err());
        assert!(OrganizationStore::find_by_key(&store, "core")
            .await
            .unwrap()
            .is_some());
        assert!(OrganizationStore::find_by_key(&store, "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn datasources_are_scoped_to_their_project() {
        let store = MemoryStore::new();
        let project = Project {
            id: Uuid::new_v4(),
            name: "Ingest".to_string(),
            key: "ingest".to_string(),
            status: ProjectStatus::Active,
            stage: ProjectStage::Sandbox,
            business_domain: "MARKETPLACE".to_string(),
            created_by: AuditActor {
                email: "a@example.com".to_string(),
                role: AccountRole::Admin,
            },
        };
        ProjectStore::create(&store, project.clone()).await.unwrap();

        let datasource = DataSource {
            id: Uuid::new_v4(),
            project_id: project.id,
            name: "events".to_string(),
            source_id: None,
        };
        DataSourceStore::create(&store, datasource.clone())
            .await
            .unwrap();

        let listed = store.list_for_project(project.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(store
            .list_for_project(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
        assert!(store.find(datasource.id).await.unwrap().is_some());
    }
}
