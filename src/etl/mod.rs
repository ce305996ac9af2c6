//! Outbound ETL provider integration.
//!
//! The platform only needs four operations from a provider; everything else
//! about the provider API stays behind this trait.

pub mod airbyte;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use airbyte::{AirbyteConfig, AirbyteProvider};

#[derive(Debug, Error)]
pub enum EtlError {
    /// The provider rejected the request.
    #[error("etl provider error: {0}")]
    Provider(String),

    /// The provider could not be reached.
    #[error("etl provider unavailable: {0}")]
    Unavailable(String),
}

/// Normalized shape of a source stream, independent of the provider.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SourceSchema {
    pub name: String,
    pub namespace: String,
    pub primary_keys: Vec<Vec<String>>,
    pub fields: Vec<Vec<String>>,
}

#[async_trait]
pub trait EtlProvider: Send + Sync {
    /// Create a source connection, returning the provider's id for it.
    async fn create_source(
        &self,
        name: &str,
        configuration: &serde_json::Value,
    ) -> Result<String, EtlError>;

    async fn delete_source(&self, source_id: &str) -> Result<(), EtlError>;

    async fn test_source(&self, source_id: &str) -> Result<(), EtlError>;

    async fn source_schemas(&self, source_id: &str) -> Result<Vec<SourceSchema>, EtlError>;
}
