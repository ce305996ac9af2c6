//! Airbyte-backed ETL provider.
//!
//! Provider calls authenticate with a short-lived OAuth access token that is
//! cached under its own namespace; a cache outage only costs an extra token
//! request, never a failed provider call.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tracing::warn;

use crate::cache::Cache;

use super::{EtlError, EtlProvider, SourceSchema};

/// Cache key for the provider access token (third cache namespace).
const ACCESS_TOKEN_KEY: &str = "etl-access-token:airbyte";

// Airbyte application tokens live for three minutes; cache slightly less.
const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(150);

#[derive(Debug, Clone)]
pub struct AirbyteConfig {
    pub endpoint: String,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Cloud deployments omit the `/api` path prefix.
    pub cloud: bool,
}

pub struct AirbyteProvider {
    http: reqwest::Client,
    config: AirbyteConfig,
    cache: Arc<dyn Cache>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct CreateSourceResponse {
    #[serde(rename = "sourceId")]
    source_id: String,
}

#[derive(Deserialize)]
struct StreamsResponse {
    streams: Vec<Stream>,
}

#[derive(Deserialize)]
struct Stream {
    #[serde(rename = "streamName")]
    stream_name: String,
    #[serde(rename = "streamNamespace", default)]
    stream_namespace: String,
    #[serde(rename = "sourceDefinedPrimaryKey", default)]
    source_defined_primary_key: Vec<Vec<String>>,
    #[serde(rename = "propertyFields", default)]
    property_fields: Vec<Vec<String>>,
}

impl From<Stream> for SourceSchema {
    fn from(stream: Stream) -> Self {
        Self {
            name: stream.stream_name,
            namespace: stream.stream_namespace,
            primary_keys: stream.source_defined_primary_key,
            fields: stream.property_fields,
        }
    }
}

impl AirbyteProvider {
    #[must_use]
    pub fn new(config: AirbyteConfig, cache: Arc<dyn Cache>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            cache,
        }
    }

    fn api_url(&self, path: &str) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        if self.config.cloud {
            format!("{base}{path}")
        } else {
            format!("{base}/api{path}")
        }
    }

    async fn access_token(&self) -> Result<String, EtlError> {
        if let Ok(Some(token)) = self.cache.get(ACCESS_TOKEN_KEY).await {
            return Ok(token);
        }

        let response = self
            .http
            .post(self.api_url("/v1/applications/token"))
            .json(&json!({
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret.expose_secret(),
            }))
            .send()
            .await
            .map_err(|err| EtlError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EtlError::Provider(format!(
                "token request returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| EtlError::Provider(err.to_string()))?;

        if let Err(err) = self
            .cache
            .set(ACCESS_TOKEN_KEY, &token.access_token, ACCESS_TOKEN_TTL)
            .await
        {
            warn!("failed to cache provider access token: {err}");
        }

        Ok(token.access_token)
    }
}

#[async_trait]
impl EtlProvider for AirbyteProvider {
    async fn create_source(
        &self,
        name: &str,
        configuration: &serde_json::Value,
    ) -> Result<String, EtlError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.api_url("/v1/sources"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "configuration": configuration }))
            .send()
            .await
            .map_err(|err| EtlError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EtlError::Provider(format!(
                "source creation returned {}",
                response.status()
            )));
        }

        let created: CreateSourceResponse = response
            .json()
            .await
            .map_err(|err| EtlError::Provider(err.to_string()))?;
        Ok(created.source_id)
    }

    async fn delete_source(&self, source_id: &str) -> Result<(), EtlError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .delete(self.api_url(&format!("/v1/sources/{source_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| EtlError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EtlError::Provider(format!(
                "source deletion returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn test_source(&self, source_id: &str) -> Result<(), EtlError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(self.api_url(&format!("/v1/sources/{source_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| EtlError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EtlError::Provider(format!(
                "source check returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn source_schemas(&self, source_id: &str) -> Result<Vec<SourceSchema>, EtlError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(self.api_url("/v1/streams"))
            .query(&[("sourceId", source_id)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| EtlError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EtlError::Provider(format!(
                "stream discovery returned {}",
                response.status()
            )));
        }

        let streams: StreamsResponse = response
            .json()
            .await
            .map_err(|err| EtlError::Provider(err.to_string()))?;
        Ok(streams.streams.into_iter().map(SourceSchema::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    #[test]
    fn stream_maps_to_normalized_schema() {
        let stream = Stream {
            stream_name: "orders".to_string(),
            stream_namespace: "public".to_string(),
            source_defined_primary_key: vec![vec!["id".to_string()]],
            property_fields: vec![vec!["id".to_string()], vec!["total".to_string()]],
        };
        let schema = SourceSchema::from(stream);
        assert_eq!(schema.name, "orders");
        assert_eq!(schema.namespace, "public");
        assert_eq!(schema.primary_keys, vec![vec!["id".to_string()]]);
        assert_eq!(schema.fields.len(), 2);
    }

    #[test]
    fn self_hosted_deployments_get_the_api_prefix() {
        let cache = Arc::new(MemoryCache::new());
        let hosted = AirbyteProvider::new(
            AirbyteConfig {
                endpoint: "http://airbyte.internal/".to_string(),
                client_id: "id".to_string(),
                client_secret: SecretString::from("secret"),
                cloud: false,
            },
            cache.clone(),
        );
        assert_eq!(
            hosted.api_url("/v1/sources"),
            "http://airbyte.internal/api/v1/sources"
        );

        let cloud = AirbyteProvider::new(
            AirbyteConfig {
                endpoint: "https://api.airbyte.com".to_string(),
                client_id: "id".to_string(),
                client_secret: SecretString::from("secret"),
                cloud: true,
            },
            cache,
        );
        assert_eq!(
            cloud.api_url("/v1/sources"),
            "https://api.airbyte.com/v1/sources"
        );
    }
}
