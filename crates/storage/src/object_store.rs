//! Object storage interface for Level 2 granules (S3 compatible).

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use aerosol_common::{AerosolError, AerosolResult};

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// Custom endpoint URL; `None` uses AWS S3
    pub endpoint: Option<String>,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token for temporary credentials
    pub session_token: Option<String>,
    /// AWS region
    pub region: String,
    /// Allow HTTP (for a local endpoint)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            bucket: "prod-lads".to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            region: "us-west-2".to_string(),
            allow_http: false,
        }
    }
}

impl ObjectStorageConfig {
    /// Config for the default bucket with temporary credentials.
    pub fn with_credentials(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: Some(session_token.into()),
            ..Default::default()
        }
    }
}

/// Object storage client for granule reads.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    pub fn new(config: &ObjectStorageConfig) -> AerosolResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        if let Some(token) = &config.session_token {
            builder = builder.with_token(token);
        }

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder.build().map_err(|e| {
            AerosolError::StorageError(format!("Failed to create S3 client: {}", e))
        })?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// Wrap an existing store, e.g. an in-memory one.
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Read bytes from a path.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn get(&self, path: &str) -> AerosolResult<Bytes> {
        let location = Path::from(path);

        let result = self.store.get(&location).await.map_err(|e| {
            AerosolError::StorageError(format!("Failed to read {}: {}", path, e))
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| AerosolError::StorageError(format!("Failed to read bytes: {}", e)))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// Check if an object exists.
    pub async fn exists(&self, path: &str) -> AerosolResult<bool> {
        let location = Path::from(path);

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(AerosolError::StorageError(format!(
                "Failed to check {}: {}",
                path, e
            ))),
        }
    }

    /// List objects with a given prefix.
    pub async fn list(&self, prefix: &str) -> AerosolResult<Vec<String>> {
        use futures::TryStreamExt;

        let prefix_path = Path::from(prefix);
        let mut paths = Vec::new();

        let mut stream = self.store.list(Some(&prefix_path));
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|e| AerosolError::StorageError(format!("List failed: {}", e)))?
        {
            paths.push(meta.location.to_string());
        }

        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    async fn seeded() -> ObjectStorage {
        let store = InMemory::new();
        for name in ["b.nc", "a.nc"] {
            store
                .put(
                    &Path::from(format!("AERDB_L2_VIIRS_SNPP/{}", name)),
                    Bytes::from_static(b"granule").into(),
                )
                .await
                .unwrap();
        }
        ObjectStorage::from_store(Arc::new(store), "prod-lads")
    }

    #[test]
    fn test_default_config_targets_laads_bucket() {
        let config = ObjectStorageConfig::with_credentials("key", "secret", "token");
        assert_eq!(config.bucket, "prod-lads");
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.session_token.as_deref(), Some("token"));
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = ObjectStorageConfig::with_credentials("key", "secret", "token");
        let storage = ObjectStorage::new(&config).unwrap();
        assert_eq!(storage.bucket(), "prod-lads");
    }

    #[tokio::test]
    async fn test_get_and_exists() {
        let storage = seeded().await;
        let bytes = storage.get("AERDB_L2_VIIRS_SNPP/a.nc").await.unwrap();
        assert_eq!(&bytes[..], b"granule");

        assert!(storage.exists("AERDB_L2_VIIRS_SNPP/b.nc").await.unwrap());
        assert!(!storage.exists("AERDB_L2_VIIRS_SNPP/c.nc").await.unwrap());
        assert!(storage.get("AERDB_L2_VIIRS_SNPP/c.nc").await.is_err());
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let storage = seeded().await;
        let paths = storage.list("AERDB_L2_VIIRS_SNPP").await.unwrap();
        assert_eq!(
            paths,
            vec!["AERDB_L2_VIIRS_SNPP/a.nc", "AERDB_L2_VIIRS_SNPP/b.nc"]
        );
    }
}
