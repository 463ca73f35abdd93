// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },
}

/// Location of an uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        object: &ObjectRef,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Empty key".to_string()));
    }
    if key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Key cannot start with /".to_string(),
        ));
    }
    if key.contains("../") {
        return Err(StorageError::InvalidKey(
            "Path traversal not allowed".to_string(),
        ));
    }
    Ok(())
}

/// Object store reached over plain HTTP `PUT <endpoint>/<bucket>/<key>`
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put_object(
        &self,
        object: &ObjectRef,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        validate_key(&object.key)?;
        debug!("PUT {} ({} bytes, {})", object, data.len(), content_type);

        let response = self
            .client
            .put(format!("{}/{}/{}", self.endpoint, object.bucket, object.key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-amz-server-side-encryption", "AES256")
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::ServerError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-process object store for tests and local runs
#[derive(Debug, Default)]
pub struct MockObjectStore {
    objects: Arc<Mutex<HashMap<ObjectRef, StoredObject>>>,
    injected_error: Arc<Mutex<Option<StorageError>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `put_object` call with `error`
    pub async fn inject_error(&self, error: StorageError) {
        *self.injected_error.lock().await = Some(error);
    }

    pub async fn get(&self, object: &ObjectRef) -> Option<StoredObject> {
        self.objects.lock().await.get(object).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn keys(&self) -> Vec<ObjectRef> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_object(
        &self,
        object: &ObjectRef,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if let Some(error) = self.injected_error.lock().await.take() {
            return Err(error);
        }
        validate_key(&object.key)?;

        self.objects.lock().await.insert(
            object.clone(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
