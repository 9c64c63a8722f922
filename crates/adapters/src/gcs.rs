// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Google Cloud Storage backed [`ObjectStore`].

use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::copy::CopyObjectRequest;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use async_trait::async_trait;

use crate::error::ObjectStoreError;
use crate::object_store::ObjectStore;

#[derive(Clone)]
pub struct GcsObjectStore {
    client: Client,
    bucket: String,
}

impl GcsObjectStore {
    pub async fn connect(bucket: impl Into<String>) -> Result<Self, ObjectStoreError> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))?;
        Ok(Self { client: Client::new(config), bucket: bucket.into() })
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let request = ListObjectsRequest {
            bucket: self.bucket.clone(),
            prefix: Some(prefix.to_string()),
            ..Default::default()
        };
        let response = self
            .client
            .list_objects(&request)
            .await
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))?;
        Ok(response.items.unwrap_or_default().into_iter().map(|o| o.name).collect())
    }

    async fn exists(&self, path: &str) -> Result<bool, ObjectStoreError> {
        let request = GetObjectRequest { bucket: self.bucket.clone(), object: path.to_string(), ..Default::default() };
        match self.client.get_object(&request).await {
            Ok(_) => Ok(true),
            Err(google_cloud_storage::http::Error::Response(resp)) if resp.code == 404 => Ok(false),
            Err(e) => Err(ObjectStoreError::Unavailable(e.to_string())),
        }
    }

    async fn read_to_string(&self, path: &str) -> Result<Option<String>, ObjectStoreError> {
        let request = GetObjectRequest { bucket: self.bucket.clone(), object: path.to_string(), ..Default::default() };
        match self.client.download_object(&request, &Range::default()).await {
            Ok(bytes) => Ok(Some(
                String::from_utf8(bytes).map_err(|e| ObjectStoreError::Unavailable(e.to_string()))?,
            )),
            Err(google_cloud_storage::http::Error::Response(resp)) if resp.code == 404 => Ok(None),
            Err(e) => Err(ObjectStoreError::Unavailable(e.to_string())),
        }
    }

    async fn copy_if_absent(&self, src: &str, dst: &str) -> Result<bool, ObjectStoreError> {
        if self.exists(dst).await? {
            return Ok(false);
        }
        let request = CopyObjectRequest {
            source_bucket: self.bucket.clone(),
            source_object: src.to_string(),
            destination_bucket: self.bucket.clone(),
            destination_object: dst.to_string(),
            ..Default::default()
        };
        self.client
            .copy_object(&request)
            .await
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))?;
        Ok(true)
    }
}
