use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Bucket settings applied when the bucket is first created.
#[derive(Debug, Clone, Serialize)]
pub struct BucketSpec {
    pub id: String,
    pub name: String,
    pub public: bool,
    pub allowed_mime_types: Vec<String>,
    pub file_size_limit: u64,
}

impl BucketSpec {
    /// Public bucket holding PDF invoices, 10 MB per object.
    pub fn invoices() -> Self {
        BucketSpec {
            id: "invoices".to_string(),
            name: "invoices".to_string(),
            public: true,
            allowed_mime_types: vec!["application/pdf".to_string()],
            file_size_limit: 10 * 1024 * 1024,
        }
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Creates the bucket unless it already exists.
    async fn ensure_bucket(&self, spec: &BucketSpec) -> AppResult<()>;

    /// Stores `bytes` under `object_name`, overwriting any previous object of
    /// that name, and returns its public URL.
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct BucketListing {
    name: String,
}

/// Client for the hosted backend's storage REST API.
#[derive(Clone)]
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpObjectStorage {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> AppResult<Self> {
        HeaderValue::from_str(api_key).map_err(|_| {
            AppError::Configuration("STORAGE_API_KEY is not a valid header value".into())
        })?;
        Ok(HttpObjectStorage {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    pub fn public_url(&self, bucket: &str, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, object_name
        )
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn ensure_bucket(&self, spec: &BucketSpec) -> AppResult<()> {
        let existing: Vec<BucketListing> = self
            .authorized(self.client.get(format!("{}/storage/v1/bucket", self.base_url)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if existing.iter().any(|bucket| bucket.name == spec.name) {
            debug!(bucket = %spec.name, "Bucket already exists");
            return Ok(());
        }

        let response = self
            .authorized(self.client.post(format!("{}/storage/v1/bucket", self.base_url)))
            .json(spec)
            .send()
            .await?;

        if response.status().is_success() {
            info!(bucket = %spec.name, "Bucket created");
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        // A concurrent creator got there first
        if body.contains("already exists") {
            return Ok(());
        }
        Err(AppError::ExternalService(format!(
            "creating bucket {} failed with {}: {}",
            spec.name, status, body
        )))
    }

    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, object_name);
        let response = self
            .authorized(self.client.post(url))
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "uploading {} failed with {}: {}",
                object_name, status, body
            )));
        }

        debug!(bucket, object_name, status = status.as_u16(), "Object stored");
        Ok(self.public_url(bucket, object_name))
    }
}
