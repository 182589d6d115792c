use async_trait::async_trait;
use aws_sdk_s3 as s3;
use chrono::Utc;
use s3::presigning::PresigningConfig;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::models::DownloadUrl;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid presigning config: {0}")]
    Config(String),
    #[error("could not presign {path}: {reason}")]
    Presign { path: String, reason: String },
}

// 1. StorageService Contract
/// StorageService
///
/// Abstract contract for the photo store. Handlers only ever see this trait, so the
/// real S3 client and the in-memory mock are interchangeable.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if missing. Only called in `Env::Local`.
    async fn ensure_bucket_exists(&self);

    /// Resolves a stored photo path to a time-limited download URL.
    async fn get_download_url(&self, path: &str) -> Result<DownloadUrl, StorageError>;
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// AWS SDK client. `force_path_style(true)` keeps it compatible with MinIO and
/// other S3-compatible gateways.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    url_ttl: Duration,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        url_ttl: Duration,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            url_ttl,
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket fails harmlessly when the bucket is already there.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    /// get_download_url
    ///
    /// Presigns a GetObject request. Presigning is local; no network round trip.
    async fn get_download_url(&self, path: &str) -> Result<DownloadUrl, StorageError> {
        let key = sanitize_key(path);
        let presigning = PresigningConfig::expires_in(self.url_ttl)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let presigned_req = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        Ok(DownloadUrl {
            url: presigned_req.uri().to_string(),
            expires_at: expiry_after(self.url_ttl),
        })
    }
}

fn expiry_after(ttl: Duration) -> chrono::DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or_else(Utc::now)
}

/// sanitize_key
///
/// Strips leading slashes and directory navigation segments (`..`, `.`) from a
/// stored path so it maps to exactly one object key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation
/// MockStorageService
///
/// Deterministic in-memory store used by tests and by local runs without MinIO.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, every call fails.
    pub should_fail: bool,
    /// Paths that fail even when `should_fail` is false.
    pub failing_paths: HashSet<String>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn failing_on(paths: &[&str]) -> Self {
        Self {
            should_fail: false,
            failing_paths: paths.iter().map(|path| path.to_string()).collect(),
        }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_download_url(&self, path: &str) -> Result<DownloadUrl, StorageError> {
        if self.should_fail || self.failing_paths.contains(path) {
            return Err(StorageError::Presign {
                path: path.to_string(),
                reason: "Mock Storage Error: Simulation requested".to_string(),
            });
        }

        Ok(DownloadUrl {
            url: format!(
                "http://localhost:9000/mock-bucket/{}?signature=fake",
                sanitize_key(path)
            ),
            expires_at: expiry_after(Duration::from_secs(900)),
        })
    }
}

/// StorageState
///
/// Shared handle to the storage service inside `AppState`.
pub type StorageState = Arc<dyn StorageService>;
