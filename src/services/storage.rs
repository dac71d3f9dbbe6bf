use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{MediaBackend, StorageConfig};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    InvalidFile(String),

    #[error("missing storage setting: {0}")]
    NotConfigured(&'static str),

    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("storage responded {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("not a stored object url: {0}")]
    InvalidUrl(String),
}

/// File part taken from a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Lowercased extension including the dot, or empty
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default()
    }
}

/// What an upload slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => &[".jpg", ".jpeg", ".png", ".gif", ".webp"],
            MediaKind::Video => &[".mp4", ".webm", ".mov"],
        }
    }

    pub fn check(&self, file: &UploadedFile) -> Result<(), StorageError> {
        let ext = file.extension();
        if self.extensions().contains(&ext.as_str()) {
            return Ok(());
        }
        let expected = match self {
            MediaKind::Image => "an image",
            MediaKind::Video => "a video",
        };
        Err(StorageError::InvalidFile(format!(
            "{} must be {} file ({})",
            file.file_name,
            expected,
            self.extensions().join(", ")
        )))
    }
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".mp4" => "video/mp4",
        ".webm" => "video/webm",
        ".mov" => "video/quicktime",
        ".mp3" => "audio/mpeg",
        ".pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// `<uuid><ext>`, so two uploads of the same file never collide
pub fn object_name(file: &UploadedFile) -> String {
    format!("{}{}", Uuid::new_v4(), file.extension())
}

/// Media store holding uploaded images and videos
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores the bytes and returns the public URL
    async fn upload(&self, bucket: &str, name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, StorageError>;

    /// Removes an object previously returned by `upload`
    async fn remove(&self, url: &str) -> Result<(), StorageError>;
}

/// Check the file against `kind`, give it a fresh name and upload it
pub async fn store_upload(
    storage: &dyn ObjectStorage,
    bucket: &str,
    file: UploadedFile,
    kind: MediaKind,
) -> Result<String, StorageError> {
    kind.check(&file)?;
    let name = object_name(&file);
    let content_type = content_type_for(&file.extension());
    debug!("Uploading {} ({} bytes) to {}/{}", file.file_name, file.bytes.len(), bucket, name);
    storage.upload(bucket, &name, content_type, file.bytes).await
}

/// Best-effort removal; failures are only logged
pub async fn discard(storage: &dyn ObjectStorage, url: &str) {
    if let Err(e) = storage.remove(url).await {
        warn!("Failed to remove stored object {}: {}", url, e);
    }
}

/// Supabase Storage over its REST API
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let url = config
            .supabase_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(StorageError::NotConfigured("SUPABASE_URL"))?;
        let key = config
            .supabase_service_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(StorageError::NotConfigured("SUPABASE_SERVICE_KEY"))?;
        Ok(Self::new(url, key))
    }

    fn public_prefix(&self) -> String {
        format!("{}/storage/v1/object/public/", self.base_url)
    }

    /// Split a public URL back into bucket and object name
    fn locate<'a>(&self, url: &'a str) -> Result<(&'a str, &'a str), StorageError> {
        let prefix = self.public_prefix();
        url.strip_prefix(prefix.as_str())
            .and_then(|rest| rest.split_once('/'))
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))
    }
}

async fn upstream_error(response: reqwest::Response) -> StorageError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StorageError::Upstream { status, body }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, bucket: &str, name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let response = self
            .client
            .post(format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, name))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        Ok(format!("{}{}/{}", self.public_prefix(), bucket, name))
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        let (bucket, name) = self.locate(url)?;
        let response = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, bucket))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&serde_json::json!({ "prefixes": [name] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        Ok(())
    }
}

/// Keeps objects in process memory; URLs use the `memory://` scheme
#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, (String, usize)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.objects.read().await.contains_key(url)
    }

    /// Content type of a stored object
    pub async fn content_type(&self, url: &str) -> Option<String> {
        self.objects.read().await.get(url).map(|(ct, _)| ct.clone())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, bucket: &str, name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let url = format!("memory://{}/{}", bucket, name);
        self.objects
            .write()
            .await
            .insert(url.clone(), (content_type.to_string(), bytes.len()));
        Ok(url)
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        match self.objects.write().await.remove(url) {
            Some(_) => Ok(()),
            None => Err(StorageError::InvalidUrl(url.to_string())),
        }
    }
}

/// Build the configured media backend
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    let storage: Arc<dyn ObjectStorage> = match config.backend {
        MediaBackend::Supabase => Arc::new(SupabaseStorage::from_config(config)?),
        MediaBackend::Memory => Arc::new(MemoryStorage::new()),
    };
    Ok(storage)
}
