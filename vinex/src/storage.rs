//! Where enhanced images are published for the generator to fetch.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use base64::Engine;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{Result, VinexError};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Storage key for an upload named `filename`.
    fn key(&self, filename: &str) -> String;

    /// Store `bytes` under `key` and return a URL the generator can read.
    async fn put(&self, bytes: Vec<u8>, key: &str, content_type: &str) -> Result<String>;

    fn backend(&self) -> &'static str;
}

/// `<stem>_enhanced.<ext>`, or `<name>_enhanced` when there is no extension.
pub fn enhanced_name(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_enhanced.{ext}"),
        _ => format!("{filename}_enhanced"),
    }
}

fn object_key(folder: &str, filename: &str) -> String {
    let id = uuid::Uuid::new_v4();
    let folder = folder.trim_matches('/');
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{folder}/{id}.{}", ext.to_lowercase()),
        _ => format!("{folder}/{id}"),
    }
}

/// Hands the image to the generator inline as a `data:` URL.
#[derive(Debug, Clone)]
pub struct InlineObjectStore {
    folder: String,
}

impl InlineObjectStore {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for InlineObjectStore {
    fn key(&self, filename: &str) -> String {
        object_key(&self.folder, filename)
    }

    async fn put(&self, bytes: Vec<u8>, _key: &str, content_type: &str) -> Result<String> {
        Ok(format!(
            "data:{content_type};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }

    fn backend(&self) -> &'static str {
        "inline"
    }
}

/// Writes objects under a directory served at `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
    folder: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str, folder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            folder: folder.into(),
        }
    }

    /// Delete stored objects whose modification time is older than `max_age`.
    /// Returns how many files were removed.
    pub async fn sweep(&self, max_age: Duration) -> Result<usize> {
        let dir = self.root.join(self.folder.trim_matches('/'));
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(VinexError::Storage(format!(
                    "cannot list {}: {e}",
                    dir.display()
                )))
            }
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        let removed = expire_all(&paths, max_age).await;

        if removed > 0 {
            tracing::debug!(removed, dir = %dir.display(), "Swept expired objects");
        }
        Ok(removed)
    }
}

/// Remove the expired files among `paths`. An entry that cannot be inspected
/// or removed is logged and skipped.
async fn expire_all(paths: &[PathBuf], max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;
    for path in paths {
        match expire(path, now, max_age).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to sweep object")
            }
        }
    }
    removed
}

async fn expire(path: &Path, now: SystemTime, max_age: Duration) -> std::io::Result<bool> {
    let metadata = tokio::fs::symlink_metadata(path).await?;
    if !metadata.is_file() {
        return Ok(false);
    }
    let age = metadata
        .modified()
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .unwrap_or_default();
    if age < max_age {
        return Ok(false);
    }
    tokio::fs::remove_file(path).await?;
    Ok(true)
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn key(&self, filename: &str) -> String {
        object_key(&self.folder, filename)
    }

    async fn put(&self, bytes: Vec<u8>, key: &str, _content_type: &str) -> Result<String> {
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(VinexError::Storage(format!("invalid object key '{key}'")));
        }
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VinexError::Storage(format!("cannot create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| VinexError::Storage(format!("cannot write {}: {e}", path.display())))?;

        tracing::debug!(key, size = bytes.len(), "Stored object");
        Ok(format!("{}/{key}", self.public_base_url))
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

pub fn from_config(config: &StorageConfig) -> Box<dyn ObjectStore> {
    match config.backend {
        StorageBackend::Inline => Box::new(InlineObjectStore::new(config.folder.clone())),
        StorageBackend::Local => Box::new(LocalObjectStore::new(
            &config.local_dir,
            &config.public_base_url,
            config.folder.clone(),
        )),
    }
}
