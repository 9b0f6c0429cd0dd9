use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::config::ModelConfig;
use crate::error::{Result, VinexError};

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}

fn verify(bytes: &[u8], expected: Option<&str>, source: &str) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(VinexError::ModelLoad(format!(
            "checksum mismatch for {source}: expected {expected}, got {actual}"
        )));
    }
    Ok(())
}

/// Where a remote artifact is cached. Keyed by URL so changing the location
/// never reuses a stale file.
pub fn cache_path(cache_dir: &Path, url: &str) -> PathBuf {
    let url_hash = sha256_hex(url.as_bytes());
    let file_name = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("weights.onnx");
    cache_dir.join(format!("{}-{file_name}", &url_hash[..16]))
}

/// Read the configured weights artifact, downloading it into the cache once
/// when it is a URL.
pub async fn fetch(config: &ModelConfig) -> Result<Vec<u8>> {
    let location = config.weights.trim();
    let expected = config.sha256.as_deref();

    if !is_remote(location) {
        let bytes = tokio::fs::read(location).await.map_err(|e| {
            VinexError::ModelLoad(format!("cannot read weights at {location}: {e}"))
        })?;
        verify(&bytes, expected, location)?;
        return Ok(bytes);
    }

    let cached = cache_path(Path::new(&config.cache_dir), location);
    if let Ok(bytes) = tokio::fs::read(&cached).await {
        match verify(&bytes, expected, location) {
            Ok(()) => {
                tracing::debug!(path = %cached.display(), "Using cached weights");
                return Ok(bytes);
            }
            Err(e) => {
                tracing::warn!(path = %cached.display(), error = %e, "Discarding cached weights");
            }
        }
    }

    tracing::info!(url = %location, "Downloading denoise weights");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()
        .map_err(|e| VinexError::ModelLoad(format!("failed to build HTTP client: {e}")))?;
    let response = client
        .get(location)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| VinexError::ModelLoad(format!("failed to download {location}: {e}")))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| VinexError::ModelLoad(format!("failed to download {location}: {e}")))?
        .to_vec();
    verify(&bytes, expected, location)?;

    tokio::fs::create_dir_all(&config.cache_dir).await?;
    let partial = cached.with_extension("part");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, &cached).await?;
    tracing::info!(path = %cached.display(), size = bytes.len(), "Cached denoise weights");

    Ok(bytes)
}
