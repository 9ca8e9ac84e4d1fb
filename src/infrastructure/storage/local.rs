use super::BlobStore;
use async_trait::async_trait;
use std::path::PathBuf;

/// Local filesystem blob store for development and single-server
/// deployments. Files land under the configured base path and are
/// served back by the HTTP layer's `/storage` static route.
pub struct LocalBlobStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, bytes: &[u8], key: &str) -> Result<String, String> {
        let dest = self.base_path.join(key);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create storage directory: {e}"))?;
        }

        tokio::fs::write(&dest, bytes)
            .await
            .map_err(|e| format!("failed to write audio file: {e}"))?;

        let url = format!(
            "{}/storage/{}",
            self.public_base_url.trim_end_matches('/'),
            key
        );

        tracing::debug!(
            path = %dest.display(),
            size = bytes.len(),
            url = %url,
            "Audio blob stored"
        );

        Ok(url)
    }
}
