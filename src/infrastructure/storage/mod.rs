pub mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;

/// Capability over the audio file store: bytes in, retrievable URL out.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bytes: &[u8], key: &str) -> Result<String, String>;
}
