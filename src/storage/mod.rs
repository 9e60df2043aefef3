use async_trait::async_trait;

use crate::error::Result;

mod local;
pub use local::LocalDirStore;

/// Destination for rendered badges.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `name` and returns the public URL of the stored object.
    async fn put(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}
