use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{ AppError, Result };

use super::BlobStore;

/// Writes objects into a directory served at `public_url`.
pub struct LocalDirStore {
    root: PathBuf,
    public_url: String,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn check_name(name: &str) -> Result<()> {
        let bad =
            name.is_empty() ||
            name == "." ||
            name.contains("..") ||
            name.contains('/') ||
            name.contains('\\') ||
            name.contains('\0');

        if bad {
            return Err(AppError::InvalidInput(format!("Invalid object name: {:?}", name)));
        }

        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalDirStore {
    async fn put(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        Self::check_name(name)?;

        tokio::fs
            ::create_dir_all(&self.root).await
            .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", self.root.display(), e)))?;

        let path = self.root.join(name);
        let size = bytes.len();
        tokio::fs
            ::write(&path, bytes).await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::info!("Stored {} ({}, {} bytes)", path.display(), content_type, size);

        Ok(format!("{}/{}", self.public_url, urlencoding::encode(name)))
    }
}
