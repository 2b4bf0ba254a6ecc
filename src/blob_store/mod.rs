//! Blob store: the external media host that keeps uploaded images.

mod cloudinary;
mod memory;

pub use cloudinary::CloudinaryClient;
pub use memory::InMemoryBlobStore;

use async_trait::async_trait;
use std::path::Path;

use crate::error::UploadError;

/// Where an uploaded file can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBlob {
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload the file at `local_path`; the caller owns (and removes) the file
    async fn upload(&self, local_path: &Path) -> Result<UploadedBlob, UploadError>;
}
