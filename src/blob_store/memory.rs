use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{BlobStore, UploadedBlob};
use crate::error::UploadError;

/// Blob store that keeps nothing and hands out deterministic URLs
///
/// Checks that the file exists so callers are exercised the same way as with
/// a real media host; `fail_uploads` simulates an outage.
#[derive(Default)]
pub struct InMemoryBlobStore {
    failing: AtomicBool,
    uploads: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful uploads so far
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, local_path: &Path) -> Result<UploadedBlob, UploadError> {
        if local_path.as_os_str().is_empty() {
            return Err(UploadError::EmptyPath);
        }
        if !local_path.is_file() {
            return Err(UploadError::ReadFailed(format!(
                "{} does not exist",
                local_path.display()
            )));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(UploadError::RequestFailed("media host unavailable".to_string()));
        }

        let index = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UploadedBlob {
            url: format!("https://media.local/uploads/{}", index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_existing_file() {
        let store = InMemoryBlobStore::new();
        let file = tempfile::NamedTempFile::new().unwrap();

        let blob = store.upload(file.path()).await.unwrap();
        assert_eq!(blob.url, "https://media.local/uploads/1");
        assert_eq!(store.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = InMemoryBlobStore::new();
        store.fail_uploads(true);
        let file = tempfile::NamedTempFile::new().unwrap();

        assert!(store.upload(file.path()).await.is_err());
        assert_eq!(store.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = InMemoryBlobStore::new();
        assert!(matches!(
            store.upload(Path::new("/no/such/file")).await,
            Err(UploadError::ReadFailed(_))
        ));
    }
}
