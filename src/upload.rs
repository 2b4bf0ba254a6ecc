//! Multipart form extraction.
//!
//! File parts are spooled to temporary files that are deleted when the
//! form is dropped, i.e. once the request handler returns.

use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;
use std::collections::HashMap;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, ValidationError};

/// Upper bound on the total size of one multipart body, shared as app data
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

/// Text fields and spooled files of one multipart request
#[derive(Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, NamedTempFile>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Local path of the uploaded file; `None` when the part was absent or empty
    pub fn file_path(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(NamedTempFile::path)
    }

    /// Read the whole payload, keeping the first value of each part name
    ///
    /// # Errors
    /// - `TooLong` when the parts together exceed `max_bytes`
    /// - `InvalidFormat` for a broken body or non UTF-8 text
    pub async fn read(mut payload: Multipart, max_bytes: usize) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        let mut total = 0usize;

        while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
            let disposition = field.content_disposition();
            let name = match disposition.get_name() {
                Some(name) => name.to_string(),
                None => continue,
            };
            let is_file = disposition.get_filename().is_some();
            let duplicate = form.fields.contains_key(&name) || form.files.contains_key(&name);

            if is_file {
                let (file, written) = spool(&mut field, &mut total, max_bytes).await?;
                if written == 0 || duplicate {
                    continue;
                }
                form.files.insert(name, file);
            } else {
                let bytes = collect(&mut field, &mut total, max_bytes).await?;
                if duplicate {
                    continue;
                }
                let value = String::from_utf8(bytes)
                    .map_err(|_| ValidationError::InvalidFormat(name.clone()))?;
                form.fields.insert(name, value);
            }
        }

        tracing::debug!(
            fields = form.fields.len(),
            files = form.files.len(),
            bytes = total,
            "Multipart form read"
        );
        Ok(form)
    }
}

fn malformed(e: actix_multipart::MultipartError) -> AppError {
    tracing::warn!("Malformed multipart body: {}", e);
    ValidationError::InvalidFormat("multipart body".to_string()).into()
}

fn temp_file_error(e: std::io::Error) -> AppError {
    AppError::Internal(format!("Temporary upload file failed: {}", e))
}

fn account(total: &mut usize, chunk: usize, max_bytes: usize) -> Result<(), AppError> {
    *total += chunk;
    if *total > max_bytes {
        return Err(ValidationError::TooLong("upload".to_string(), max_bytes).into());
    }
    Ok(())
}

async fn collect(field: &mut Field, total: &mut usize, max_bytes: usize) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        account(total, chunk.len(), max_bytes)?;
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn spool(
    field: &mut Field,
    total: &mut usize,
    max_bytes: usize,
) -> Result<(NamedTempFile, usize), AppError> {
    let file = NamedTempFile::new().map_err(temp_file_error)?;
    // The NamedTempFile keeps ownership of the path; writes go through a
    // tokio handle so the worker thread never blocks on disk I/O.
    let mut writer = tokio::fs::File::from_std(file.as_file().try_clone().map_err(temp_file_error)?);
    let mut written = 0usize;

    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        account(total, chunk.len(), max_bytes)?;
        writer.write_all(&chunk).await.map_err(temp_file_error)?;
        written += chunk.len();
    }
    writer.flush().await.map_err(temp_file_error)?;

    Ok((file, written))
}
