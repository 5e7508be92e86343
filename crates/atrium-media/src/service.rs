//! Upload / delete / list service over an [`ObjectStore`].

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use atrium_shared::constants::{DEFAULT_UPLOAD_FOLDER, MAX_UPLOAD_SIZE};
use atrium_shared::{Result, ValidationError};

use crate::object_store::{ObjectMetadata, ObjectStore};
use crate::types::{StorageFile, UploadOptions, UploadSource};

/// Blob service over named folders.
///
/// Size and MIME-type constraints are enforced here, client-side, before
/// any backend call. A successful upload has no compensating rollback: if
/// the caller fails to record the returned file afterwards, the blob is
/// orphaned.
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn ObjectStore>,
}

impl StorageService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Validate and store a blob.
    ///
    /// The blob lands at `{folder}/{millis}_{name}`; the timestamp prefix
    /// keeps same-named uploads from colliding. The returned
    /// [`StorageFile::id`] is the handle for every later operation.
    pub async fn upload(&self, source: UploadSource, options: &UploadOptions) -> Result<StorageFile> {
        let size = source.data.len() as u64;
        if size == 0 {
            return Err(ValidationError::EmptyFile.into());
        }
        let max = options.max_size.unwrap_or(MAX_UPLOAD_SIZE);
        if size > max {
            return Err(ValidationError::FileTooLarge { size, max }.into());
        }
        if let Some(allowed) = &options.allowed_types {
            if !allowed.iter().any(|t| t == &source.content_type) {
                return Err(ValidationError::TypeNotAllowed {
                    content_type: source.content_type.clone(),
                }
                .into());
            }
        }

        let folder = options
            .folder
            .clone()
            .unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string());
        let uploaded_at = Utc::now();
        let path = format!(
            "{folder}/{}_{}",
            uploaded_at.timestamp_millis(),
            sanitize_file_name(&source.name)
        );

        self.store
            .put(&path, source.data, &source.content_type)
            .await?;
        let url = self.store.url(&path).await?;

        info!(path = %path, size, "uploaded object");
        Ok(StorageFile {
            id: path,
            name: source.name,
            url,
            size,
            content_type: source.content_type,
            uploaded_at,
        })
    }

    /// Remove a blob. Not idempotent: deleting an absent id fails with
    /// `ObjectNotFound`, matching the backend contract.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        self.store.delete(file_id).await
    }

    /// Snapshot of all files under a folder.
    ///
    /// Each entry costs one metadata fetch plus one URL resolution against
    /// the backend.
    pub async fn list(&self, folder: &str) -> Result<Vec<StorageFile>> {
        let paths = self.store.list(folder).await?;
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let meta = self.store.metadata(&path).await?;
            let url = self.store.url(&path).await?;
            files.push(StorageFile {
                name: original_name(&path),
                id: path,
                url,
                size: meta.size,
                content_type: meta.content_type,
                uploaded_at: meta.created,
            });
        }
        Ok(files)
    }

    /// Resolve the download URL for a stored blob.
    pub async fn download_url(&self, file_id: &str) -> Result<String> {
        self.store.url(file_id).await
    }

    /// Read metadata for a stored blob.
    pub async fn metadata(&self, file_id: &str) -> Result<ObjectMetadata> {
        self.store.metadata(file_id).await
    }
}

/// Strip path separators and traversal sequences from an upload name.
fn sanitize_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "-").replace("..", "-")
}

/// Recover the original upload name from a `{folder}/{millis}_{name}` path.
fn original_name(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.split_once('_') {
        Some((_, rest)) => rest.to_string(),
        None => file.to_string(),
    }
}
