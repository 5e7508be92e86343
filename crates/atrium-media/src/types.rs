//! Upload inputs and the stored-file descriptor handed back to callers.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored blob as seen by callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageFile {
    /// Opaque storage path. The only stable handle for delete / URL /
    /// metadata lookups; do not reconstruct it from `name`.
    pub id: String,
    /// Original file name as supplied at upload time.
    pub name: String,
    /// Resolved download URL.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type supplied at upload time.
    pub content_type: String,
    /// When the blob was uploaded.
    pub uploaded_at: DateTime<Utc>,
}

/// Payload handed to [`StorageService::upload`](crate::StorageService::upload).
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadSource {
    pub fn new(name: &str, content_type: &str, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            data: data.into(),
        }
    }
}

/// Per-upload constraints, all checked before any backend call.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Folder the blob lands under. Defaults to `uploads`.
    pub folder: Option<String>,
    /// Maximum accepted size in bytes. Defaults to
    /// [`MAX_UPLOAD_SIZE`](atrium_shared::constants::MAX_UPLOAD_SIZE).
    pub max_size: Option<u64>,
    /// Accepted MIME types. `None` accepts everything.
    pub allowed_types: Option<Vec<String>>,
}

impl UploadOptions {
    pub fn folder(mut self, folder: &str) -> Self {
        self.folder = Some(folder.to_string());
        self
    }

    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn allowed_types(mut self, types: &[&str]) -> Self {
        self.allowed_types = Some(types.iter().map(|t| t.to_string()).collect());
        self
    }
}
