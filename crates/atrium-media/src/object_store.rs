//! The blob backend seam.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atrium_shared::Result;

/// Metadata of a stored blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub size: u64,
    pub content_type: String,
    pub created: DateTime<Utc>,
}

/// An opaque blob store keyed by hierarchical path strings.
///
/// `delete`, `url` and `metadata` fail with `ObjectNotFound` when no blob
/// exists at the path; the backend makes no idempotence guarantee for
/// `delete`, and neither does the layer above.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a blob at a path, overwriting any existing one.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Remove the blob at a path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// List blob paths under a folder prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Resolve a download URL for a path.
    async fn url(&self, path: &str) -> Result<String>;

    /// Read blob metadata.
    async fn metadata(&self, path: &str) -> Result<ObjectMetadata>;
}
