//! Filesystem-backed [`ObjectStore`].
//!
//! Blobs live under a base directory; each blob has a sidecar `.meta` file
//! carrying its JSON [`ObjectMetadata`] so size and content type survive a
//! restart. URLs resolve to `file://` paths, which is what the portal's
//! local/dev deployments serve from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::fs;
use tracing::{debug, info};

use atrium_shared::{PortalError, Result};

use crate::object_store::{ObjectMetadata, ObjectStore};

const META_SUFFIX: &str = ".meta";

/// Reject object paths that could escape the base directory.
fn validate_object_path(path: &str) -> Result<()> {
    let suspicious = path.starts_with('/')
        || path.contains('\\')
        || Path::new(path)
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)));
    if suspicious || path.is_empty() {
        return Err(PortalError::Backend(format!(
            "invalid object path: {path:?}"
        )));
    }
    Ok(())
}

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    base_path: PathBuf,
}

impl FsObjectStore {
    /// Create the store, making sure the base directory exists.
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;
        info!(path = %base_path.display(), "object store initialized");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn blob_path(&self, path: &str) -> Result<PathBuf> {
        validate_object_path(path)?;
        Ok(self.base_path.join(path))
    }

    fn meta_path(&self, path: &str) -> Result<PathBuf> {
        Ok(self.base_path.join(format!("{path}{META_SUFFIX}")))
    }

    async fn require_exists(&self, path: &str) -> Result<PathBuf> {
        let full = self.blob_path(path)?;
        if !full.exists() {
            return Err(PortalError::ObjectNotFound(path.to_string()));
        }
        Ok(full)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<()> {
        let full = self.blob_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }

        let meta = ObjectMetadata {
            size: data.len() as u64,
            content_type: content_type.to_string(),
            created: Utc::now(),
        };
        fs::write(&full, &data).await?;
        fs::write(self.meta_path(path)?, serde_json::to_vec(&meta)?).await?;

        debug!(path, size = data.len(), "stored object");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.require_exists(path).await?;
        fs::remove_file(&full).await?;
        // The sidecar may already be gone; that is not an error.
        let _ = fs::remove_file(self.meta_path(path)?).await;
        debug!(path, "deleted object");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        validate_object_path(prefix)?;
        let dir = self.base_path.join(prefix);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(META_SUFFIX) {
                    continue;
                }
                paths.push(format!("{prefix}/{name}"));
            }
        }
        paths.sort();
        Ok(paths)
    }

    async fn url(&self, path: &str) -> Result<String> {
        let full = self.require_exists(path).await?;
        let absolute = full.canonicalize()?;
        Ok(format!("file://{}", absolute.display()))
    }

    async fn metadata(&self, path: &str) -> Result<ObjectMetadata> {
        let full = self.require_exists(path).await?;
        match fs::read(self.meta_path(path)?).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            // Blob without a sidecar: fall back to filesystem metadata.
            Err(_) => {
                let fs_meta = fs::metadata(&full).await?;
                let created = fs_meta
                    .modified()
                    .map(chrono::DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                Ok(ObjectMetadata {
                    size: fs_meta.len(),
                    content_type: "application/octet-stream".to_string(),
                    created,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (FsObjectStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path().to_path_buf()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn put_then_metadata_and_url() {
        let (store, _dir) = test_store().await;
        store
            .put("uploads/a.png", Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .unwrap();

        let meta = store.metadata("uploads/a.png").await.unwrap();
        assert_eq!(meta.size, 9);
        assert_eq!(meta.content_type, "image/png");

        let url = store.url("uploads/a.png").await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("a.png"));
    }

    #[tokio::test]
    async fn delete_missing_is_an_error() {
        let (store, _dir) = test_store().await;
        store
            .put("uploads/gone.txt", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();

        store.delete("uploads/gone.txt").await.unwrap();
        let second = store.delete("uploads/gone.txt").await;
        assert!(matches!(second, Err(PortalError::ObjectNotFound(_))));
    }

    #[tokio::test]
    async fn list_skips_sidecars() {
        let (store, _dir) = test_store().await;
        store
            .put("docs/one.txt", Bytes::from_static(b"1"), "text/plain")
            .await
            .unwrap();
        store
            .put("docs/two.txt", Bytes::from_static(b"2"), "text/plain")
            .await
            .unwrap();

        let paths = store.list("docs").await.unwrap();
        assert_eq!(paths, vec!["docs/one.txt", "docs/two.txt"]);
    }

    #[tokio::test]
    async fn list_missing_folder_is_empty() {
        let (store, _dir) = test_store().await;
        assert!(store.list("nothing-here").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn traversal_paths_rejected() {
        let (store, _dir) = test_store().await;
        let result = store
            .put("../escape.txt", Bytes::from_static(b"x"), "text/plain")
            .await;
        assert!(result.is_err());
        assert!(store.url("/etc/passwd").await.is_err());
    }
}
