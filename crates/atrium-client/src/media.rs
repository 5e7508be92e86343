//! The media vault: blobs in object storage, references in the document
//! store.
//!
//! Upload is a two-step sequence with no compensating transaction. If the
//! record step fails after the blob is stored, the blob is orphaned; the
//! reverse window exists on delete. Both are properties of the layer, not
//! accidents — see the tests pinning them.

use tracing::{debug, info};

use atrium_media::{StorageService, UploadOptions, UploadSource};
use atrium_shared::{Direction, Document, QueryOptions, Result, WhereOp};
use atrium_store::DatabaseService;

use crate::models::MediaItem;

const MEDIA_ITEMS: &str = "media_items";

/// Vault operations composed from both service primitives.
#[derive(Clone)]
pub struct MediaService {
    db: DatabaseService,
    storage: StorageService,
}

impl MediaService {
    pub fn new(db: DatabaseService, storage: StorageService) -> Self {
        Self { db, storage }
    }

    /// Store a blob, then record it in the vault.
    ///
    /// The blob exists as soon as the first step succeeds; a failure in
    /// the record step leaves it behind with nothing pointing at it.
    pub async fn upload_media(
        &self,
        project_id: &str,
        uploaded_by: &str,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<Document<MediaItem>> {
        let file = self.storage.upload(source, options).await?;

        let item = MediaItem {
            project_id: project_id.to_string(),
            file_name: file.name,
            url: file.url,
            size: file.size,
            content_type: file.content_type,
            storage_path: file.id,
            uploaded_by: uploaded_by.to_string(),
        };
        let recorded = self.db.create(MEDIA_ITEMS, &item).await?;

        info!(project_id, item_id = %recorded.id, "media recorded");
        Ok(recorded)
    }

    /// A project's vault entries, newest first.
    pub async fn list_media(&self, project_id: &str) -> Result<Vec<Document<MediaItem>>> {
        let options = QueryOptions::new()
            .filter("projectId", WhereOp::Eq, project_id)
            .order_by("createdAt", Direction::Descending);
        self.db.query(MEDIA_ITEMS, &options).await
    }

    /// Remove a vault entry: document first, then blob.
    ///
    /// Ordered so a partial failure never leaves a document referencing a
    /// missing blob; it can leave an unreferenced blob.
    pub async fn delete_media(&self, item: &Document<MediaItem>) -> Result<()> {
        self.db.delete(MEDIA_ITEMS, &item.id).await?;
        self.storage.delete(&item.data.storage_path).await?;
        debug!(item_id = %item.id, "media deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_media::FsObjectStore;
    use atrium_shared::PortalError;
    use atrium_store::MemoryStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn vault() -> (MediaService, StorageService, Arc<MemoryStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let db = DatabaseService::new(store.clone());
        let storage = StorageService::new(Arc::new(
            FsObjectStore::new(dir.path().to_path_buf()).await.unwrap(),
        ));
        (
            MediaService::new(db, storage.clone()),
            storage,
            store,
            dir,
        )
    }

    fn logo() -> UploadSource {
        UploadSource::new("logo.png", "image/png", b"png-bytes".to_vec())
    }

    #[tokio::test]
    async fn upload_records_the_blob() {
        let (media, _storage, _store, _dir) = vault().await;

        let item = media
            .upload_media("p1", "u1", logo(), &UploadOptions::default())
            .await
            .unwrap();
        assert_eq!(item.data.file_name, "logo.png");
        assert!(item.data.storage_path.starts_with("uploads/"));

        let listed = media.list_media("p1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, item.id);
    }

    // Pins the dual-write gap: when the record step fails, the blob stays
    // behind with no document referencing it.
    #[tokio::test]
    async fn failed_record_step_orphans_the_blob() {
        let (media, storage, store, _dir) = vault().await;
        store.set_offline(true);

        let result = media
            .upload_media("p1", "u1", logo(), &UploadOptions::default())
            .await;
        assert!(matches!(result, Err(PortalError::Backend(_))));

        let orphans = storage.list("uploads").await.unwrap();
        assert_eq!(orphans.len(), 1);

        store.set_offline(false);
        assert!(media.list_media("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_document_then_blob() {
        let (media, storage, _store, _dir) = vault().await;
        let item = media
            .upload_media("p1", "u1", logo(), &UploadOptions::default())
            .await
            .unwrap();

        media.delete_media(&item).await.unwrap();
        assert!(media.list_media("p1").await.unwrap().is_empty());
        assert!(storage.list("uploads").await.unwrap().is_empty());
    }
}
