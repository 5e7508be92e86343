//! Typed CRUD + query + subscription service over a [`DocumentStore`].
//!
//! [`DatabaseService`] owns the envelope invariants: `createdAt` is stamped
//! exactly once per document, `updatedAt` on every write, and ids are
//! either assigned here (`create`) or by the caller (`set`) and never
//! change. The backend is injected through the constructor; there are no
//! global instances.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use atrium_shared::document::{new_document_id, to_json_map};
use atrium_shared::{Document, JsonMap, PortalError, QueryOptions, RawDocument, Result};

use crate::backend::DocumentStore;
use crate::subscription::{DocumentEvent, QueryEvent, Subscription};

/// Generic document service over named collections.
///
/// One-shot operations reject on backend failure; this layer performs no
/// retry, backoff or caching. Cheap to clone.
#[derive(Clone)]
pub struct DatabaseService {
    store: Arc<dyn DocumentStore>,
}

impl DatabaseService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Insert a new document with a service-assigned id.
    ///
    /// `createdAt` and `updatedAt` are both stamped to now; the full
    /// document, id included, is returned.
    pub async fn create<T>(&self, collection: &str, data: &T) -> Result<Document<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.write_at(collection, new_document_id(), data).await
    }

    /// Insert or overwrite a document at a caller-chosen id.
    ///
    /// An overwrite is a re-initialization: both timestamps are restamped,
    /// exactly as `create` would. Useful for idempotent first-write-wins
    /// initializers.
    pub async fn set<T>(&self, collection: &str, id: &str, data: &T) -> Result<Document<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.write_at(collection, id.to_string(), data).await
    }

    /// Point read. Absence is `Ok(None)`, not an error.
    pub async fn read<T>(&self, collection: &str, id: &str) -> Result<Option<Document<T>>>
    where
        T: DeserializeOwned,
    {
        match self.store.get(collection, id).await? {
            Some(raw) => Ok(Some(raw.into_typed()?)),
            None => Ok(None),
        }
    }

    /// Merge fields into an existing document and refresh `updatedAt`.
    ///
    /// Last write wins; there is no version check. Fails with `NotFound`
    /// when the id does not exist.
    pub async fn update<T>(&self, collection: &str, id: &str, patch: JsonMap) -> Result<Document<T>>
    where
        T: DeserializeOwned,
    {
        match self.store.merge(collection, id, patch, Utc::now()).await? {
            Some(raw) => {
                debug!(collection, id, "updated document");
                raw.into_typed()
            }
            None => Err(PortalError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    /// Remove a document. Deleting an already-absent id is a no-op.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let existed = self.store.remove(collection, id).await?;
        debug!(collection, id, existed, "deleted document");
        Ok(())
    }

    /// Snapshot read: filter, then sort, then cap, per `options`.
    pub async fn query<T>(&self, collection: &str, options: &QueryOptions) -> Result<Vec<Document<T>>>
    where
        T: DeserializeOwned,
    {
        self.store
            .find(collection, options)
            .await?
            .into_iter()
            .map(RawDocument::into_typed)
            .collect()
    }

    /// Watch one document: current state immediately, then one event per
    /// change, until the returned handle is cancelled or dropped.
    pub fn subscribe(
        &self,
        collection: &str,
        id: &str,
        callback: impl Fn(DocumentEvent) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.store.watch_document(collection, id, Arc::new(callback))
    }

    /// Watch a query: current snapshot immediately, then a fresh snapshot
    /// after every change to the collection.
    pub fn subscribe_query(
        &self,
        collection: &str,
        options: QueryOptions,
        callback: impl Fn(QueryEvent) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.store.watch_query(collection, options, Arc::new(callback))
    }

    async fn write_at<T>(&self, collection: &str, id: String, data: &T) -> Result<Document<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let now = Utc::now();
        let raw = RawDocument {
            id: id.clone(),
            created_at: now,
            updated_at: now,
            data: to_json_map(data)?,
        };
        self.store.put(collection, raw.clone()).await?;
        debug!(collection, id = %id, "wrote document");
        raw.into_typed()
    }
}
