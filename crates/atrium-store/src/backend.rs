//! The backend client seam.
//!
//! [`DocumentStore`] is what the portal expects from a remote
//! document-oriented database: point reads and writes, a declarative query,
//! and live change notification for a single document or a query. The
//! service layer depends on this trait and never on a concrete backend, so
//! test doubles slot in by constructor injection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use atrium_shared::{JsonMap, QueryOptions, RawDocument, Result};

use crate::subscription::{DocumentCallback, QueryCallback, Subscription};

/// An opaque remote collection/document database.
///
/// Collection names are plain strings; no schema is enforced by the store.
/// Implementations must deliver the current state to a freshly registered
/// watcher before any change event, and must signal channel failure through
/// the watcher's callback rather than going silent.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup. Absence is not an error.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<RawDocument>>;

    /// Insert or overwrite a full document at its id.
    async fn put(&self, collection: &str, document: RawDocument) -> Result<()>;

    /// Merge fields into an existing document and restamp `updatedAt`.
    ///
    /// Returns the post-merge document, or `None` when the id does not
    /// exist (the caller decides whether that is an error).
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: JsonMap,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<RawDocument>>;

    /// Remove a document. Returns whether one existed.
    async fn remove(&self, collection: &str, id: &str) -> Result<bool>;

    /// Filtered / sorted / capped snapshot read.
    async fn find(&self, collection: &str, options: &QueryOptions) -> Result<Vec<RawDocument>>;

    /// Watch one document. Replays the current state immediately, then one
    /// event per change, until the handle is cancelled.
    fn watch_document(
        &self,
        collection: &str,
        id: &str,
        callback: DocumentCallback,
    ) -> Result<Subscription>;

    /// Watch a query. Replays the current snapshot immediately, then a
    /// fresh snapshot after every write to the collection.
    fn watch_query(
        &self,
        collection: &str,
        options: QueryOptions,
        callback: QueryCallback,
    ) -> Result<Subscription>;
}
