//! In-memory [`DocumentStore`] backend.
//!
//! Collections live in a `HashMap` of `BTreeMap`s guarded by an `RwLock`;
//! watchers are token-keyed callbacks in a shared registry. Every committed
//! write notifies matching document watchers with the new state and re-runs
//! each collection watcher's query against the fresh data. Callbacks are
//! invoked after the data lock has been released.
//!
//! The [`set_offline`](MemoryStore::set_offline) toggle makes every
//! subsequent operation fail with a backend error, which is how tests
//! exercise the propagation contract of the layer above.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use atrium_shared::{JsonMap, PortalError, QueryOptions, RawDocument, Result};

use crate::backend::DocumentStore;
use crate::subscription::{
    DocumentCallback, DocumentEvent, QueryCallback, QueryEvent, Subscription,
};

type Collections = HashMap<String, BTreeMap<String, RawDocument>>;
type DocKey = (String, String);

struct DocWatcher {
    token: u64,
    callback: DocumentCallback,
}

struct QueryWatcher {
    token: u64,
    options: QueryOptions,
    callback: QueryCallback,
}

#[derive(Default)]
struct WatcherRegistry {
    next_token: u64,
    documents: HashMap<DocKey, Vec<DocWatcher>>,
    queries: HashMap<String, Vec<QueryWatcher>>,
}

impl WatcherRegistry {
    fn next_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }
}

/// In-memory document database with live change notification.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    watchers: Arc<Mutex<WatcherRegistry>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend becoming unreachable (or reachable again).
    ///
    /// Going offline signals every live watcher through its callback; the
    /// channel is considered dead from the watcher's point of view.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        if !offline {
            return;
        }

        let (doc_cbs, query_cbs) = {
            let Ok(reg) = self.watchers.lock() else {
                return;
            };
            let doc_cbs: Vec<DocumentCallback> = reg
                .documents
                .values()
                .flatten()
                .map(|w| w.callback.clone())
                .collect();
            let query_cbs: Vec<QueryCallback> = reg
                .queries
                .values()
                .flatten()
                .map(|w| w.callback.clone())
                .collect();
            (doc_cbs, query_cbs)
        };

        for cb in doc_cbs {
            cb(DocumentEvent::Error("backend went offline".to_string()));
        }
        for cb in query_cbs {
            cb(QueryEvent::Error("backend went offline".to_string()));
        }
    }

    fn guard(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PortalError::Backend("store is offline".to_string()));
        }
        Ok(())
    }

    fn doc_snapshot(&self, collection: &str, id: &str) -> Option<RawDocument> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    fn query_snapshot(&self, collection: &str, options: &QueryOptions) -> Vec<RawDocument> {
        let docs: Vec<RawDocument> = self
            .collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).map(|docs| docs.values().cloned().collect()))
            .unwrap_or_default();
        options.apply(docs)
    }

    /// Fan a change at `collection/id` out to matching watchers.
    fn notify(&self, collection: &str, id: &str) {
        if self.offline.load(Ordering::SeqCst) {
            return;
        }

        let current = self.doc_snapshot(collection, id);
        let key = (collection.to_string(), id.to_string());

        let (doc_cbs, query_watchers) = {
            let Ok(reg) = self.watchers.lock() else {
                return;
            };
            let doc_cbs: Vec<DocumentCallback> = reg
                .documents
                .get(&key)
                .map(|ws| ws.iter().map(|w| w.callback.clone()).collect())
                .unwrap_or_default();
            let query_watchers: Vec<(QueryOptions, QueryCallback)> = reg
                .queries
                .get(collection)
                .map(|ws| {
                    ws.iter()
                        .map(|w| (w.options.clone(), w.callback.clone()))
                        .collect()
                })
                .unwrap_or_default();
            (doc_cbs, query_watchers)
        };

        for cb in doc_cbs {
            cb(DocumentEvent::Snapshot(current.clone()));
        }
        for (options, cb) in query_watchers {
            let snapshot = self.query_snapshot(collection, &options);
            cb(QueryEvent::Snapshot(snapshot));
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<RawDocument>> {
        self.guard()?;
        Ok(self.doc_snapshot(collection, id))
    }

    async fn put(&self, collection: &str, document: RawDocument) -> Result<()> {
        self.guard()?;
        let id = document.id.clone();
        {
            let mut collections = self
                .collections
                .write()
                .map_err(|_| PortalError::Backend("lock poisoned".to_string()))?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), document);
        }
        debug!(collection, id = %id, "stored document");
        self.notify(collection, &id);
        Ok(())
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: JsonMap,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<RawDocument>> {
        self.guard()?;
        let merged = {
            let mut collections = self
                .collections
                .write()
                .map_err(|_| PortalError::Backend("lock poisoned".to_string()))?;
            let Some(doc) = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
            else {
                return Ok(None);
            };
            for (field, value) in patch {
                doc.data.insert(field, value);
            }
            doc.updated_at = updated_at;
            doc.clone()
        };
        debug!(collection, id, "merged document");
        self.notify(collection, id);
        Ok(Some(merged))
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool> {
        self.guard()?;
        let existed = {
            let mut collections = self
                .collections
                .write()
                .map_err(|_| PortalError::Backend("lock poisoned".to_string()))?;
            collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .is_some()
        };
        if existed {
            debug!(collection, id, "removed document");
            self.notify(collection, id);
        }
        Ok(existed)
    }

    async fn find(&self, collection: &str, options: &QueryOptions) -> Result<Vec<RawDocument>> {
        self.guard()?;
        Ok(self.query_snapshot(collection, options))
    }

    fn watch_document(
        &self,
        collection: &str,
        id: &str,
        callback: DocumentCallback,
    ) -> Result<Subscription> {
        self.guard()?;
        let key = (collection.to_string(), id.to_string());
        let token = {
            let mut reg = self
                .watchers
                .lock()
                .map_err(|_| PortalError::Backend("lock poisoned".to_string()))?;
            let token = reg.next_token();
            reg.documents.entry(key.clone()).or_default().push(DocWatcher {
                token,
                callback: callback.clone(),
            });
            token
        };

        // Replay the current state before any change event.
        callback(DocumentEvent::Snapshot(self.doc_snapshot(collection, id)));

        let watchers = self.watchers.clone();
        Ok(Subscription::new(move || {
            if let Ok(mut reg) = watchers.lock() {
                if let Some(list) = reg.documents.get_mut(&key) {
                    list.retain(|w| w.token != token);
                }
            }
        }))
    }

    fn watch_query(
        &self,
        collection: &str,
        options: QueryOptions,
        callback: QueryCallback,
    ) -> Result<Subscription> {
        self.guard()?;
        let token = {
            let mut reg = self
                .watchers
                .lock()
                .map_err(|_| PortalError::Backend("lock poisoned".to_string()))?;
            let token = reg.next_token();
            reg.queries
                .entry(collection.to_string())
                .or_default()
                .push(QueryWatcher {
                    token,
                    options: options.clone(),
                    callback: callback.clone(),
                });
            token
        };

        callback(QueryEvent::Snapshot(self.query_snapshot(collection, &options)));

        let watchers = self.watchers.clone();
        let collection = collection.to_string();
        Ok(Subscription::new(move || {
            if let Ok(mut reg) = watchers.lock() {
                if let Some(list) = reg.queries.get_mut(&collection) {
                    list.retain(|w| w.token != token);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_shared::{Direction, WhereOp};
    use serde_json::json;

    fn raw(id: &str, fields: serde_json::Value) -> RawDocument {
        let serde_json::Value::Object(data) = fields else {
            panic!("payload must be an object")
        };
        let now = Utc::now();
        RawDocument {
            id: id.to_string(),
            created_at: now,
            updated_at: now,
            data,
        }
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = MemoryStore::new();
        store.put("things", raw("t1", json!({"a": 1}))).await.unwrap();

        let doc = store.get("things", "t1").await.unwrap().unwrap();
        assert_eq!(doc.data["a"], json!(1));
        assert!(store.get("things", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn merge_missing_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .merge("things", "nope", JsonMap::new(), Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn remove_reports_existence() {
        let store = MemoryStore::new();
        store.put("things", raw("t1", json!({}))).await.unwrap();

        assert!(store.remove("things", "t1").await.unwrap());
        assert!(!store.remove("things", "t1").await.unwrap());
    }

    #[tokio::test]
    async fn find_applies_query_options() {
        let store = MemoryStore::new();
        for (id, a) in [("1", 1), ("2", 2), ("3", 3)] {
            store.put("things", raw(id, json!({ "a": a }))).await.unwrap();
        }

        let options = QueryOptions::new()
            .filter("a", WhereOp::Gt, 1)
            .order_by("a", Direction::Descending)
            .limit(1);
        let result = store.find("things", &options).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].data["a"], json!(3));
    }

    #[tokio::test]
    async fn query_watcher_sees_new_snapshot_per_write() {
        let store = MemoryStore::new();
        let snapshots: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();

        let sub = store
            .watch_query(
                "things",
                QueryOptions::new(),
                Arc::new(move |event| {
                    if let QueryEvent::Snapshot(docs) = event {
                        sink.lock().unwrap().push(docs.len());
                    }
                }),
            )
            .unwrap();

        store.put("things", raw("t1", json!({}))).await.unwrap();
        store.put("things", raw("t2", json!({}))).await.unwrap();

        // Initial replay of the empty collection, then one snapshot per put.
        assert_eq!(*snapshots.lock().unwrap(), vec![0, 1, 2]);

        sub.cancel();
        store.put("things", raw("t3", json!({}))).await.unwrap();
        assert_eq!(*snapshots.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn offline_store_rejects_and_signals_watchers() {
        let store = MemoryStore::new();
        let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();

        let _sub = store
            .watch_document(
                "things",
                "t1",
                Arc::new(move |event| {
                    if let DocumentEvent::Error(message) = event {
                        sink.lock().unwrap().push(message);
                    }
                }),
            )
            .unwrap();

        store.set_offline(true);
        assert!(matches!(
            store.get("things", "t1").await,
            Err(PortalError::Backend(_))
        ));
        assert_eq!(errors.lock().unwrap().len(), 1);
    }
}
