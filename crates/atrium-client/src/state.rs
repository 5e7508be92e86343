//! Client-side live state.
//!
//! A [`LiveList`] holds the latest denormalized snapshot of a query
//! subscription for UI consumption. The subscription lives exactly as long
//! as the list: dropping the list cancels the channel, so a screen that
//! goes away cannot leak a listener.

use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use tracing::{error, warn};

use atrium_shared::{Document, QueryOptions, Result};
use atrium_store::{DatabaseService, QueryEvent, Subscription};

/// Self-updating, typed snapshot of a live query.
pub struct LiveList<T> {
    items: Arc<RwLock<Vec<Document<T>>>>,
    subscription: Subscription,
}

impl<T> LiveList<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub(crate) fn from_query(
        db: &DatabaseService,
        collection: &str,
        options: QueryOptions,
    ) -> Result<Self> {
        let items: Arc<RwLock<Vec<Document<T>>>> = Arc::new(RwLock::new(Vec::new()));
        let sink = items.clone();
        let collection_name = collection.to_string();

        let subscription = db.subscribe_query(collection, options, move |event| match event {
            QueryEvent::Snapshot(raw) => {
                let mut typed = Vec::with_capacity(raw.len());
                for doc in raw {
                    match doc.into_typed() {
                        Ok(doc) => typed.push(doc),
                        Err(e) => {
                            warn!(collection = %collection_name, error = %e, "skipping undecodable document")
                        }
                    }
                }
                if let Ok(mut guard) = sink.write() {
                    *guard = typed;
                }
            }
            QueryEvent::Error(message) => {
                error!(collection = %collection_name, %message, "live list channel failed");
            }
        })?;

        Ok(Self {
            items,
            subscription,
        })
    }

    /// The most recent snapshot.
    pub fn current(&self) -> Vec<Document<T>> {
        self.items.read().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Stop following changes. The snapshot freezes at its last value.
    pub fn cancel(&self) {
        self.subscription.cancel();
    }

    pub fn is_live(&self) -> bool {
        !self.subscription.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_store::MemoryStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Item {
        label: String,
    }

    #[tokio::test]
    async fn tracks_writes_until_cancelled() {
        let db = DatabaseService::new(Arc::new(MemoryStore::new()));
        let list: LiveList<Item> =
            LiveList::from_query(&db, "items", QueryOptions::new()).unwrap();
        assert!(list.current().is_empty());

        db.create("items", &Item { label: "a".into() }).await.unwrap();
        assert_eq!(list.current().len(), 1);

        list.cancel();
        assert!(!list.is_live());
        db.create("items", &Item { label: "b".into() }).await.unwrap();
        assert_eq!(list.current().len(), 1);
    }

    #[tokio::test]
    async fn dropping_the_list_stops_updates() {
        let db = DatabaseService::new(Arc::new(MemoryStore::new()));
        let list: LiveList<Item> =
            LiveList::from_query(&db, "items", QueryOptions::new()).unwrap();
        drop(list);

        // No panic, no delivery; the watcher was removed on drop.
        db.create("items", &Item { label: "a".into() }).await.unwrap();
    }
}
