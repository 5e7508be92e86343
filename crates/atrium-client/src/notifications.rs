//! Per-user notifications.

use serde_json::json;

use atrium_shared::document::to_json_map;
use atrium_shared::{Direction, Document, QueryOptions, Result, WhereOp};
use atrium_store::{DatabaseService, QueryEvent, Subscription};

use crate::models::Notification;

const NOTIFICATIONS: &str = "notifications";

#[derive(Clone)]
pub struct NotificationService {
    db: DatabaseService,
}

impl NotificationService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Deliver a notification to a user.
    pub async fn notify(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Document<Notification>> {
        self.db
            .create(
                NOTIFICATIONS,
                &Notification {
                    user_id: user_id.to_string(),
                    title: title.to_string(),
                    body: body.to_string(),
                    read: false,
                },
            )
            .await
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Document<Notification>>> {
        self.db
            .query(NOTIFICATIONS, &Self::user_query(user_id))
            .await
    }

    /// Flip a notification to read. The flag never flips back.
    pub async fn mark_read(&self, notification_id: &str) -> Result<Document<Notification>> {
        self.db
            .update(
                NOTIFICATIONS,
                notification_id,
                to_json_map(&json!({ "read": true }))?,
            )
            .await
    }

    /// Live notification feed for a user.
    pub fn subscribe_for_user(
        &self,
        user_id: &str,
        callback: impl Fn(QueryEvent) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.db
            .subscribe_query(NOTIFICATIONS, Self::user_query(user_id), callback)
    }

    fn user_query(user_id: &str) -> QueryOptions {
        QueryOptions::new()
            .filter("userId", WhereOp::Eq, user_id)
            .order_by("createdAt", Direction::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_store::MemoryStore;
    use std::sync::Arc;

    fn notifications() -> NotificationService {
        NotificationService::new(DatabaseService::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn unread_then_read() {
        let service = notifications();
        let n = service.notify("u1", "Invoice", "Invoice #42 is due").await.unwrap();
        assert!(!n.data.read);

        let read = service.mark_read(&n.id).await.unwrap();
        assert!(read.data.read);

        // Marking again stays read.
        let again = service.mark_read(&n.id).await.unwrap();
        assert!(again.data.read);
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_user() {
        let service = notifications();
        service.notify("u1", "A", "a").await.unwrap();
        service.notify("u2", "B", "b").await.unwrap();

        let list = service.list_for_user("u1").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].data.title, "A");
    }
}
