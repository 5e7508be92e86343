//! The assembled portal client.
//!
//! [`Portal`] wires one instance of each service to one backend pair and
//! one [`CurrentUser`] accessor. Construction is explicit; swapping in a
//! test double means passing a different store, not mocking a module.

use std::sync::Arc;

use atrium_media::{FsObjectStore, StorageService, UploadSource};
use atrium_shared::{Document, Result};
use atrium_store::{DatabaseService, MemoryStore};

use crate::auth::CurrentUser;
use crate::chat::ChatService;
use crate::config::PortalConfig;
use crate::media::MediaService;
use crate::models::{Conversation, MediaItem, NewTicket, Notification, Ticket};
use crate::notifications::NotificationService;
use crate::state::LiveList;
use crate::support::SupportService;

/// One portal session: services plus the signed-in user.
pub struct Portal {
    auth: Arc<dyn CurrentUser>,
    config: PortalConfig,
    pub chat: ChatService,
    pub support: SupportService,
    pub notifications: NotificationService,
    pub media: MediaService,
}

impl Portal {
    pub fn new(
        db: DatabaseService,
        storage: StorageService,
        auth: Arc<dyn CurrentUser>,
        config: PortalConfig,
    ) -> Self {
        Self {
            auth,
            config,
            chat: ChatService::new(db.clone()),
            support: SupportService::new(db.clone()),
            notifications: NotificationService::new(db.clone()),
            media: MediaService::new(db, storage),
        }
    }

    /// Assemble a portal over local backends (in-memory documents,
    /// filesystem blobs), suitable for development and tests.
    pub async fn local(config: PortalConfig, auth: Arc<dyn CurrentUser>) -> Result<Self> {
        let db = DatabaseService::new(Arc::new(MemoryStore::new()));
        let storage = StorageService::new(Arc::new(
            FsObjectStore::new(config.blob_storage_path.clone()).await?,
        ));
        Ok(Self::new(db, storage, auth, config))
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Open a ticket as the signed-in user.
    pub async fn open_ticket(&self, new: NewTicket) -> Result<Document<Ticket>> {
        let user = self.auth.current_user_id()?;
        self.support.create_ticket(&user, new).await
    }

    /// The signed-in user's tickets, newest first.
    pub async fn my_tickets(&self) -> Result<Vec<Document<Ticket>>> {
        let user = self.auth.current_user_id()?;
        self.support.fetch_tickets(&user).await
    }

    /// The signed-in user's notifications, newest first.
    pub async fn my_notifications(&self) -> Result<Vec<Document<Notification>>> {
        let user = self.auth.current_user_id()?;
        self.notifications.list_for_user(&user).await
    }

    /// Live conversation list for the signed-in user.
    pub fn my_conversations(&self) -> Result<LiveList<Conversation>> {
        let user = self.auth.current_user_id()?;
        self.chat.conversation_list(&user)
    }

    /// Upload into a project's vault as the signed-in user, under the
    /// configured size and folder constraints.
    pub async fn upload_to_vault(
        &self,
        project_id: &str,
        source: UploadSource,
    ) -> Result<Document<MediaItem>> {
        let user = self.auth.current_user_id()?;
        self.media
            .upload_media(project_id, &user, source, &self.config.upload_options())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FixedUser;
    use crate::models::{TicketKind, TicketPriority, TicketStatus};
    use tempfile::TempDir;

    async fn portal_for(user: &str) -> (Portal, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = PortalConfig {
            blob_storage_path: dir.path().to_path_buf(),
            ..PortalConfig::default()
        };
        let portal = Portal::local(config, Arc::new(FixedUser::new(user)))
            .await
            .unwrap();
        (portal, dir)
    }

    #[tokio::test]
    async fn tickets_are_scoped_to_the_signed_in_user() {
        let (portal, _dir) = portal_for("client-7").await;

        portal
            .open_ticket(NewTicket {
                title: "Slow dashboard".to_string(),
                description: "Loads take seconds".to_string(),
                priority: TicketPriority::Medium,
                kind: TicketKind::Bug,
            })
            .await
            .unwrap();

        let mine = portal.my_tickets().await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].data.user_id, "client-7");
        assert_eq!(mine[0].data.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn vault_uploads_respect_the_configured_limit() {
        let dir = TempDir::new().unwrap();
        let config = PortalConfig {
            blob_storage_path: dir.path().to_path_buf(),
            max_upload_size: 4,
            ..PortalConfig::default()
        };
        let portal = Portal::local(config, Arc::new(FixedUser::new("u1")))
            .await
            .unwrap();

        let too_big = UploadSource::new("big.bin", "application/octet-stream", vec![0u8; 5]);
        assert!(portal.upload_to_vault("p1", too_big).await.is_err());

        let small = UploadSource::new("ok.bin", "application/octet-stream", vec![0u8; 4]);
        let item = portal.upload_to_vault("p1", small).await.unwrap();
        assert_eq!(item.data.uploaded_by, "u1");
    }

    #[tokio::test]
    async fn conversation_list_follows_chat() {
        let (portal, _dir) = portal_for("client-7").await;

        let list = portal.my_conversations().unwrap();
        assert!(list.current().is_empty());

        let conv = portal
            .chat
            .get_or_create_conversation("p1", "client-7")
            .await
            .unwrap();
        portal
            .chat
            .send_message(&conv.id, "client-7", "hello there")
            .await
            .unwrap();

        let current = list.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].data.last_message.as_deref(), Some("hello there"));
    }
}
