//! Project-scoped chat between the agency and its clients.

use serde_json::json;
use tracing::debug;

use atrium_shared::document::to_json_map;
use atrium_shared::{Direction, Document, PortalError, QueryOptions, Result, WhereOp};
use atrium_store::{DatabaseService, QueryEvent, Subscription};

use crate::models::{ChatMessage, Conversation};
use crate::state::LiveList;

const CONVERSATIONS: &str = "conversations";
const MESSAGES: &str = "messages";

/// Chat operations composed from [`DatabaseService`] primitives.
#[derive(Clone)]
pub struct ChatService {
    db: DatabaseService,
}

impl ChatService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Return the project's conversation, creating it on first contact.
    ///
    /// Check-then-act, not transactional: two concurrent first messages can
    /// both observe "no conversation" and create one each. The backend
    /// seam offers no compare-and-set, so the window is part of the
    /// contract; see the regression test pinning it.
    pub async fn get_or_create_conversation(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Document<Conversation>> {
        let options = QueryOptions::new()
            .filter("projectId", WhereOp::Eq, project_id)
            .limit(1);
        let existing: Vec<Document<Conversation>> =
            self.db.query(CONVERSATIONS, &options).await?;
        if let Some(found) = existing.into_iter().next() {
            return Ok(found);
        }

        debug!(project_id, user_id, "creating conversation");
        self.db
            .create(
                CONVERSATIONS,
                &Conversation {
                    project_id: project_id.to_string(),
                    participants: vec![user_id.to_string()],
                    last_message: None,
                    last_message_at: None,
                },
            )
            .await
    }

    /// Append a message, then refresh the conversation preview.
    ///
    /// The preview update is a second, independent write: if it fails the
    /// message still exists and the conversation list shows a stale
    /// preview.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<Document<ChatMessage>> {
        let message = self
            .db
            .create(
                MESSAGES,
                &ChatMessage {
                    conversation_id: conversation_id.to_string(),
                    sender_id: sender_id.to_string(),
                    body: body.to_string(),
                    read_by: vec![sender_id.to_string()],
                },
            )
            .await?;

        let patch = to_json_map(&json!({
            "lastMessage": body,
            "lastMessageAt": message.created_at,
        }))?;
        let _: Document<Conversation> =
            self.db.update(CONVERSATIONS, conversation_id, patch).await?;

        debug!(conversation_id, message_id = %message.id, "message sent");
        Ok(message)
    }

    /// Record that a user has read a message. The `read_by` set only ever
    /// grows; marking twice is a no-op.
    pub async fn mark_read(
        &self,
        message_id: &str,
        user_id: &str,
    ) -> Result<Document<ChatMessage>> {
        let message: Option<Document<ChatMessage>> = self.db.read(MESSAGES, message_id).await?;
        let Some(message) = message else {
            return Err(PortalError::NotFound {
                collection: MESSAGES.to_string(),
                id: message_id.to_string(),
            });
        };

        if message.data.read_by.iter().any(|u| u == user_id) {
            return Ok(message);
        }

        let mut read_by = message.data.read_by;
        read_by.push(user_id.to_string());
        self.db
            .update(MESSAGES, message_id, to_json_map(&json!({ "readBy": read_by }))?)
            .await
    }

    /// Messages of a conversation, oldest first.
    pub async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Document<ChatMessage>>> {
        self.db
            .query(MESSAGES, &Self::message_query(conversation_id))
            .await
    }

    /// Live ordered view of a conversation's messages.
    pub fn subscribe_to_messages(
        &self,
        conversation_id: &str,
        callback: impl Fn(QueryEvent) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.db
            .subscribe_query(MESSAGES, Self::message_query(conversation_id), callback)
    }

    /// Live conversation list for a participant, most recently active
    /// first.
    pub fn subscribe_to_conversations(
        &self,
        user_id: &str,
        callback: impl Fn(QueryEvent) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.db
            .subscribe_query(CONVERSATIONS, Self::conversation_query(user_id), callback)
    }

    /// Self-updating conversation list for a participant.
    pub fn conversation_list(&self, user_id: &str) -> Result<LiveList<Conversation>> {
        LiveList::from_query(&self.db, CONVERSATIONS, Self::conversation_query(user_id))
    }

    fn message_query(conversation_id: &str) -> QueryOptions {
        QueryOptions::new()
            .filter("conversationId", WhereOp::Eq, conversation_id)
            .order_by("createdAt", Direction::Ascending)
    }

    fn conversation_query(user_id: &str) -> QueryOptions {
        QueryOptions::new()
            .filter("participants", WhereOp::Contains, user_id)
            .order_by("updatedAt", Direction::Descending)
    }
}
