//! Domain model structs stored as document payloads.
//!
//! Field names serialize in camelCase because that is how the documents
//! are filtered and ordered (`projectId`, `readBy`, ...); the envelope
//! (`id` / `createdAt` / `updatedAt`) is carried by
//! [`Document`](atrium_shared::Document), not repeated here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A conversation between the agency and a client, scoped to one project.
///
/// `last_message` / `last_message_at` are denormalized previews refreshed
/// by a second write after every message; they can lag the message list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub project_id: String,
    pub participants: Vec<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// A single chat message. Append-only; after creation only `read_by` may
/// change, and only by growing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub read_by: Vec<String>,
}

// ---------------------------------------------------------------------------
// Support
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    AwaitingInfo,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketKind {
    Bug,
    Question,
    Task,
    Billing,
}

/// A support ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    #[serde(rename = "type")]
    pub kind: TicketKind,
    pub status: TicketStatus,
}

/// Caller-supplied fields of a new ticket; status is always forced to
/// `Open` on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    #[serde(rename = "type")]
    pub kind: TicketKind,
}

/// A ticket comment. Append-only. `from_staff` drives the ticket status
/// transition when the comment is added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub ticket_id: String,
    pub author_id: String,
    pub body: String,
    pub from_staff: bool,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A per-user notification. `read` only ever flips from false to true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub read: bool,
}

// ---------------------------------------------------------------------------
// Media vault
// ---------------------------------------------------------------------------

/// Document recording an uploaded blob in the media vault.
///
/// Written as the second step of the upload-then-record sequence; the blob
/// at `storage_path` exists before this record does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub project_id: String,
    pub file_name: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
    pub storage_path: String,
    pub uploaded_by: String,
}
