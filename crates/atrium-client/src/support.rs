//! Support tickets and their comment threads.
//!
//! Status handling is deliberately asymmetric, matching the dashboard it
//! serves: adding a comment drives the only enforced transitions (staff
//! comment -> `AwaitingInfo`, client comment -> `Open`), while
//! `InProgress` and `Completed` are reachable only through the direct
//! [`set_status`](SupportService::set_status) update path.

use serde_json::json;
use tracing::debug;

use atrium_shared::document::to_json_map;
use atrium_shared::{Direction, Document, QueryOptions, Result, WhereOp};
use atrium_store::{DatabaseService, QueryEvent, Subscription};

use crate::models::{Comment, NewTicket, Ticket, TicketStatus};
use crate::state::LiveList;

const TICKETS: &str = "tickets";
const COMMENTS: &str = "ticket_comments";

/// Ticket operations composed from [`DatabaseService`] primitives.
#[derive(Clone)]
pub struct SupportService {
    db: DatabaseService,
}

impl SupportService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Open a new ticket. The status of a fresh ticket is always `Open`,
    /// whatever the caller intended.
    pub async fn create_ticket(&self, user_id: &str, new: NewTicket) -> Result<Document<Ticket>> {
        let ticket = Ticket {
            user_id: user_id.to_string(),
            title: new.title,
            description: new.description,
            priority: new.priority,
            kind: new.kind,
            status: TicketStatus::Open,
        };
        let created = self.db.create(TICKETS, &ticket).await?;
        debug!(ticket_id = %created.id, user_id, "ticket created");
        Ok(created)
    }

    /// A user's tickets, newest first.
    pub async fn fetch_tickets(&self, user_id: &str) -> Result<Vec<Document<Ticket>>> {
        self.db.query(TICKETS, &Self::ticket_query(user_id)).await
    }

    /// A ticket's comment thread, oldest first.
    pub async fn fetch_comments(&self, ticket_id: &str) -> Result<Vec<Document<Comment>>> {
        self.db.query(COMMENTS, &Self::comment_query(ticket_id)).await
    }

    /// Append a comment, then apply the authorship-driven status
    /// transition to the parent ticket as a second write.
    pub async fn add_comment(
        &self,
        ticket_id: &str,
        author_id: &str,
        body: &str,
        from_staff: bool,
    ) -> Result<Document<Comment>> {
        let comment = self
            .db
            .create(
                COMMENTS,
                &Comment {
                    ticket_id: ticket_id.to_string(),
                    author_id: author_id.to_string(),
                    body: body.to_string(),
                    from_staff,
                },
            )
            .await?;

        let status = if from_staff {
            TicketStatus::AwaitingInfo
        } else {
            TicketStatus::Open
        };
        let _: Document<Ticket> = self
            .db
            .update(TICKETS, ticket_id, to_json_map(&json!({ "status": status }))?)
            .await?;

        debug!(ticket_id, from_staff, "comment added");
        Ok(comment)
    }

    /// Direct status update, used by the dashboard for `InProgress` and
    /// `Completed`. No transition rule is enforced here.
    pub async fn set_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
    ) -> Result<Document<Ticket>> {
        self.db
            .update(TICKETS, ticket_id, to_json_map(&json!({ "status": status }))?)
            .await
    }

    /// Live ticket list for a user, newest first.
    pub fn subscribe_to_tickets(
        &self,
        user_id: &str,
        callback: impl Fn(QueryEvent) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.db
            .subscribe_query(TICKETS, Self::ticket_query(user_id), callback)
    }

    /// Live comment thread for a ticket, oldest first.
    pub fn subscribe_to_comments(
        &self,
        ticket_id: &str,
        callback: impl Fn(QueryEvent) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.db
            .subscribe_query(COMMENTS, Self::comment_query(ticket_id), callback)
    }

    /// Self-updating ticket list for a user.
    pub fn ticket_list(&self, user_id: &str) -> Result<LiveList<Ticket>> {
        LiveList::from_query(&self.db, TICKETS, Self::ticket_query(user_id))
    }

    fn ticket_query(user_id: &str) -> QueryOptions {
        QueryOptions::new()
            .filter("userId", WhereOp::Eq, user_id)
            .order_by("createdAt", Direction::Descending)
    }

    fn comment_query(ticket_id: &str) -> QueryOptions {
        QueryOptions::new()
            .filter("ticketId", WhereOp::Eq, ticket_id)
            .order_by("createdAt", Direction::Ascending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TicketKind, TicketPriority};
    use atrium_store::MemoryStore;
    use std::sync::Arc;

    fn support() -> SupportService {
        SupportService::new(DatabaseService::new(Arc::new(MemoryStore::new())))
    }

    fn bug_report() -> NewTicket {
        NewTicket {
            title: "Bug".to_string(),
            description: "X broken".to_string(),
            priority: TicketPriority::High,
            kind: TicketKind::Bug,
        }
    }

    #[tokio::test]
    async fn new_tickets_are_open() {
        let support = support();
        let ticket = support.create_ticket("u1", bug_report()).await.unwrap();
        assert_eq!(ticket.data.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn comment_authorship_drives_status() {
        let support = support();
        let ticket = support.create_ticket("u1", bug_report()).await.unwrap();

        support
            .add_comment(&ticket.id, "staff-1", "Looking into it", true)
            .await
            .unwrap();
        let after_staff: Vec<_> = support.fetch_tickets("u1").await.unwrap();
        assert_eq!(after_staff[0].data.status, TicketStatus::AwaitingInfo);

        support
            .add_comment(&ticket.id, "u1", "Here are the details", false)
            .await
            .unwrap();
        let after_client: Vec<_> = support.fetch_tickets("u1").await.unwrap();
        assert_eq!(after_client[0].data.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn set_status_bypasses_the_transition_rule() {
        let support = support();
        let ticket = support.create_ticket("u1", bug_report()).await.unwrap();

        let updated = support
            .set_status(&ticket.id, TicketStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.data.status, TicketStatus::Completed);
    }

    #[tokio::test]
    async fn end_to_end_ticket_flow() {
        let support = support();

        let ticket = support.create_ticket("u1", bug_report()).await.unwrap();

        let tickets = support.fetch_tickets("u1").await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].data.status, TicketStatus::Open);
        assert_eq!(tickets[0].data.title, "Bug");

        support
            .add_comment(&ticket.id, "staff-1", "Looking into it", true)
            .await
            .unwrap();

        let tickets = support.fetch_tickets("u1").await.unwrap();
        assert_eq!(tickets[0].data.status, TicketStatus::AwaitingInfo);

        let comments = support.fetch_comments(&ticket.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].data.body, "Looking into it");
        assert!(comments[0].data.from_staff);
    }

    #[tokio::test]
    async fn live_ticket_list_follows_creates() {
        let support = support();
        let list = support.ticket_list("u1").unwrap();
        assert!(list.current().is_empty());

        support.create_ticket("u1", bug_report()).await.unwrap();
        support.create_ticket("someone-else", bug_report()).await.unwrap();

        let current = list.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].data.user_id, "u1");
    }
}
