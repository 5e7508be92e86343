//! Subscription events and the cancellation handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use atrium_shared::RawDocument;

/// Event delivered to a single-document subscriber.
///
/// Errors share the data callback path, so subscribers discriminate on the
/// variant instead of wiring a second channel.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    /// Current state of the document (`None` if it does not exist).
    Snapshot(Option<RawDocument>),
    /// The channel failed; no further snapshots will arrive.
    Error(String),
}

/// Event delivered to a multi-document (query) subscriber.
#[derive(Debug, Clone)]
pub enum QueryEvent {
    /// Fresh ordered snapshot of the matching documents.
    Snapshot(Vec<RawDocument>),
    /// The channel failed; no further snapshots will arrive.
    Error(String),
}

/// Callback invoked with [`DocumentEvent`]s.
pub type DocumentCallback = Arc<dyn Fn(DocumentEvent) + Send + Sync>;

/// Callback invoked with [`QueryEvent`]s.
pub type QueryCallback = Arc<dyn Fn(QueryEvent) + Send + Sync>;

/// Handle to a live subscription.
///
/// `cancel` is idempotent and safe to call after the backend has already
/// torn the channel down. Dropping the handle cancels it, so holding a
/// `Subscription` is the only way to keep a listener alive — a forgotten
/// unsubscribe becomes a dropped value, not a leaked listener.
pub struct Subscription {
    cancelled: AtomicBool,
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    pub fn new(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            cancel: Box::new(cancel),
        }
    }

    /// Tear the channel down. Calling this more than once is a no-op.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            (self.cancel)();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
