//! # atrium-store
//!
//! The document-database layer of the portal: a backend-agnostic
//! [`DocumentStore`] trait, an in-memory backend ([`MemoryStore`]), and the
//! [`DatabaseService`] that stamps the envelope invariants onto every write.
//!
//! The service performs no retries, no caching and no optimistic
//! concurrency; whatever consistency the backend provides is what callers
//! get. Live subscriptions replay the current state on registration and
//! deliver one event per subsequent change until the returned
//! [`Subscription`] handle is cancelled or dropped.

pub mod backend;
pub mod memory;
pub mod service;
pub mod subscription;

pub use backend::DocumentStore;
pub use memory::MemoryStore;
pub use service::DatabaseService;
pub use subscription::{DocumentEvent, QueryEvent, Subscription};
