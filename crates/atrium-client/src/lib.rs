//! # atrium-client
//!
//! Domain services of the agency-client portal, composed from the generic
//! database and storage primitives: chat conversations, support tickets,
//! notifications and the media vault, plus the auth seam, configuration
//! and the live client-side state stores.
//!
//! Every service takes its dependencies through the constructor; nothing
//! in this crate is a global.

pub mod auth;
pub mod chat;
pub mod config;
pub mod media;
pub mod models;
pub mod notifications;
pub mod portal;
pub mod state;
pub mod support;

pub use auth::{CurrentUser, FixedUser};
pub use chat::ChatService;
pub use config::PortalConfig;
pub use media::MediaService;
pub use notifications::NotificationService;
pub use portal::Portal;
pub use state::LiveList;
pub use support::SupportService;
