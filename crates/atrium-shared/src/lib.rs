//! # atrium-shared
//!
//! Types shared by every Atrium crate: the generic document envelope, the
//! declarative query description, the error taxonomy, and a handful of
//! constants.
//!
//! The portal's backend stores schemaless documents; this crate pins down
//! the one shape every document has in common (`id` / `createdAt` /
//! `updatedAt`) and leaves the rest as a generic payload.

pub mod constants;
pub mod document;

mod error;

pub use document::{
    Direction, Document, JsonMap, OrderBy, QueryOptions, RawDocument, WhereFilter, WhereOp,
};
pub use error::{PortalError, Result, ValidationError};
