//! # atrium-media
//!
//! Object storage for the portal's media vault: a backend-agnostic
//! [`ObjectStore`] trait, a filesystem backend ([`FsObjectStore`]), and the
//! [`StorageService`] that validates uploads client-side before anything
//! touches the backend.
//!
//! Blobs are keyed by hierarchical path strings. The path returned from an
//! upload is the only stable handle; original file names are not unique.

pub mod fs_store;
pub mod object_store;
pub mod service;
pub mod types;

pub use fs_store::FsObjectStore;
pub use object_store::{ObjectMetadata, ObjectStore};
pub use service::StorageService;
pub use types::{StorageFile, UploadOptions, UploadSource};
