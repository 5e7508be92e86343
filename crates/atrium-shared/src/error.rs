use thiserror::Error;

/// Errors produced by the Atrium data layer.
///
/// The same taxonomy is used by the document store and the object storage
/// services so callers discriminate on one enum regardless of which backend
/// a call went through.
#[derive(Error, Debug)]
pub enum PortalError {
    /// A document operation that requires an existing id found none.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// An object-storage operation referenced a path with no blob behind it.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Client-side validation rejected the input before any backend call.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The backend is unreachable or reported a failure. No retry is
    /// performed at this layer.
    #[error("Backend unavailable: {0}")]
    Backend(String),

    /// A live subscription channel failed. Delivered to subscribers through
    /// the same callback that carries data events.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Payload (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error (e.g. filesystem-backed object store).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload validation failures, checked before any network call.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Content type not allowed: {content_type}")]
    TypeNotAllowed { content_type: String },

    #[error("Empty file")]
    EmptyFile,
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PortalError>;
