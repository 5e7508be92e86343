//! Shared limits and defaults.

/// Maximum upload size accepted by default: 25 MiB.
pub const MAX_UPLOAD_SIZE: u64 = 25 * 1024 * 1024;

/// Folder uploads land in when the caller does not specify one.
pub const DEFAULT_UPLOAD_FOLDER: &str = "uploads";
