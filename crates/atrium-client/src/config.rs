//! Portal configuration loaded from environment variables.
//!
//! All settings have defaults so the portal runs with zero configuration
//! for local development.

use std::path::PathBuf;

use atrium_media::UploadOptions;
use atrium_shared::constants::{DEFAULT_UPLOAD_FOLDER, MAX_UPLOAD_SIZE};

/// Portal configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Filesystem path where the local object store keeps blobs.
    /// Env: `ATRIUM_BLOB_PATH`
    /// Default: `./blobs`
    pub blob_storage_path: PathBuf,

    /// Maximum upload size in bytes.
    /// Env: `ATRIUM_MAX_UPLOAD_SIZE`
    /// Default: 25 MiB
    pub max_upload_size: u64,

    /// Folder uploads land in when no folder is given.
    /// Env: `ATRIUM_UPLOAD_FOLDER`
    /// Default: `uploads`
    pub upload_folder: String,

    /// Human-readable name for this portal instance.
    /// Env: `ATRIUM_INSTANCE_NAME`
    /// Default: `"Atrium Portal"`
    pub instance_name: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            blob_storage_path: PathBuf::from("./blobs"),
            max_upload_size: MAX_UPLOAD_SIZE,
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            instance_name: "Atrium Portal".to_string(),
        }
    }
}

impl PortalConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("ATRIUM_BLOB_PATH") {
            config.blob_storage_path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var("ATRIUM_MAX_UPLOAD_SIZE") {
            if let Ok(size) = size.parse() {
                config.max_upload_size = size;
            }
        }
        if let Ok(folder) = std::env::var("ATRIUM_UPLOAD_FOLDER") {
            config.upload_folder = folder;
        }
        if let Ok(name) = std::env::var("ATRIUM_INSTANCE_NAME") {
            config.instance_name = name;
        }

        config
    }

    /// Upload constraints derived from this configuration.
    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions::default()
            .folder(&self.upload_folder)
            .max_size(self.max_upload_size)
    }
}
