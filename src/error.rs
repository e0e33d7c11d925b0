//! Error types for birdmon
//!
//! This module provides the error taxonomy of the acquisition pipeline:
//! - [`StorageError`] for failed backend operations (surfaced per file)
//! - [`TransferError`] for failed network transfers (surfaced per item)
//! - Configuration errors, checked before any network attempt
//! - Machine-readable error codes for mapping to user-visible notices
//!
//! Malformed telemetry lines are not errors at all: the log transform skips them.

use std::fmt;
use thiserror::Error;

/// Result type alias for birdmon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for birdmon
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting (download or upload URL) is not configured
    #[error("missing configuration: {key} is not set")]
    ConfigMissing {
        /// The configuration key that is absent (e.g., "download_url")
        key: &'static str,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "directory")
        key: Option<String>,
    },

    /// Storage backend operation failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Network transfer failed
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Serialization error (corrupt `events.json`, malformed manifest)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested artifact or series does not exist
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Transfer(TransferError::Request(error))
    }
}

impl Error {
    /// Machine-readable error code for presentation-layer mapping
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::ConfigMissing { .. } => "config_missing",
            Error::Config { .. } => "config_error",
            Error::Storage(_) => "storage_error",
            Error::Transfer(TransferError::Status { status, .. }) if *status == 404 => {
                "remote_not_found"
            }
            Error::Transfer(_) => "transfer_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotFound(_) => "not_found",
        }
    }
}

/// The storage primitive that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageOperation {
    /// Existence check
    Exists,
    /// Directory listing
    List,
    /// Directory creation
    Ensure,
    /// Artifact write (including the scratch phase of a two-phase write)
    Write,
    /// Artifact read
    Read,
    /// Single artifact deletion
    Delete,
    /// Bulk deletion
    DeleteAll,
}

impl fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageOperation::Exists => "exists",
            StorageOperation::List => "list",
            StorageOperation::Ensure => "ensure",
            StorageOperation::Write => "write",
            StorageOperation::Read => "read",
            StorageOperation::Delete => "delete",
            StorageOperation::DeleteAll => "delete_all",
        };
        f.write_str(s)
    }
}

/// A storage backend operation failed
#[derive(Debug, Error)]
#[error("{operation} failed for {name}: {cause}")]
pub struct StorageError {
    /// The operation that failed
    pub operation: StorageOperation,
    /// Artifact name (or directory reference for directory-level operations)
    pub name: String,
    /// Underlying cause
    #[source]
    pub cause: std::io::Error,
}

impl StorageError {
    /// Create a new storage error
    pub fn new(
        operation: StorageOperation,
        name: impl Into<String>,
        cause: std::io::Error,
    ) -> Self {
        Self {
            operation,
            name: name.into(),
            cause,
        }
    }

    /// Whether the underlying cause is a missing file or directory
    pub fn is_not_found(&self) -> bool {
        self.cause.kind() == std::io::ErrorKind::NotFound
    }
}

/// A network transfer failed
#[derive(Debug, Error)]
pub enum TransferError {
    /// Server answered with a non-success status
    #[error("{url} returned status {status}")]
    Status {
        /// The requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Request could not be sent or the body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Writing the transferred bytes to the scratch file failed
    #[error("I/O failure during transfer: {0}")]
    Io(#[from] std::io::Error),

    /// Handing the finished transfer to the storage backend failed
    #[error("storing transfer failed: {0}")]
    Storage(#[from] StorageError),
}
