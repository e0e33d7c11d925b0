//! Artifact storage
//!
//! The core abstraction is the [`StorageBackend`] trait. Two implementations
//! are provided and are interchangeable from the caller's point of view:
//!
//! - [`SandboxedStorage`]: an app-private directory addressed by path
//! - [`ExternalStorage`]: a user-granted directory addressed only by URI,
//!   written through [`GrantedDirectory`] primitives
//!
//! The implementation is chosen once, from the configuration snapshot, by
//! [`open_backend`]. Callers never branch on the kind.
//!
//! ## Usage
//!
//! ```no_run
//! use birdmon::storage::{open_backend, StorageBackend};
//! use birdmon::Config;
//!
//! # async fn example() -> birdmon::Result<()> {
//! let backend = open_backend(&Config::default())?;
//! backend.ensure().await?;
//! backend.write("note.txt", b"hello", "text/plain").await?;
//! assert!(backend.exists("note.txt").await);
//! # Ok(())
//! # }
//! ```

mod external;
mod granted;
mod sandboxed;
mod traits;

pub use external::ExternalStorage;
pub use granted::{FsGrantedDirectory, GrantedDirectory};
pub use sandboxed::SandboxedStorage;
pub use traits::{StorageBackend, StorageResult};

use crate::config::Config;
use crate::error::Result;
use crate::types::DirectoryRef;
use std::sync::Arc;

/// Build the backend selected by `use_external_directory`.
///
/// External directories are reached through [`FsGrantedDirectory`]; embedders
/// with a different grant mechanism use [`open_backend_with`].
pub fn open_backend(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    open_backend_with(config, Arc::new(FsGrantedDirectory))
}

/// Build the configured backend using the given granted-directory primitives
pub fn open_backend_with(
    config: &Config,
    granted: Arc<dyn GrantedDirectory>,
) -> Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config.directory_ref()? {
        DirectoryRef::Sandboxed { path } => Arc::new(SandboxedStorage::new(path)),
        DirectoryRef::ExternalGranted { uri } => Arc::new(ExternalStorage::new(
            uri,
            config.storage.scratch_dir.clone(),
            granted,
        )),
    };
    tracing::debug!(
        backend = backend.name(),
        directory = %backend.directory(),
        "opened storage backend"
    );
    Ok(backend)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
