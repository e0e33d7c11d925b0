//! URI-based primitives for user-granted directories

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use url::Url;

/// Platform primitives for a directory the user granted access to
///
/// Only URIs cross this boundary: a granted directory accepts content for a
/// file it created, but never a path to copy from. The platform mechanism
/// that produced the grant is outside this crate.
#[async_trait]
pub trait GrantedDirectory: Send + Sync {
    /// URIs of the files directly inside `dir_uri`
    async fn list(&self, dir_uri: &str) -> io::Result<Vec<String>>;

    /// Create (or reuse) a file called `name` and return its URI
    async fn create_file(&self, dir_uri: &str, name: &str, mime_type: &str) -> io::Result<String>;

    /// Replace the content of a file
    async fn write_content(&self, file_uri: &str, bytes: &[u8]) -> io::Result<()>;

    /// Read the content of a file
    async fn read_content(&self, file_uri: &str) -> io::Result<Vec<u8>>;

    /// Delete a file
    async fn delete(&self, file_uri: &str) -> io::Result<()>;

    /// Rename a file inside its directory, replacing any file already called
    /// `new_name`, and return the renamed file's URI
    async fn rename(&self, file_uri: &str, new_name: &str) -> io::Result<String>;

    /// Display name of a file URI (its last path segment)
    fn display_name(&self, file_uri: &str) -> Option<String>;
}

/// [`GrantedDirectory`] over `file://` URIs on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsGrantedDirectory;

impl FsGrantedDirectory {
    fn to_path(uri: &str) -> io::Result<PathBuf> {
        let url = Url::parse(uri).map_err(|e| invalid(format!("invalid URI {uri}: {e}")))?;
        if url.scheme() != "file" {
            return Err(invalid(format!("unsupported URI scheme: {}", url.scheme())));
        }
        url.to_file_path()
            .map_err(|()| invalid(format!("URI does not name a local path: {uri}")))
    }

    fn to_uri(path: PathBuf) -> io::Result<String> {
        Url::from_file_path(&path)
            .map(String::from)
            .map_err(|()| invalid(format!("path is not absolute: {}", path.display())))
    }
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

#[async_trait]
impl GrantedDirectory for FsGrantedDirectory {
    async fn list(&self, dir_uri: &str) -> io::Result<Vec<String>> {
        let dir = Self::to_path(dir_uri)?;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut uris = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                uris.push(Self::to_uri(entry.path())?);
            }
        }
        uris.sort();
        Ok(uris)
    }

    async fn create_file(&self, dir_uri: &str, name: &str, _mime_type: &str) -> io::Result<String> {
        let path = Self::to_path(dir_uri)?.join(name);
        if !tokio::fs::try_exists(&path).await? {
            tokio::fs::File::create(&path).await?;
        }
        Self::to_uri(path)
    }

    async fn write_content(&self, file_uri: &str, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(Self::to_path(file_uri)?, bytes).await
    }

    async fn read_content(&self, file_uri: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(Self::to_path(file_uri)?).await
    }

    async fn delete(&self, file_uri: &str) -> io::Result<()> {
        tokio::fs::remove_file(Self::to_path(file_uri)?).await
    }

    async fn rename(&self, file_uri: &str, new_name: &str) -> io::Result<String> {
        let from = Self::to_path(file_uri)?;
        let to = from.with_file_name(new_name);
        tokio::fs::rename(&from, &to).await?;
        Self::to_uri(to)
    }

    fn display_name(&self, file_uri: &str) -> Option<String> {
        let path = Self::to_path(file_uri).ok()?;
        path.file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    }
}
