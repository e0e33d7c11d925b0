//! Utility functions for artifact naming and filtering

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Generates collision-free artifact names of the form `<prefix>_<millis>.<ext>`.
///
/// The timestamp part is strictly increasing for a given namer, even when two
/// items finish within the same millisecond or the wall clock steps backwards.
#[derive(Debug, Default)]
pub struct ArtifactNamer {
    last_millis: AtomicI64,
}

impl ArtifactNamer {
    /// Create a namer
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp token, strictly greater than the previous one
    pub fn next_stamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = self.last_millis.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(last + 1);
            match self.last_millis.compare_exchange(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    /// Name for the next downloaded bird image, e.g. `bird_1731880408123.jpg`
    pub fn next_image_name(&self) -> String {
        format!("bird_{}.jpg", self.next_stamp())
    }
}

/// Whether a stored artifact name looks like an image (`.jpg`, `.jpeg`, `.png`)
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ext == "jpg" || ext == "jpeg" || ext == "png"
        })
        .unwrap_or(false)
}

/// Guess a MIME type from an artifact name
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Reject names that would escape the storage directory.
pub fn validate_artifact_name(name: &str) -> std::io::Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid artifact name: {name:?}"),
        ));
    }
    Ok(())
}

/// Suffix of in-flight artifacts
const PARTIAL_SUFFIX: &str = ".partial";

/// Hidden sibling name under which `name` is staged before it is committed
pub(crate) fn partial_name(name: &str) -> String {
    format!(".{name}{PARTIAL_SUFFIX}")
}

/// Whether `name` is an in-flight staging name; such names are never listed
pub(crate) fn is_partial_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)
}

/// Unique file name for a scratch copy of `name`
pub fn scratch_file_name(name: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}.part", std::process::id(), seq, name)
}

/// A private scratch path that is removed when dropped, on every exit path
#[derive(Debug)]
pub(crate) struct ScratchPath {
    path: PathBuf,
}

impl ScratchPath {
    /// Reserve a unique scratch path for `name` inside `dir`, creating `dir`
    pub(crate) async fn new(dir: &Path, name: &str) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            path: dir.join(scratch_file_name(name)),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchPath {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = ?self.path, error = %e, "failed to remove scratch file"),
        }
    }
}
