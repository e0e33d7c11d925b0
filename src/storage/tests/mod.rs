use super::*;
use crate::error::StorageOperation;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tempfile::TempDir;

fn file_uri(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}

fn sandboxed(temp: &TempDir) -> Arc<dyn StorageBackend> {
    Arc::new(SandboxedStorage::new(temp.path().join("birds")))
}

fn external(temp: &TempDir) -> Arc<dyn StorageBackend> {
    let granted = temp.path().join("granted");
    std::fs::create_dir_all(&granted).unwrap();
    Arc::new(ExternalStorage::new(
        file_uri(&granted),
        temp.path().join("cache"),
        Arc::new(FsGrantedDirectory),
    ))
}

fn scratch_entries(temp: &TempDir) -> usize {
    match std::fs::read_dir(temp.path().join("cache")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

/// Both backends, each in its own temp dir
fn both_backends() -> Vec<(Arc<dyn StorageBackend>, TempDir)> {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    vec![(sandboxed(&a), a), (external(&b), b)]
}

/// Granted-directory primitives whose content writes always fail
struct BrokenContentWrites;

#[async_trait]
impl GrantedDirectory for BrokenContentWrites {
    async fn list(&self, dir_uri: &str) -> io::Result<Vec<String>> {
        FsGrantedDirectory.list(dir_uri).await
    }

    async fn create_file(&self, dir_uri: &str, name: &str, mime_type: &str) -> io::Result<String> {
        FsGrantedDirectory.create_file(dir_uri, name, mime_type).await
    }

    async fn write_content(&self, _file_uri: &str, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::other("device ejected"))
    }

    async fn read_content(&self, file_uri: &str) -> io::Result<Vec<u8>> {
        FsGrantedDirectory.read_content(file_uri).await
    }

    async fn delete(&self, file_uri: &str) -> io::Result<()> {
        FsGrantedDirectory.delete(file_uri).await
    }

    async fn rename(&self, file_uri: &str, new_name: &str) -> io::Result<String> {
        FsGrantedDirectory.rename(file_uri, new_name).await
    }

    fn display_name(&self, file_uri: &str) -> Option<String> {
        FsGrantedDirectory.display_name(file_uri)
    }
}

#[tokio::test]
async fn test_write_read_exists_behave_identically() {
    for (backend, _temp) in both_backends() {
        backend.ensure().await.unwrap();
        assert!(!backend.exists("bird_1.jpg").await, "{}", backend.name());

        let artifact = backend
            .write("bird_1.jpg", b"\xFF\xD8jpeg", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(artifact.name, "bird_1.jpg");
        assert_eq!(&artifact.directory, backend.directory());

        assert!(backend.exists("bird_1.jpg").await, "{}", backend.name());
        assert_eq!(backend.read("bird_1.jpg").await.unwrap(), b"\xFF\xD8jpeg");
        assert_eq!(backend.list().await.unwrap(), vec!["bird_1.jpg"]);
    }
}

#[tokio::test]
async fn test_write_replaces_previous_content() {
    for (backend, _temp) in both_backends() {
        backend.write("events.json", b"{}", "application/json").await.unwrap();
        backend
            .write("events.json", b"{\"a\":[]}", "application/json")
            .await
            .unwrap();
        assert_eq!(backend.read("events.json").await.unwrap(), b"{\"a\":[]}");
        assert_eq!(backend.list().await.unwrap().len(), 1, "{}", backend.name());
    }
}

#[tokio::test]
async fn test_delete_single_artifact() {
    for (backend, _temp) in both_backends() {
        backend.write("a.jpg", b"a", "image/jpeg").await.unwrap();
        backend.write("b.jpg", b"b", "image/jpeg").await.unwrap();

        backend.delete("a.jpg").await.unwrap();
        assert_eq!(backend.list().await.unwrap(), vec!["b.jpg"]);

        let err = backend.delete("a.jpg").await.unwrap_err();
        assert_eq!(err.operation, StorageOperation::Delete);
        assert!(err.is_not_found(), "{}", backend.name());
    }
}

#[tokio::test]
async fn test_read_missing_artifact_is_not_found() {
    for (backend, _temp) in both_backends() {
        backend.ensure().await.unwrap();
        let err = backend.read("events.json").await.unwrap_err();
        assert_eq!(err.operation, StorageOperation::Read);
        assert_eq!(err.name, "events.json");
        assert!(err.is_not_found());
    }
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    for (backend, _temp) in both_backends() {
        let err = backend
            .write("../escape.jpg", b"x", "image/jpeg")
            .await
            .unwrap_err();
        assert_eq!(err.operation, StorageOperation::Write);
        assert!(!backend.exists("../escape.jpg").await);
    }
}

#[tokio::test]
async fn test_sandboxed_list_does_not_create_directory() {
    let temp = TempDir::new().unwrap();
    let backend = SandboxedStorage::new(temp.path().join("birds"));

    assert!(backend.list().await.unwrap().is_empty());
    assert!(!backend.exists("anything").await);
    assert!(!backend.root().exists());
}

#[tokio::test]
async fn test_sandboxed_ensure_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let backend = SandboxedStorage::new(temp.path().join("nested").join("birds"));

    backend.ensure().await.unwrap();
    backend.ensure().await.unwrap();
    assert!(backend.root().is_dir());
}

#[tokio::test]
async fn test_sandboxed_delete_all_recreates_empty_directory() {
    let temp = TempDir::new().unwrap();
    let backend = SandboxedStorage::new(temp.path().join("birds"));
    for name in ["a.jpg", "b.jpg", "events.json"] {
        backend.write(name, b"data", "application/octet-stream").await.unwrap();
    }

    let removed = backend.delete_all().await.unwrap();

    assert_eq!(removed, 3);
    assert!(backend.root().is_dir());
    assert!(backend.list().await.unwrap().is_empty());
    backend.ensure().await.unwrap();
    assert!(backend.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sandboxed_delete_all_on_absent_directory() {
    let temp = TempDir::new().unwrap();
    let backend = SandboxedStorage::new(temp.path().join("birds"));

    assert_eq!(backend.delete_all().await.unwrap(), 0);
    assert!(!backend.root().exists());
}

#[tokio::test]
async fn test_sandboxed_list_hides_partial_files() {
    let temp = TempDir::new().unwrap();
    let backend = SandboxedStorage::new(temp.path().join("birds"));
    backend.ensure().await.unwrap();
    std::fs::write(backend.root().join(".bird_9.jpg.partial"), b"half").unwrap();
    std::fs::create_dir(backend.root().join("subdir")).unwrap();
    backend.write("bird_1.jpg", b"whole", "image/jpeg").await.unwrap();

    assert_eq!(backend.list().await.unwrap(), vec!["bird_1.jpg"]);
}

#[tokio::test]
async fn test_sandboxed_import_copies_source() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("download.tmp");
    std::fs::write(&source, b"2025-11-17T22-13-28,DATA,x,1\n").unwrap();
    let backend = SandboxedStorage::new(temp.path().join("birds"));

    let artifact = backend.import("data.txt", &source, "text/plain").await.unwrap();

    assert!(Path::new(&artifact.location).exists());
    assert!(source.exists());
    assert_eq!(
        backend.read("data.txt").await.unwrap(),
        b"2025-11-17T22-13-28,DATA,x,1\n"
    );
}

#[tokio::test]
async fn test_external_write_removes_scratch_copy() {
    let temp = TempDir::new().unwrap();
    let backend = external(&temp);

    let artifact = backend.write("bird_1.jpg", b"img", "image/jpeg").await.unwrap();

    assert!(artifact.location.starts_with("file://"));
    assert_eq!(scratch_entries(&temp), 0);
    assert!(temp.path().join("granted").join("bird_1.jpg").exists());
}

#[tokio::test]
async fn test_external_failed_copy_cleans_scratch_and_target() {
    let temp = TempDir::new().unwrap();
    let granted = temp.path().join("granted");
    std::fs::create_dir_all(&granted).unwrap();
    let backend = ExternalStorage::new(
        file_uri(&granted),
        temp.path().join("cache"),
        Arc::new(BrokenContentWrites),
    );

    let err = backend
        .write("bird_1.jpg", b"img", "image/jpeg")
        .await
        .unwrap_err();

    assert_eq!(err.operation, StorageOperation::Write);
    assert_eq!(scratch_entries(&temp), 0);
    assert!(!backend.exists("bird_1.jpg").await);
    assert!(backend.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_external_failed_overwrite_keeps_previous_artifact() {
    let temp = TempDir::new().unwrap();
    let granted = temp.path().join("granted");
    std::fs::create_dir_all(&granted).unwrap();
    std::fs::write(granted.join("events.json"), b"{\"old\":[]}").unwrap();
    let backend = ExternalStorage::new(
        file_uri(&granted),
        temp.path().join("cache"),
        Arc::new(BrokenContentWrites),
    );

    let err = backend
        .write("events.json", b"{\"new\":[]}", "application/json")
        .await
        .unwrap_err();

    assert_eq!(err.operation, StorageOperation::Write);
    assert!(backend.exists("events.json").await);
    assert_eq!(backend.read("events.json").await.unwrap(), b"{\"old\":[]}");
    assert_eq!(backend.list().await.unwrap(), vec!["events.json"]);
    assert!(!granted.join(".events.json.partial").exists());
    assert_eq!(scratch_entries(&temp), 0);
}

#[tokio::test]
async fn test_external_overwrite_replaces_content_without_leftovers() {
    let temp = TempDir::new().unwrap();
    let backend = external(&temp);
    backend.write("events.json", b"first", "application/json").await.unwrap();
    backend.write("events.json", b"second", "application/json").await.unwrap();

    assert_eq!(backend.read("events.json").await.unwrap(), b"second");
    let on_disk: Vec<_> = std::fs::read_dir(temp.path().join("granted"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(on_disk, vec!["events.json"]);
}

#[tokio::test]
async fn test_external_delete_all_keeps_granted_directory() {
    let temp = TempDir::new().unwrap();
    let backend = external(&temp);
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        backend.write(name, b"x", "image/jpeg").await.unwrap();
    }

    assert_eq!(backend.delete_all().await.unwrap(), 3);
    assert!(temp.path().join("granted").is_dir());
    assert!(backend.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_external_missing_grant_fails_list() {
    let temp = TempDir::new().unwrap();
    let backend = ExternalStorage::new(
        file_uri(&temp.path().join("revoked")),
        temp.path().join("cache"),
        Arc::new(FsGrantedDirectory),
    );

    let err = backend.list().await.unwrap_err();
    assert_eq!(err.operation, StorageOperation::List);
    assert!(!backend.exists("a.jpg").await);
}

#[test]
fn test_open_backend_follows_config_flag() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.documents_dir = temp.path().to_path_buf();

    let backend = open_backend(&config).unwrap();
    assert_eq!(backend.name(), "sandboxed");
    assert!(backend.directory().is_sandboxed());

    config.storage.use_external_directory = true;
    config.storage.directory = file_uri(temp.path());
    let backend = open_backend(&config).unwrap();
    assert_eq!(backend.name(), "external");
    assert_eq!(
        backend.directory(),
        &DirectoryRef::ExternalGranted {
            uri: file_uri(temp.path())
        }
    );
}

#[test]
fn test_fs_granted_rejects_non_file_uris() {
    assert_eq!(
        FsGrantedDirectory.display_name("content://com.android/tree/primary%3ABirds"),
        None
    );
    assert_eq!(
        FsGrantedDirectory.display_name("file:///sdcard/Birds/bird_1.jpg"),
        Some("bird_1.jpg".to_string())
    );
}
