//! Uploaded file acceptance and storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::database::models::PinType;

/// Content types accepted for upload
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Path under which stored files are served
pub const UPLOADS_ROUTE: &str = "/uploads";

/// A file received in a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Declared content type without parameters, lowercased
    fn essence(&self) -> String {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_file_bytes: usize,
}

impl UploadPolicy {
    pub fn new(max_file_bytes: usize) -> Self {
        Self { max_file_bytes }
    }

    /// Type check first, then size. Returns the pin type the file becomes.
    pub fn check(&self, file: &UploadedFile) -> ServiceResult<PinType> {
        let essence = file.essence();
        if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
            let shown = if essence.is_empty() { "unknown".to_string() } else { essence };
            return Err(ServiceError::UnsupportedFileType(shown));
        }
        if file.bytes.len() > self.max_file_bytes {
            return Err(ServiceError::FileTooLarge {
                limit: self.max_file_bytes,
            });
        }
        PinType::from_content_type(&essence).ok_or(ServiceError::UnsupportedFileType(essence))
    }
}

/// `file-<millis>-<uuid>.<ext>`; the extension comes from the client's file
/// name when it is plain alphanumeric, else from the content type.
pub fn stored_file_name(file: &UploadedFile, now: DateTime<Utc>) -> String {
    let ext = file
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| extension_for(&file.essence()).to_string());
    format!("file-{}-{}.{}", now.timestamp_millis(), Uuid::new_v4().simple(), ext)
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// Absolute URL of a stored file
pub fn public_url(base_url: &str, file_name: &str) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), UPLOADS_ROUTE, file_name)
}

/// Byte storage for uploaded files, addressed by generated name
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
    /// Removing a missing file succeeds
    async fn remove(&self, name: &str) -> io::Result<()>;
}

/// Files kept in a local directory, created on first write
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(name), bytes).await
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.root.join(name)).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content_type: &str, len: usize) -> UploadedFile {
        UploadedFile {
            file_name: Some(name.to_string()),
            content_type: Some(content_type.to_string()),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn maps_content_type_to_pin_type() {
        let policy = UploadPolicy::new(1024);
        assert_eq!(policy.check(&file("a.png", "image/png", 10)).unwrap(), PinType::Image);
        assert_eq!(policy.check(&file("a.pdf", "application/pdf", 10)).unwrap(), PinType::Pdf);
        assert_eq!(policy.check(&file("a.jpg", "IMAGE/JPEG; q=1", 10)).unwrap(), PinType::Image);
    }

    #[test]
    fn rejects_types_outside_allow_list() {
        let policy = UploadPolicy::new(1024);
        let err = policy.check(&file("a.svg", "image/svg+xml", 10)).unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedFileType(t) if t == "image/svg+xml"));

        let mut untyped = file("a.bin", "", 10);
        untyped.content_type = None;
        assert!(matches!(policy.check(&untyped), Err(ServiceError::UnsupportedFileType(_))));
    }

    #[test]
    fn enforces_size_limit_inclusively() {
        let policy = UploadPolicy::new(16);
        assert!(policy.check(&file("a.png", "image/png", 16)).is_ok());
        assert!(matches!(
            policy.check(&file("a.png", "image/png", 17)),
            Err(ServiceError::FileTooLarge { limit: 16 })
        ));
    }

    #[test]
    fn generates_unique_names_with_extension() {
        let now = Utc::now();
        let a = stored_file_name(&file("Photo.PNG", "image/png", 1), now);
        let b = stored_file_name(&file("Photo.PNG", "image/png", 1), now);
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("file-{}-", now.timestamp_millis())));
        assert!(a.ends_with(".png"));

        let odd = stored_file_name(&file("../../etc/passwd", "application/pdf", 1), now);
        assert!(odd.ends_with(".pdf"));
        assert!(!odd.contains('/'));
    }

    #[test]
    fn builds_public_url() {
        assert_eq!(
            public_url("http://localhost:5000/", "file-1-a.png"),
            "http://localhost:5000/uploads/file-1-a.png"
        );
    }

    #[tokio::test]
    async fn local_store_writes_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path().join("nested"));

        store.save("file-1.png", b"png").await.unwrap();
        let written = tokio::fs::read(store.root().join("file-1.png")).await.unwrap();
        assert_eq!(written, b"png");

        store.remove("file-1.png").await.unwrap();
        store.remove("file-1.png").await.unwrap();
        assert!(!store.root().join("file-1.png").exists());
    }
}
