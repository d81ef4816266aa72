//! Attachment storage.
//!
//! Files are addressed by an opaque key of the form `{ulid}.{ext}`. Only the
//! local filesystem backend exists today; the [`StorageBackend`] trait is the
//! seam services depend on.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Extensions accepted for uploads (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// Upload rules: extension allow-list and size cap.
#[derive(Debug, Clone, Copy)]
pub struct FileRules {
    /// Maximum accepted size in bytes.
    pub max_bytes: usize,
}

impl FileRules {
    /// Create rules with the given size cap.
    #[must_use]
    pub const fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Validate an upload, returning its normalized (lowercase) extension.
    pub fn check(&self, file_name: &str, size: usize) -> AppResult<String> {
        if size == 0 {
            return Err(AppError::Validation("File is empty".to_string()));
        }
        if size > self.max_bytes {
            return Err(AppError::Validation(format!(
                "File exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        let extension = extension_of(file_name).ok_or_else(|| {
            AppError::Validation(format!("File type not allowed: {file_name}"))
        })?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::Validation(format!(
                "File type not allowed: .{extension}"
            )));
        }

        Ok(extension)
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Build a storage key for a new file.
#[must_use]
pub fn generate_storage_key(id: &str, extension: &str) -> String {
    format!("{id}.{extension}")
}

/// Check that a key is one this crate could have produced.
///
/// Keys end up in filesystem paths, so anything other than `[a-z0-9]+.ext`
/// with an allowed extension is rejected.
pub fn validate_key(key: &str) -> AppResult<()> {
    let valid = key.split_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty()
            && stem
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && ALLOWED_EXTENSIONS.contains(&ext)
    });

    if valid {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("File not found: {key}")))
    }
}

/// Metadata of a stored file.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Storage key.
    pub key: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type guessed from the extension.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under `key`.
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<StoredFile>;

    /// Read a file's bytes.
    async fn read(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

/// Guess the MIME type for a key from its extension.
#[must_use]
pub fn content_type_for(key: &str) -> String {
    mime_guess::from_path(key)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        let path = self.path_for(key)?;

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(StoredFile {
            key: key.to_string(),
            size: data.len() as u64,
            content_type: content_type_for(key),
        })
    }

    async fn read(&self, key: &str) -> AppResult<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("File not found: {key}")))
            }
            Err(e) => Err(AppError::Storage(format!("Failed to read file: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }
}
