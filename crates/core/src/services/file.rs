//! Attachment files.

use std::sync::Arc;

use clubdesk_common::{
    AppError, AppResult, FileRules, IdGenerator, StorageBackend, StoredFile,
    generate_storage_key,
    storage::{content_type_for, validate_key},
};

/// A downloaded file.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub key: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Service for uploading, reading and deleting attachments.
#[derive(Clone)]
pub struct FileService {
    storage: Arc<dyn StorageBackend>,
    rules: FileRules,
    id_gen: IdGenerator,
}

impl FileService {
    /// Create a new file service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, rules: FileRules) -> Self {
        Self {
            storage,
            rules,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store an upload under a fresh key.
    pub async fn upload(&self, file_name: &str, data: &[u8]) -> AppResult<StoredFile> {
        let extension = self.rules.check(file_name, data.len())?;
        let key = generate_storage_key(&self.id_gen.generate(), &extension);

        let stored = self.storage.upload(&key, data).await?;
        tracing::info!(key = %stored.key, size = stored.size, original = %file_name, "Stored attachment");
        Ok(stored)
    }

    /// Read a file.
    pub async fn download(&self, key: &str) -> AppResult<FileContent> {
        let data = self.storage.read(key).await?;
        Ok(FileContent {
            key: key.to_string(),
            content_type: content_type_for(key),
            data,
        })
    }

    /// Delete a file.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        validate_key(key)?;
        self.storage.delete(key).await
    }

    /// Fail with a validation error unless `key` names a stored file.
    pub async fn ensure_exists(&self, key: &str) -> AppResult<()> {
        let found = validate_key(key).is_ok() && self.storage.exists(key).await?;
        if found {
            Ok(())
        } else {
            Err(AppError::Validation(format!("Attachment not found: {key}")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clubdesk_common::LocalStorage;

    fn build_service(dir: &std::path::Path) -> FileService {
        FileService::new(
            Arc::new(LocalStorage::new(dir.to_path_buf())),
            FileRules::new(1024),
        )
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("clubdesk-files-{name}-{}", IdGenerator::new().generate()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_upload_download_delete() {
        let dir = temp_dir("roundtrip");
        let service = build_service(&dir);

        let stored = service.upload("Invoice.PDF", b"%PDF-1.4").await.unwrap();
        assert!(stored.key.ends_with(".pdf"));
        assert_eq!(stored.content_type, "application/pdf");

        service.ensure_exists(&stored.key).await.unwrap();
        let file = service.download(&stored.key).await.unwrap();
        assert_eq!(file.data, b"%PDF-1.4");

        service.delete(&stored.key).await.unwrap();
        assert!(matches!(
            service.ensure_exists(&stored.key).await,
            Err(AppError::Validation(_))
        ));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_extension() {
        let dir = temp_dir("reject");
        let service = build_service(&dir);

        let result = service.upload("script.exe", b"MZ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service.upload("big.png", &[0u8; 2048]).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_ensure_exists_rejects_malformed_key() {
        let dir = temp_dir("malformed");
        let service = build_service(&dir);

        let result = service.ensure_exists("../etc/passwd").await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        std::fs::remove_dir_all(dir).ok();
    }
}
