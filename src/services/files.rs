use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use super::{MetadataStore, ObjectStore};
use crate::config::{Config, DEFAULT_MAX_FILE_SIZE};
use crate::error::AppError;
use crate::models::{
    truncate_to_millis, ConfirmResponse, DeleteResponse, DownloadResponse, FileRecord,
    ListResponse, UploadRequest, UploadResponse,
};
use crate::utils::{disposition, file_id::generate_file_id};

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_file_size: u64,
    pub upload_url_ttl: Duration,
    pub download_url_ttl: Duration,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            upload_url_ttl: Duration::from_secs(300),
            download_url_ttl: Duration::from_secs(300),
        }
    }
}

impl From<&Config> for UploadPolicy {
    fn from(config: &Config) -> Self {
        Self {
            max_file_size: config.max_file_size_bytes,
            upload_url_ttl: Duration::from_secs(config.upload_url_expiry_secs),
            download_url_ttl: Duration::from_secs(config.download_url_expiry_secs),
        }
    }
}

/// Drives the upload lifecycle: request URL, confirm, list, download, delete.
///
/// Holds no mutable state of its own. Every operation is a short sequence of
/// calls against the two stores with no retries and no locking.
#[derive(Clone)]
pub struct FileService {
    metadata: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
}

impl FileService {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            metadata,
            objects,
            policy,
        }
    }

    pub async fn request_upload(&self, request: UploadRequest) -> Result<UploadResponse, AppError> {
        let started = Instant::now();
        let upload = request.validate(self.policy.max_file_size)?;

        let file_id = generate_file_id(&upload.file_name);

        // Sign before writing metadata so a signing failure leaves no record.
        let presigned_url = self
            .objects
            .presign_upload(&file_id, &upload.content_type, self.policy.upload_url_ttl)
            .await
            .map_err(AppError::upstream("Failed to generate upload URL"))?;

        let record = FileRecord::pending(file_id.clone(), &upload, Utc::now());
        self.metadata
            .put(&record)
            .await
            .map_err(AppError::upstream("Failed to generate upload URL"))?;

        tracing::info!(
            file_id = %file_id,
            file_size = upload.file_size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upload URL issued"
        );

        Ok(UploadResponse {
            presigned_url,
            file_id,
            expires_in: self.policy.upload_url_ttl.as_secs(),
        })
    }

    pub async fn confirm_upload(&self, file_id: Option<String>) -> Result<ConfirmResponse, AppError> {
        let started = Instant::now();
        let file_id = require_file_id(file_id.as_deref())?;

        let record = self
            .metadata
            .get(file_id)
            .await
            .map_err(AppError::upstream("Failed to confirm upload"))?
            .ok_or(AppError::MetadataNotFound)?;

        let object = self
            .objects
            .head(file_id)
            .await
            .map_err(AppError::upstream("Failed to confirm upload"))?
            .ok_or_else(|| {
                tracing::info!(file_id = %file_id, "confirm requested before object landed");
                AppError::NotUploaded
            })?;

        if object.size != record.file_size {
            tracing::warn!(
                file_id = %file_id,
                declared = record.file_size,
                actual = object.size,
                "uploaded size differs from declared size"
            );
        }

        let updated = self
            .metadata
            .mark_completed(file_id, object.size, truncate_to_millis(Utc::now()))
            .await
            .map_err(AppError::upstream("Failed to confirm upload"))?
            .ok_or(AppError::MetadataNotFound)?;

        tracing::info!(
            file_id = %file_id,
            actual_file_size = object.size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upload confirmed"
        );

        Ok(ConfirmResponse {
            message: "Upload confirmed successfully".to_string(),
            file_id: updated.file_id,
            actual_file_size: object.size,
        })
    }

    pub async fn list_files(&self) -> Result<ListResponse, AppError> {
        let started = Instant::now();
        let mut files = self
            .metadata
            .list_completed()
            .await
            .map_err(AppError::upstream("Failed to list files"))?;

        // Stores may hand back records in any order; also drop anything a
        // store returned that is not completed.
        files.retain(FileRecord::is_completed);
        files.sort_by(|a, b| {
            b.upload_timestamp
                .cmp(&a.upload_timestamp)
                .then_with(|| b.file_id.cmp(&a.file_id))
        });

        tracing::info!(
            files_count = files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "files listed"
        );

        Ok(ListResponse { files })
    }

    pub async fn download_url(&self, file_id: &str) -> Result<DownloadResponse, AppError> {
        let started = Instant::now();
        let file_id = require_file_id(Some(file_id))?;

        let record = self
            .metadata
            .get(file_id)
            .await
            .map_err(AppError::upstream("Failed to generate download URL"))?
            .ok_or(AppError::FileNotFound)?;

        if !record.is_completed() {
            return Err(AppError::NotConfirmed);
        }

        let presigned_url = self
            .objects
            .presign_download(
                file_id,
                &disposition::attachment(&record.file_name),
                self.policy.download_url_ttl,
            )
            .await
            .map_err(AppError::upstream("Failed to generate download URL"))?;

        tracing::info!(
            file_id = %file_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "download URL issued"
        );

        Ok(DownloadResponse {
            presigned_url,
            file_name: record.file_name,
            expires_in: self.policy.download_url_ttl.as_secs(),
        })
    }

    /// Removes the object, then the metadata record.
    ///
    /// The two deletes are not atomic. If the second one fails the record is
    /// left pointing at a missing object and the caller gets a 500; retrying
    /// the delete converges because deleting a missing object succeeds.
    pub async fn delete_file(&self, file_id: &str) -> Result<DeleteResponse, AppError> {
        let started = Instant::now();
        let file_id = require_file_id(Some(file_id))?;

        self.metadata
            .get(file_id)
            .await
            .map_err(AppError::upstream("Failed to delete file"))?
            .ok_or(AppError::FileNotFound)?;

        self.objects
            .delete(file_id)
            .await
            .map_err(AppError::upstream("Failed to delete file"))?;

        if let Err(err) = self.metadata.delete(file_id).await {
            tracing::error!(
                file_id = %file_id,
                error = %err,
                "object removed but metadata record remains"
            );
            return Err(AppError::upstream("Failed to delete file")(err));
        }

        tracing::info!(
            file_id = %file_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "file deleted"
        );

        Ok(DeleteResponse {
            message: "File deleted successfully".to_string(),
            file_id: file_id.to_string(),
        })
    }
}

// Ids are used exactly as given; only an empty id is rejected.
fn require_file_id(file_id: Option<&str>) -> Result<&str, AppError> {
    match file_id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(AppError::Validation("fileId is required".to_string())),
    }
}
