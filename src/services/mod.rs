use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::StoreError;
use crate::models::FileRecord;

pub mod dynamodb;
pub mod files;
pub mod memory;
pub mod s3;

/// Persistence for [`FileRecord`]s, keyed by `file_id`.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn put(&self, record: &FileRecord) -> Result<(), StoreError>;

    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError>;

    /// Flips an existing record to completed. Returns `None` when the record
    /// no longer exists, in which case nothing is written.
    async fn mark_completed(
        &self,
        file_id: &str,
        actual_file_size: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<FileRecord>, StoreError>;

    /// Every completed record, in no particular order.
    async fn list_completed(&self) -> Result<Vec<FileRecord>, StoreError>;

    async fn delete(&self, file_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size: u64,
}

/// Gateway to the bucket holding the file bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// The signature covers `Content-Type`, so the client must send the same
    /// value with its PUT.
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError>;

    async fn presign_download(
        &self,
        key: &str,
        content_disposition: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError>;

    /// `None` when no object exists under `key`.
    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
