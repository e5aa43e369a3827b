//! In-process stores, used by the test suites.
//!
//! Presigned URLs use a `memory://` scheme. Bytes are "uploaded" through
//! [`InMemoryObjectStore::write_presigned`], which enforces the method and
//! key baked into the URL but not its expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{MetadataStore, ObjectInfo, ObjectStore};
use crate::error::StoreError;
use crate::models::{FileRecord, FileStatus};

const URL_SCHEME: &str = "memory://";

#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: Mutex<HashMap<String, FileRecord>>,
    offline: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Only deletes fail; every other call keeps working.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<String, FileRecord>>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("metadata store is offline".to_string()));
        }
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("metadata store lock poisoned".to_string()))
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn put(&self, record: &FileRecord) -> Result<(), StoreError> {
        self.records()?.insert(record.file_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.records()?.get(file_id).cloned())
    }

    async fn mark_completed(
        &self,
        file_id: &str,
        actual_file_size: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<FileRecord>, StoreError> {
        let mut records = self.records()?;
        Ok(records.get_mut(file_id).map(|record| {
            record.status = FileStatus::Completed;
            record.actual_file_size = Some(actual_file_size);
            record.completed_timestamp = Some(completed_at);
            record.clone()
        }))
    }

    async fn list_completed(&self) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self
            .records()?
            .values()
            .filter(|record| record.is_completed())
            .cloned()
            .collect())
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        let mut records = self.records()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("metadata delete rejected".to_string()));
        }
        records.remove(file_id);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

#[derive(Debug)]
pub struct InMemoryObjectStore {
    bucket_name: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    // content type each outstanding upload URL was signed for
    pending_uploads: Mutex<HashMap<String, String>>,
    offline: AtomicBool,
    fail_deletes: AtomicBool,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("nanodrop-local")
    }
}

impl InMemoryObjectStore {
    pub fn new(bucket_name: &str) -> Self {
        Self {
            bucket_name: bucket_name.to_string(),
            objects: Mutex::new(HashMap::new()),
            pending_uploads: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Only deletes fail; presigning and HEAD keep working.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Stores an object directly, bypassing presigned URLs.
    pub fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StoreError> {
        self.objects()?.insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    /// Performs the client side of a direct upload: a PUT to `url`.
    pub fn write_presigned(&self, url: &str, data: &[u8]) -> Result<(), StoreError> {
        let key = self.key_from_url(url, "PUT")?;
        let content_type = self
            .pending_uploads
            .lock()
            .map_err(|_| StoreError::Unavailable("object store lock poisoned".to_string()))?
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::Presign(format!("no upload was signed for {}", key)))?;
        self.put_object(&key, data, &content_type)
    }

    /// Performs a GET through a presigned download URL.
    pub fn read_presigned(&self, url: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let key = self.key_from_url(url, "GET")?;
        Ok(self.object(&key).map(|object| object.data))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.object(key).is_some()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.object(key).map(|object| object.content_type)
    }

    fn objects(&self) -> Result<MutexGuard<'_, HashMap<String, StoredObject>>, StoreError> {
        self.objects
            .lock()
            .map_err(|_| StoreError::Unavailable("object store lock poisoned".to_string()))
    }

    fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("object store is offline".to_string()));
        }
        Ok(())
    }

    fn url(&self, key: &str, method: &str, expires_in: Duration, extra: &str) -> String {
        format!(
            "{}{}/{}?method={}&expires={}{}",
            URL_SCHEME,
            self.bucket_name,
            key,
            method,
            expires_in.as_secs(),
            extra
        )
    }

    fn key_from_url(&self, url: &str, method: &str) -> Result<String, StoreError> {
        let invalid = || StoreError::Presign(format!("not a {} URL for this store: {}", method, url));

        let rest = url
            .strip_prefix(URL_SCHEME)
            .and_then(|rest| rest.strip_prefix(self.bucket_name.as_str()))
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(invalid)?;
        let (key, query) = rest.split_once('?').ok_or_else(invalid)?;

        let signed_method = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("method="))
            .ok_or_else(invalid)?;
        if signed_method != method || key.is_empty() {
            return Err(invalid());
        }
        Ok(key.to_string())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        self.check_online()?;
        self.pending_uploads
            .lock()
            .map_err(|_| StoreError::Unavailable("object store lock poisoned".to_string()))?
            .insert(key.to_string(), content_type.to_string());
        Ok(self.url(key, "PUT", expires_in, ""))
    }

    async fn presign_download(
        &self,
        key: &str,
        content_disposition: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        self.check_online()?;
        let disposition = content_disposition.replace(['&', '?', '#', ' '], "_");
        Ok(self.url(
            key,
            "GET",
            expires_in,
            &format!("&response-content-disposition={}", disposition),
        ))
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        self.check_online()?;
        Ok(self.object(key).map(|object| ObjectInfo {
            size: object.data.len() as u64,
        }))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_online()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("object delete rejected".to_string()));
        }
        self.objects()?.remove(key);
        self.pending_uploads
            .lock()
            .map_err(|_| StoreError::Unavailable("object store lock poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}
