use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MAX_FILE_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Completed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(FileStatus::Pending),
            "completed" => Some(FileStatus::Completed),
            _ => None,
        }
    }
}

/// One metadata row per uploaded (or still pending) object. `file_id` doubles
/// as the object key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
    #[serde(default)]
    pub description: String,
    pub status: FileStatus,
    pub upload_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_timestamp: Option<DateTime<Utc>>,
}

/// Record timestamps are stored with millisecond precision.
pub fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(TimeDelta::milliseconds(1))
        .unwrap_or(timestamp)
}

impl FileRecord {
    pub fn pending(file_id: String, upload: &ValidatedUpload, now: DateTime<Utc>) -> Self {
        FileRecord {
            file_id,
            file_name: upload.file_name.clone(),
            file_size: upload.file_size,
            content_type: upload.content_type.clone(),
            description: upload.description.clone(),
            status: FileStatus::Pending,
            upload_timestamp: truncate_to_millis(now),
            actual_file_size: None,
            completed_timestamp: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == FileStatus::Completed
    }
}

// Fields are optional so that a missing field is reported as a validation
// error rather than a body parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub content_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
    pub description: String,
}

impl UploadRequest {
    pub fn validate(self, max_file_size: u64) -> Result<ValidatedUpload, AppError> {
        let file_name = self.file_name.filter(|s| !s.trim().is_empty());
        let file_size = self.file_size.filter(|size| *size > 0);
        let content_type = self.content_type.filter(|s| !s.trim().is_empty());

        let (Some(file_name), Some(file_size), Some(content_type)) =
            (file_name, file_size, content_type)
        else {
            return Err(AppError::Validation(
                "fileName, fileSize, and contentType are required".to_string(),
            ));
        };

        if file_size > max_file_size {
            return Err(AppError::Validation(format!(
                "File size exceeds {} limit",
                format_size_limit(max_file_size)
            )));
        }

        if file_name.chars().count() > MAX_FILE_NAME_LEN {
            return Err(AppError::Validation(format!(
                "fileName must be at most {} characters",
                MAX_FILE_NAME_LEN
            )));
        }

        Ok(ValidatedUpload {
            file_name,
            file_size,
            content_type,
            description: self.description.unwrap_or_default(),
        })
    }
}

fn format_size_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub presigned_url: String,
    pub file_id: String,
    pub expires_in: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub message: String,
    pub file_id: String,
    pub actual_file_size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub presigned_url: String,
    pub file_name: String,
    pub expires_in: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub file_id: String,
}
