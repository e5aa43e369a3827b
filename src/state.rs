use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};

use crate::config::Config;
use crate::error::{ApiError, AppError};
use crate::services::files::{FileService, UploadPolicy};
use crate::services::{dynamodb, s3};

/// Shared by every worker; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub files: FileService,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(files: FileService, expose_error_details: bool) -> Self {
        Self {
            files,
            expose_error_details,
        }
    }

    /// Wires the service to DynamoDB and S3 using the ambient AWS
    /// credentials chain.
    pub async fn from_config(config: &Config) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;

        let metadata = Arc::new(dynamodb::Client::new(
            &aws_config,
            &config.aws_dynamodb_table_name,
        ));
        let objects = Arc::new(s3::Client::new(&aws_config, &config.aws_s3_bucket_name));

        let files = FileService::new(metadata, objects, UploadPolicy::from(config));
        Self::new(files, config.is_development)
    }

    pub fn reject(&self, error: AppError) -> ApiError {
        ApiError::new(error, self.expose_error_details)
    }
}
