use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig as AwsConfig;
use aws_sdk_s3::{error::SdkError, presigning::PresigningConfig, Client as S3Client};

use super::{ObjectInfo, ObjectStore};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct Client {
    s3: S3Client,
    bucket_name: String,
}

impl Client {
    pub fn new(config: &AwsConfig, bucket_name: &str) -> Client {
        Client {
            s3: S3Client::new(config),
            bucket_name: bucket_name.to_string(),
        }
    }

    fn presigning_config(expires_in: Duration) -> Result<PresigningConfig, StoreError> {
        PresigningConfig::expires_in(expires_in).map_err(|e| StoreError::Presign(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for Client {
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let presigned = self
            .s3
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| StoreError::Presign(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn presign_download(
        &self,
        key: &str,
        content_disposition: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let presigned = self
            .s3
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .response_content_disposition(content_disposition)
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| StoreError::Presign(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        let result = self
            .s3
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let size = output.content_length().unwrap_or(0).max(0) as u64;
                Ok(Some(ObjectInfo { size }))
            }
            // HEAD responses carry no body, so the 404 status is all there is
            Err(SdkError::ServiceError(err)) if err.raw().status().as_u16() == 404 => Ok(None),
            Err(err) => Err(StoreError::s3(err)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.s3
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(StoreError::s3)?;
        Ok(())
    }
}
