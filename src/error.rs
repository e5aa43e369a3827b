use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Failures raised by the metadata store or the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("DynamoDB request failed: {0}")]
    DynamoDb(#[source] BoxError),

    #[error("S3 request failed: {0}")]
    S3(#[source] BoxError),

    #[error("failed to presign request: {0}")]
    Presign(String),

    #[error("malformed metadata item: {0}")]
    MalformedItem(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn dynamodb<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::DynamoDb(Box::new(err))
    }

    pub fn s3<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::S3(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("File metadata not found")]
    MetadataNotFound,

    #[error("File not found")]
    FileNotFound,

    #[error("File not uploaded to object store")]
    NotUploaded,

    #[error("File upload has not been confirmed")]
    NotConfirmed,

    #[error("{context}")]
    Upstream {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    pub fn upstream(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Upstream { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::MetadataNotFound
            | AppError::FileNotFound
            | AppError::NotUploaded
            | AppError::NotConfirmed => StatusCode::NOT_FOUND,
            AppError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidBody(_) => "INVALID_BODY",
            AppError::MetadataNotFound | AppError::FileNotFound => "FILE_NOT_FOUND",
            AppError::NotUploaded => "OBJECT_NOT_UPLOADED",
            AppError::NotConfirmed => "UPLOAD_NOT_CONFIRMED",
            AppError::Upstream { .. } => "UPSTREAM_FAILURE",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An [`AppError`] on its way out of a handler.
///
/// Upstream failures are logged here. Their underlying cause is only echoed
/// back to the caller when `expose_details` is set (development mode).
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    expose_details: bool,
}

impl ApiError {
    pub fn new(error: AppError, expose_details: bool) -> Self {
        if let AppError::Upstream { context, source } = &error {
            tracing::error!(error = %source, context = %context, "upstream store failure");
        }
        Self {
            error,
            expose_details,
        }
    }

    pub fn inner(&self) -> &AppError {
        &self.error
    }

    fn body(&self) -> ErrorBody {
        let details = match &self.error {
            AppError::Upstream { source, .. } if self.expose_details => Some(source.to_string()),
            _ => None,
        };
        ErrorBody {
            error: self.error.to_string(),
            code: self.error.code(),
            details,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.error.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}
