use actix_web::http::Uri;
use dotenv::dotenv;
use serde::Deserialize;
use std::{env, str::FromStr};

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app_url: String,
    pub workers: usize,
    pub allowed_origins: Vec<String>,
    pub is_development: bool,

    pub aws_region: String,
    pub aws_s3_bucket_name: String,
    pub aws_dynamodb_table_name: String,

    pub upload_url_expiry_secs: u64,
    pub download_url_expiry_secs: u64,
    pub max_file_size_bytes: u64,
}

pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let config = Config {
            app_url: Self::get_env("APP_URL", "127.0.0.1:8080"),
            workers: Self::get_env_parsed("WORKERS", 2usize)?,
            allowed_origins: Self::get_env_list("ALLOWED_ORIGIN", "*"),
            is_development: Self::get_env_parsed("IS_DEVELOPMENT", false)?,

            aws_region: Self::get_env("AWS_REGION", "us-east-1"),
            aws_s3_bucket_name: Self::get_env("AWS_S3_BUCKET_NAME", ""),
            aws_dynamodb_table_name: Self::get_env("AWS_DYNAMODB_TABLE_NAME", ""),

            upload_url_expiry_secs: Self::get_env_parsed("UPLOAD_URL_EXPIRY_SECS", 300u64)?,
            download_url_expiry_secs: Self::get_env_parsed("DOWNLOAD_URL_EXPIRY_SECS", 300u64)?,
            max_file_size_bytes: Self::get_env_parsed("MAX_FILE_SIZE_BYTES", DEFAULT_MAX_FILE_SIZE)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.aws_s3_bucket_name.is_empty() {
            return Err(ConfigError::Missing("AWS_S3_BUCKET_NAME"));
        }
        if self.aws_dynamodb_table_name.is_empty() {
            return Err(ConfigError::Missing("AWS_DYNAMODB_TABLE_NAME"));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKERS",
                value: "0".to_string(),
            });
        }
        // actix-cors only accepts origins that parse as a URI and refuses to
        // start otherwise.
        if let Some(origin) = self
            .allowed_origins
            .iter()
            .find(|origin| origin.as_str() != "*" && origin.parse::<Uri>().is_err())
        {
            return Err(ConfigError::Invalid {
                key: "ALLOWED_ORIGIN",
                value: origin.clone(),
            });
        }
        Ok(())
    }

    fn get_env(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    fn get_env_list(key: &str, default: &str) -> Vec<String> {
        split_list(&env::var(key).unwrap_or_else(|_| default.to_string()))
    }

    fn get_env_parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
        match env::var(key) {
            Ok(raw) => parse_value(key, &raw),
            Err(_) => Ok(default),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
