use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig as AwsConfig;
use aws_sdk_dynamodb::{
    error::SdkError,
    types::{AttributeValue, ReturnValue},
    Client as DynamodbClient,
};
use chrono::{DateTime, SecondsFormat, Utc};

use super::MetadataStore;
use crate::error::StoreError;
use crate::models::{FileRecord, FileStatus};

type Item = HashMap<String, AttributeValue>;

#[derive(Debug, Clone)]
pub struct Client {
    dynamodb: DynamodbClient,
    table_name: String,
}

impl Client {
    pub fn new(config: &AwsConfig, table_name: &str) -> Client {
        Client {
            dynamodb: DynamodbClient::new(config),
            table_name: table_name.to_string(),
        }
    }

    fn key(file_id: &str) -> AttributeValue {
        AttributeValue::S(file_id.to_string())
    }
}

#[async_trait]
impl MetadataStore for Client {
    async fn put(&self, record: &FileRecord) -> Result<(), StoreError> {
        let mut input = self.dynamodb.put_item().table_name(&self.table_name);
        for (key, value) in to_item(record) {
            input = input.item(key, value);
        }

        input.send().await.map_err(StoreError::dynamodb)?;
        Ok(())
    }

    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError> {
        let output = self
            .dynamodb
            .get_item()
            .table_name(&self.table_name)
            .key("fileId", Self::key(file_id))
            .consistent_read(true)
            .send()
            .await
            .map_err(StoreError::dynamodb)?;

        output.item().map(from_item).transpose()
    }

    async fn mark_completed(
        &self,
        file_id: &str,
        actual_file_size: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<FileRecord>, StoreError> {
        // UpdateItem upserts, so without the condition a confirm racing a
        // delete would recreate a partial record.
        let result = self
            .dynamodb
            .update_item()
            .table_name(&self.table_name)
            .key("fileId", Self::key(file_id))
            .update_expression(
                "SET #status = :completed, actualFileSize = :size, completedTimestamp = :timestamp",
            )
            .condition_expression("attribute_exists(fileId)")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(
                ":completed",
                AttributeValue::S(FileStatus::Completed.as_str().to_string()),
            )
            .expression_attribute_values(":size", AttributeValue::N(actual_file_size.to_string()))
            .expression_attribute_values(":timestamp", AttributeValue::S(format_timestamp(&completed_at)))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => output.attributes().map(from_item).transpose(),
            Err(SdkError::ServiceError(err)) if err.err().is_conditional_check_failed_exception() => {
                Ok(None)
            }
            Err(err) => Err(StoreError::dynamodb(err)),
        }
    }

    async fn list_completed(&self) -> Result<Vec<FileRecord>, StoreError> {
        let mut records = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .dynamodb
                .scan()
                .table_name(&self.table_name)
                .filter_expression("#status = :completed")
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(
                    ":completed",
                    AttributeValue::S(FileStatus::Completed.as_str().to_string()),
                )
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(StoreError::dynamodb)?;

            for item in output.items() {
                records.push(from_item(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        self.dynamodb
            .delete_item()
            .table_name(&self.table_name)
            .key("fileId", Self::key(file_id))
            .send()
            .await
            .map_err(StoreError::dynamodb)?;
        Ok(())
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_item(record: &FileRecord) -> Item {
    let mut item = HashMap::new();
    item.insert("fileId".to_string(), AttributeValue::S(record.file_id.clone()));
    item.insert("fileName".to_string(), AttributeValue::S(record.file_name.clone()));
    item.insert("fileSize".to_string(), AttributeValue::N(record.file_size.to_string()));
    item.insert("contentType".to_string(), AttributeValue::S(record.content_type.clone()));
    item.insert("description".to_string(), AttributeValue::S(record.description.clone()));
    item.insert(
        "status".to_string(),
        AttributeValue::S(record.status.as_str().to_string()),
    );
    item.insert(
        "uploadTimestamp".to_string(),
        AttributeValue::S(format_timestamp(&record.upload_timestamp)),
    );
    if let Some(size) = record.actual_file_size {
        item.insert("actualFileSize".to_string(), AttributeValue::N(size.to_string()));
    }
    if let Some(completed) = &record.completed_timestamp {
        item.insert(
            "completedTimestamp".to_string(),
            AttributeValue::S(format_timestamp(completed)),
        );
    }
    item
}

fn from_item(item: &Item) -> Result<FileRecord, StoreError> {
    let status = required_string(item, "status")?;
    let status = FileStatus::parse(&status)
        .ok_or_else(|| StoreError::MalformedItem(format!("unknown status {:?}", status)))?;

    Ok(FileRecord {
        file_id: required_string(item, "fileId")?,
        file_name: required_string(item, "fileName")?,
        file_size: required_number(item, "fileSize")?,
        content_type: required_string(item, "contentType")?,
        description: optional_string(item, "description")?.unwrap_or_default(),
        status,
        upload_timestamp: parse_timestamp("uploadTimestamp", &required_string(item, "uploadTimestamp")?)?,
        actual_file_size: optional_number(item, "actualFileSize")?,
        completed_timestamp: optional_string(item, "completedTimestamp")?
            .map(|raw| parse_timestamp("completedTimestamp", &raw))
            .transpose()?,
    })
}

fn optional_string(item: &Item, name: &str) -> Result<Option<String>, StoreError> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(StoreError::MalformedItem(format!("{} is not a string", name))),
    }
}

fn required_string(item: &Item, name: &str) -> Result<String, StoreError> {
    optional_string(item, name)?.ok_or_else(|| StoreError::MalformedItem(format!("missing {}", name)))
}

fn optional_number(item: &Item, name: &str) -> Result<Option<u64>, StoreError> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::N(value)) => value
            .parse()
            .map(Some)
            .map_err(|_| StoreError::MalformedItem(format!("{} is not an unsigned integer: {}", name, value))),
        Some(_) => Err(StoreError::MalformedItem(format!("{} is not a number", name))),
    }
}

fn required_number(item: &Item, name: &str) -> Result<u64, StoreError> {
    optional_number(item, name)?.ok_or_else(|| StoreError::MalformedItem(format!("missing {}", name)))
}

fn parse_timestamp(name: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::MalformedItem(format!("{} {:?}: {}", name, raw, e)))
}
