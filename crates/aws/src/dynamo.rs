//! DynamoDB table truncation
//!
//! Scans only the key attributes of each item (minimizing data transfer)
//! and deletes them in batch-write chunks.

use std::collections::HashMap;

use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, WriteRequest};

use ab_core::{Error, Result};

/// Item limit imposed by the BatchWriteItem API.
const WRITE_BATCH_SIZE: usize = 25;

/// Delete every item from a table, returning the number of items deleted.
pub async fn truncate_table(config: &SdkConfig, table_name: &str) -> Result<u64> {
    let client = aws_sdk_dynamodb::Client::new(config);
    let description = client
        .describe_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("ResourceNotFound") {
                Error::NotFound(format!("Table not found: {table_name}"))
            } else {
                Error::Network(err_str)
            }
        })?;

    let key_names: Vec<String> = description
        .table()
        .map(|t| {
            t.key_schema()
                .iter()
                .map(|k| k.attribute_name().to_string())
                .collect()
        })
        .unwrap_or_default();

    if key_names.is_empty() {
        return Err(Error::General(format!(
            "table '{table_name}' has no key schema"
        )));
    }

    // Attribute names may collide with reserved words; alias every one.
    let projection = key_names
        .iter()
        .map(|k| format!("#{k}"))
        .collect::<Vec<_>>()
        .join(", ");
    let attribute_names: HashMap<String, String> = key_names
        .iter()
        .map(|k| (format!("#{k}"), k.clone()))
        .collect();

    let mut deleted: u64 = 0;
    let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

    loop {
        let mut request = client
            .scan()
            .table_name(table_name)
            .projection_expression(&projection)
            .set_expression_attribute_names(Some(attribute_names.clone()));

        if let Some(start_key) = exclusive_start_key.take() {
            request = request.set_exclusive_start_key(Some(start_key));
        }

        let page = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let items = page.items();
        deleted += items.len() as u64;

        for chunk in items.chunks(WRITE_BATCH_SIZE) {
            let writes: Vec<WriteRequest> = chunk
                .iter()
                .map(|item| {
                    let delete = DeleteRequest::builder()
                        .set_key(Some(item.clone()))
                        .build()
                        .map_err(|e| Error::General(e.to_string()))?;
                    Ok(WriteRequest::builder().delete_request(delete).build())
                })
                .collect::<Result<_>>()?;

            client
                .batch_write_item()
                .request_items(table_name, writes)
                .send()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;

            tracing::debug!(count = chunk.len(), "deleted item batch");
        }

        match page.last_evaluated_key() {
            Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
            _ => break,
        }
    }

    tracing::info!(table = table_name, deleted, "table truncated");
    Ok(deleted)
}
