//! Route 53 hosted zone export/import
//!
//! Record sets cross the process boundary as a typed JSON model rather
//! than raw SDK shapes, so exported files are stable and hand-editable.

use aws_config::SdkConfig;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use serde::{Deserialize, Serialize};

use ab_core::{Error, Result};

/// One resource record set in a zone file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully qualified record name
    pub name: String,
    /// Record type (A, CNAME, TXT, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time to live in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    /// Record values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl RecordSet {
    /// Zone-owned records are managed by Route 53 and never imported.
    pub fn is_importable(&self) -> bool {
        self.record_type != "NS" && self.record_type != "SOA"
    }
}

/// Export all resource record sets from a hosted zone
pub async fn export_record_sets(
    config: &SdkConfig,
    hosted_zone_id: &str,
) -> Result<Vec<RecordSet>> {
    let client = aws_sdk_route53::Client::new(config);
    let mut records = Vec::new();

    // ListResourceRecordSets paginates with name/type start markers, which
    // the SDK does not generate a paginator for.
    let mut start_record_name: Option<String> = None;
    let mut start_record_type: Option<RrType> = None;

    loop {
        let mut request = client
            .list_resource_record_sets()
            .hosted_zone_id(hosted_zone_id);
        if let Some(name) = start_record_name.take() {
            request = request.start_record_name(name);
        }
        if let Some(record_type) = start_record_type.take() {
            request = request.start_record_type(record_type);
        }

        let page = request.send().await.map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("NoSuchHostedZone") {
                Error::NotFound(format!("Hosted zone not found: {hosted_zone_id}"))
            } else {
                Error::Network(err_str)
            }
        })?;

        for record_set in page.resource_record_sets() {
            records.push(RecordSet {
                name: record_set.name().to_string(),
                record_type: record_set.r#type().as_str().to_string(),
                ttl: record_set.ttl(),
                values: record_set
                    .resource_records()
                    .iter()
                    .map(|r| r.value().to_string())
                    .collect(),
            });
        }

        if !page.is_truncated() {
            break;
        }
        start_record_name = page.next_record_name().map(str::to_string);
        start_record_type = page.next_record_type().cloned();
        if start_record_name.is_none() {
            break;
        }
    }

    Ok(records)
}

/// Upsert record sets into a hosted zone, skipping NS and SOA records.
///
/// Returns the number of records imported.
pub async fn import_record_sets(
    config: &SdkConfig,
    hosted_zone_id: &str,
    records: &[RecordSet],
) -> Result<usize> {
    let client = aws_sdk_route53::Client::new(config);
    tracing::info!(
        zone = hosted_zone_id,
        count = records.len(),
        "importing records"
    );

    let mut imported = 0;

    for record in records {
        if !record.is_importable() {
            tracing::debug!(name = %record.name, kind = %record.record_type, "skipping zone-owned record");
            continue;
        }

        let values = record
            .values
            .iter()
            .map(|value| {
                ResourceRecord::builder()
                    .value(value)
                    .build()
                    .map_err(|e| Error::General(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut record_set = ResourceRecordSet::builder()
            .name(&record.name)
            .r#type(RrType::from(record.record_type.as_str()))
            .set_resource_records(Some(values));
        if let Some(ttl) = record.ttl {
            record_set = record_set.ttl(ttl);
        }
        let record_set = record_set
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let change = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(record_set)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let batch = ChangeBatch::builder()
            .changes(change)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        client
            .change_resource_record_sets()
            .hosted_zone_id(hosted_zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        imported += 1;
    }

    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_type: &str) -> RecordSet {
        RecordSet {
            name: "example.com.".into(),
            record_type: record_type.into(),
            ttl: Some(300),
            values: vec!["192.0.2.1".into()],
        }
    }

    #[test]
    fn test_zone_owned_records_are_not_importable() {
        assert!(!record("NS").is_importable());
        assert!(!record("SOA").is_importable());
        assert!(record("A").is_importable());
        assert!(record("CNAME").is_importable());
    }

    #[test]
    fn test_record_set_json_shape() {
        let json = serde_json::to_value(record("A")).unwrap();
        assert_eq!(json["type"], "A");
        assert_eq!(json["ttl"], 300);
        assert_eq!(json["values"][0], "192.0.2.1");

        let parsed: RecordSet = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record("A"));
    }

    #[test]
    fn test_record_set_parses_without_optional_fields() {
        let parsed: RecordSet =
            serde_json::from_str(r#"{"name":"example.com.","type":"TXT"}"#).unwrap();
        assert!(parsed.ttl.is_none());
        assert!(parsed.values.is_empty());
    }
}
