use crate::domain::model::{PersistedRecord, RangeSet, ServiceRegionKey};
use crate::domain::ports::RangeRepository;
use crate::utils::error::{Result, WatchError};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;

const REGION_ATTR: &str = "region";
const SERVICE_ATTR: &str = "service";
const IPS_ATTR: &str = "ips";
const LAST_MODIFIED_ATTR: &str = "lastModified";

/// DynamoDB table keyed by `region` (S) and `service` (S), holding `ips` (SS)
/// and `lastModified` (S, RFC 3339).
#[derive(Debug, Clone)]
pub struct DynamoRepository {
    client: DynamoClient,
    table_name: String,
}

impl DynamoRepository {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key_attributes(key: &ServiceRegionKey) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (REGION_ATTR.to_string(), AttributeValue::S(key.region.clone())),
            (SERVICE_ATTR.to_string(), AttributeValue::S(key.service.clone())),
        ])
    }
}

/// Decodes a stored item. An item without `ips` holds an empty set, since
/// DynamoDB cannot store an empty string set.
pub(crate) fn record_from_item(item: &HashMap<String, AttributeValue>) -> PersistedRecord {
    let ranges = item
        .get(IPS_ATTR)
        .and_then(|v| v.as_ss().ok())
        .map(|ips| RangeSet::canonical(ips.iter().cloned()))
        .unwrap_or_default();

    let last_modified = item
        .get(LAST_MODIFIED_ATTR)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    PersistedRecord { ranges, last_modified }
}

pub(crate) fn update_expression(ranges: &RangeSet) -> &'static str {
    if ranges.is_empty() {
        "SET #lastModified = :lastModified REMOVE #ips"
    } else {
        "SET #ips = :ips, #lastModified = :lastModified"
    }
}

impl RangeRepository for DynamoRepository {
    async fn read(&self, key: &ServiceRegionKey) -> Result<Option<PersistedRecord>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key_attributes(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch records from DynamoDB for {}", key);
                WatchError::RepositoryRead {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        tracing::debug!("Got DynamoDB response for {}: {:?}", key, output.item());
        Ok(output.item().map(record_from_item))
    }

    async fn write(&self, key: &ServiceRegionKey, ranges: &RangeSet, last_modified: DateTime<Utc>) -> Result<()> {
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key_attributes(key)))
            .update_expression(update_expression(ranges))
            .expression_attribute_names("#ips", IPS_ATTR)
            .expression_attribute_names("#lastModified", LAST_MODIFIED_ATTR)
            .expression_attribute_values(
                ":lastModified",
                AttributeValue::S(last_modified.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );

        if !ranges.is_empty() {
            request = request.expression_attribute_values(":ips", AttributeValue::Ss(ranges.as_slice().to_vec()));
        }

        request.send().await.map_err(|e| {
            tracing::error!("Failed to update IP addresses in DynamoDB for {}", key);
            WatchError::RepositoryWrite {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::config::retry::RetryConfig;
    use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
    use chrono::TimeZone;
    use httpmock::prelude::*;

    const GET_ITEM: &str = "DynamoDB_20120810.GetItem";
    const UPDATE_ITEM: &str = "DynamoDB_20120810.UpdateItem";

    fn repository(server: &MockServer) -> DynamoRepository {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .endpoint_url(server.base_url())
            .build();
        DynamoRepository::new(DynamoClient::from_conf(config), "ip-ranges")
    }

    fn key() -> ServiceRegionKey {
        ServiceRegionKey::new("us-east-1", "S3")
    }

    fn without_ips_value(req: &HttpMockRequest) -> bool {
        req.body
            .as_ref()
            .map(|body| !String::from_utf8_lossy(body).contains("\":ips\""))
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_write_sends_sorted_string_set() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/")
                .header("x-amz-target", UPDATE_ITEM)
                .body_contains(r#""TableName":"ip-ranges""#)
                .body_contains(r#""region":{"S":"us-east-1"}"#)
                .body_contains(r#""UpdateExpression":"SET #ips = :ips, #lastModified = :lastModified""#)
                .body_contains(r#"":ips":{"SS":["10.0.0.0/8","20.0.0.0/8"]}"#)
                .body_contains(r#"{"S":"2019-08-01T10:00:00.000Z"}"#);
            then.status(200)
                .header("Content-Type", "application/x-amz-json-1.0")
                .body("{}");
        });

        let when = Utc.with_ymd_and_hms(2019, 8, 1, 10, 0, 0).unwrap();
        repository(&server)
            .write(&key(), &RangeSet::canonical(["20.0.0.0/8", "10.0.0.0/8"]), when)
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_write_empty_set_removes_ips_attribute() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/")
                .header("x-amz-target", UPDATE_ITEM)
                .body_contains(r#""UpdateExpression":"SET #lastModified = :lastModified REMOVE #ips""#)
                .matches(without_ips_value);
            then.status(200)
                .header("Content-Type", "application/x-amz-json-1.0")
                .body("{}");
        });

        repository(&server)
            .write(&key(), &RangeSet::empty(), Utc::now())
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_read_item_without_ips_is_empty_set() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/")
                .header("x-amz-target", GET_ITEM)
                .body_contains(r#""ConsistentRead":true"#);
            then.status(200)
                .header("Content-Type", "application/x-amz-json-1.0")
                .body(
                    r#"{"Item":{"region":{"S":"us-east-1"},"service":{"S":"S3"},"lastModified":{"S":"2019-08-01T10:00:00.000Z"}}}"#,
                );
        });

        let record = repository(&server).read(&key()).await.unwrap().unwrap();

        mock.assert();
        assert!(record.ranges.is_empty());
        assert_eq!(
            record.last_modified,
            Some(Utc.with_ymd_and_hms(2019, 8, 1, 10, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_read_missing_item_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/").header("x-amz-target", GET_ITEM);
            then.status(200)
                .header("Content-Type", "application/x-amz-json-1.0")
                .body("{}");
        });

        assert!(repository(&server).read(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_failure_is_repository_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/").header("x-amz-target", GET_ITEM);
            then.status(400)
                .header("Content-Type", "application/x-amz-json-1.0")
                .body(
                    r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found"}"#,
                );
        });

        let err = repository(&server).read(&key()).await.unwrap_err();
        assert!(matches!(err, WatchError::RepositoryRead { key, .. } if key == "us-east-1/S3"));
    }

    #[test]
    fn test_record_from_item_sorts_string_set() {
        let item = HashMap::from([
            (REGION_ATTR.to_string(), AttributeValue::S("us-east-1".to_string())),
            (SERVICE_ATTR.to_string(), AttributeValue::S("S3".to_string())),
            (
                IPS_ATTR.to_string(),
                AttributeValue::Ss(vec!["20.0.0.0/8".to_string(), "10.0.0.0/8".to_string()]),
            ),
            (
                LAST_MODIFIED_ATTR.to_string(),
                AttributeValue::S("2019-08-01T10:00:00.000Z".to_string()),
            ),
        ]);

        let record = record_from_item(&item);
        assert_eq!(record.ranges.as_slice(), &["10.0.0.0/8", "20.0.0.0/8"]);
        assert_eq!(
            record.last_modified.unwrap().to_rfc3339(),
            "2019-08-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_record_without_ips_is_empty() {
        let item = HashMap::from([(
            LAST_MODIFIED_ATTR.to_string(),
            AttributeValue::S("not a date".to_string()),
        )]);

        let record = record_from_item(&item);
        assert!(record.ranges.is_empty());
        assert!(record.last_modified.is_none());
    }

    #[test]
    fn test_update_expression_for_empty_set_removes_ips() {
        assert!(update_expression(&RangeSet::empty()).contains("REMOVE #ips"));
        assert!(update_expression(&RangeSet::canonical(["1.0.0.0/8"])).starts_with("SET #ips"));
    }
}
