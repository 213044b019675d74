use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A CIDR prefix such as `10.0.0.0/8`. Compared and ordered as a plain string.
pub type AddressRange = String;

/// One tracked partition of the range document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRegionKey {
    pub region: String,
    pub service: String,
}

impl ServiceRegionKey {
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }

    /// Regions outer, services inner, both in configured order. A pair listed
    /// more than once keeps its first position.
    pub fn cross_product(regions: &[String], services: &[String]) -> Vec<Self> {
        Self::unique(
            regions
                .iter()
                .flat_map(|region| services.iter().map(move |service| Self::new(region, service))),
        )
    }

    pub fn unique<I: IntoIterator<Item = Self>>(keys: I) -> Vec<Self> {
        let mut seen = HashSet::new();
        keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
    }
}

impl fmt::Display for ServiceRegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.service)
    }
}

/// Sorted, deduplicated list of address ranges.
///
/// The only way to build one is through [`RangeSet::canonical`] (or
/// `FromIterator`), so every instance is already in canonical form and two
/// sets can be compared element by element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RangeSet(Vec<AddressRange>);

impl RangeSet {
    pub fn canonical<I, S>(ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AddressRange>,
    {
        let mut ranges: Vec<AddressRange> = ranges.into_iter().map(Into::into).collect();
        ranges.sort();
        ranges.dedup();
        Self(ranges)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[AddressRange] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<AddressRange> {
        self.0
    }
}

impl<S: Into<AddressRange>> FromIterator<S> for RangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::canonical(iter)
    }
}

// 從儲存讀回的資料不一定排序過，反序列化時重新正規化
impl<'de> Deserialize<'de> for RangeSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let ranges = Vec::<AddressRange>::deserialize(deserializer)?;
        Ok(Self::canonical(ranges))
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Last-known state of one key in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub ranges: RangeSet,
    pub last_modified: Option<DateTime<Utc>>,
}

impl PersistedRecord {
    pub fn new(ranges: RangeSet, last_modified: DateTime<Utc>) -> Self {
        Self {
            ranges,
            last_modified: Some(last_modified),
        }
    }

    /// An absent record diffs as an empty set.
    pub fn ranges_or_empty(record: Option<Self>) -> RangeSet {
        record.map(|r| r.ranges).unwrap_or_default()
    }
}

/// An old -> new transition for one key. Only built by the diff engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    key: ServiceRegionKey,
    old_ranges: RangeSet,
    new_ranges: RangeSet,
}

impl ChangeEvent {
    pub(crate) fn new(key: ServiceRegionKey, old_ranges: RangeSet, new_ranges: RangeSet) -> Self {
        Self {
            key,
            old_ranges,
            new_ranges,
        }
    }

    pub fn key(&self) -> &ServiceRegionKey {
        &self.key
    }

    pub fn region(&self) -> &str {
        &self.key.region
    }

    pub fn service(&self) -> &str {
        &self.key.service
    }

    pub fn old_ranges(&self) -> &RangeSet {
        &self.old_ranges
    }

    pub fn new_ranges(&self) -> &RangeSet {
        &self.new_ranges
    }
}

/// IPv4 entry of `ip-ranges.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRecord {
    pub ip_prefix: String,
    pub region: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_border_group: Option<String>,
}

/// IPv6 entry of `ip-ranges.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6PrefixRecord {
    pub ipv6_prefix: String,
    pub region: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_border_group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRangeDocument {
    #[serde(rename = "syncToken", default)]
    pub sync_token: Option<String>,
    #[serde(rename = "createDate", default)]
    pub create_date: Option<String>,
    #[serde(default)]
    pub prefixes: Vec<PrefixRecord>,
    #[serde(default)]
    pub ipv6_prefixes: Vec<Ipv6PrefixRecord>,
}

/// Result of one full run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub evaluated: usize,
    pub changed_keys: Vec<ServiceRegionKey>,
}

impl RunSummary {
    pub fn changed(&self) -> usize {
        self.changed_keys.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.changed_keys.is_empty() {
            write!(
                f,
                "no relevant IP address range changes were found ({} pair(s) checked)",
                self.evaluated
            )
        } else {
            let keys: Vec<String> = self.changed_keys.iter().map(|k| k.to_string()).collect();
            write!(
                f,
                "sent {} IP address range change alert(s) out of {} pair(s): {}",
                self.changed_keys.len(),
                self.evaluated,
                keys.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form_ignores_order_and_duplicates() {
        let a = RangeSet::canonical(["20.0.0.0/8", "10.0.0.0/8", "20.0.0.0/8"]);
        let b = RangeSet::canonical(["10.0.0.0/8", "10.0.0.0/8", "20.0.0.0/8"]);
        let c: RangeSet = vec!["20.0.0.0/8", "10.0.0.0/8"].into_iter().collect();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.as_slice(), &["10.0.0.0/8", "20.0.0.0/8"]);
    }

    #[test]
    fn test_canonical_is_idempotent() {
        let once = RangeSet::canonical(["3.0.0.0/8", "1.0.0.0/8", "2.0.0.0/8", "1.0.0.0/8"]);
        let twice = RangeSet::canonical(once.clone().into_vec());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_range_set_deserialize_canonicalizes() {
        let set: RangeSet = serde_json::from_str(r#"["b", "a", "b"]"#).unwrap();
        assert_eq!(set.as_slice(), &["a", "b"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_absent_record_is_empty_set() {
        assert!(PersistedRecord::ranges_or_empty(None).is_empty());

        let record = PersistedRecord::new(RangeSet::canonical(["1.2.3.0/24"]), Utc::now());
        assert_eq!(PersistedRecord::ranges_or_empty(Some(record)).len(), 1);
    }

    #[test]
    fn test_cross_product_skips_repeated_pairs() {
        let keys = ServiceRegionKey::cross_product(
            &["us-east-1".to_string(), "eu-west-1".to_string(), "us-east-1".to_string()],
            &["S3".to_string(), "S3".to_string()],
        );

        assert_eq!(
            keys,
            vec![
                ServiceRegionKey::new("us-east-1", "S3"),
                ServiceRegionKey::new("eu-west-1", "S3"),
            ]
        );
    }

    #[test]
    fn test_cross_product_order() {
        let keys = ServiceRegionKey::cross_product(
            &["us-east-1".to_string(), "eu-west-1".to_string()],
            &["S3".to_string(), "EC2".to_string()],
        );

        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["us-east-1/S3", "us-east-1/EC2", "eu-west-1/S3", "eu-west-1/EC2"]
        );
    }

    #[test]
    fn test_raw_document_parses_aws_shape() {
        let json = r#"{
            "syncToken": "1700000000",
            "createDate": "2023-11-14-22-13-20",
            "prefixes": [
                {"ip_prefix": "3.5.140.0/22", "region": "ap-northeast-2", "service": "AMAZON", "network_border_group": "ap-northeast-2"}
            ],
            "ipv6_prefixes": [
                {"ipv6_prefix": "2600:1f14::/35", "region": "us-west-2", "service": "EC2", "network_border_group": "us-west-2"}
            ]
        }"#;

        let doc: RawRangeDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.sync_token.as_deref(), Some("1700000000"));
        assert_eq!(doc.prefixes.len(), 1);
        assert_eq!(doc.ipv6_prefixes[0].ipv6_prefix, "2600:1f14::/35");
    }

    #[test]
    fn test_run_summary_display() {
        let empty = RunSummary {
            evaluated: 2,
            changed_keys: vec![],
        };
        assert!(empty.to_string().contains("no relevant"));

        let changed = RunSummary {
            evaluated: 2,
            changed_keys: vec![ServiceRegionKey::new("eu-west-1", "EC2")],
        };
        assert_eq!(changed.changed(), 1);
        assert!(changed.to_string().contains("eu-west-1/EC2"));
    }
}
