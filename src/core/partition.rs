use crate::domain::model::{RangeSet, RawRangeDocument, ServiceRegionKey};

/// Canonical set of prefixes in `document` tagged with exactly `key`'s
/// region and service. Matching is case-sensitive.
pub fn partition(document: &RawRangeDocument, key: &ServiceRegionKey, include_ipv6: bool) -> RangeSet {
    let ipv4 = document
        .prefixes
        .iter()
        .filter(|p| p.region == key.region && p.service == key.service)
        .map(|p| p.ip_prefix.as_str());

    let ipv6 = document
        .ipv6_prefixes
        .iter()
        .filter(|_| include_ipv6)
        .filter(|p| p.region == key.region && p.service == key.service)
        .map(|p| p.ipv6_prefix.as_str());

    ipv4.chain(ipv6).collect()
}
