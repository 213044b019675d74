use async_trait::async_trait;
use ip_range_watch::domain::ports::Sender;
use ip_range_watch::{ChangeEvent, Result};
use std::sync::{Arc, Mutex};

/// Sender that records every event it sees.
#[derive(Clone, Default)]
pub struct RecordingSender {
    pub events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl RecordingSender {
    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl Sender for RecordingSender {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, event: &ChangeEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn range_document(prefixes: &[(&str, &str, &str)]) -> serde_json::Value {
    let prefixes: Vec<serde_json::Value> = prefixes
        .iter()
        .map(|(ip, region, service)| {
            serde_json::json!({
                "ip_prefix": ip,
                "region": region,
                "service": service,
                "network_border_group": region
            })
        })
        .collect();

    serde_json::json!({
        "syncToken": "1700000000",
        "createDate": "2023-11-14-22-13-20",
        "prefixes": prefixes,
        "ipv6_prefixes": []
    })
}
