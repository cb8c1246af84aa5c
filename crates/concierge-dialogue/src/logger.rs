//! Best-effort reporting of (selection, response) pairs.
//!
//! Recording never blocks the conversation and never fails from the
//! caller's point of view: one attempt, errors are logged and dropped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use concierge_core::InteractionRecord;
use tracing::{debug, warn};

pub trait InteractionLog: Send + Sync {
    fn record(&self, record: InteractionRecord);
}

/// `POST {base}/log_interaction`; the response body is ignored.
pub struct HttpInteractionLog {
    client: reqwest::Client,
    url: Arc<str>,
}

impl HttpInteractionLog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/log_interaction", base_url.trim_end_matches('/')).into(),
        }
    }
}

impl InteractionLog for HttpInteractionLog {
    fn record(&self, record: InteractionRecord) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, dropping interaction record");
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        runtime.spawn(async move {
            match client.post(&*url).json(&record).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(user_id = %record.user_id, "Interaction logged");
                }
                Ok(response) => {
                    debug!(status = response.status().as_u16(), "Interaction log rejected");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to log interaction");
                }
            }
        });
    }
}

/// Discards every record.
pub struct NoopInteractionLog;

impl InteractionLog for NoopInteractionLog {
    fn record(&self, _record: InteractionRecord) {}
}

/// Keeps records in memory.
#[derive(Default)]
pub struct MemoryInteractionLog {
    records: Mutex<Vec<InteractionRecord>>,
}

impl MemoryInteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<InteractionRecord> {
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl InteractionLog for MemoryInteractionLog {
    fn record(&self, record: InteractionRecord) {
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::{Language, SessionId};

    fn record() -> InteractionRecord {
        InteractionRecord {
            selection: "Programs".to_string(),
            response: "Please select a program:".to_string(),
            language: Language::En,
            user_id: SessionId("user_1".to_string()),
        }
    }

    #[test]
    fn test_memory_log_keeps_order() {
        let log = MemoryInteractionLog::new();
        log.record(record());
        let mut second = record();
        second.selection = "Yes".to_string();
        log.record(second);

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].selection, "Yes");
    }

    #[test]
    fn test_http_log_without_runtime_does_not_panic() {
        let log = HttpInteractionLog::with_client(reqwest::Client::new(), "http://127.0.0.1:9");
        log.record(record());
    }

    #[test]
    fn test_url_joins_base() {
        let log = HttpInteractionLog::with_client(reqwest::Client::new(), "http://host/api/");
        assert_eq!(&*log.url, "http://host/api/log_interaction");
    }

    #[test]
    fn test_noop_log() {
        NoopInteractionLog.record(record());
    }
}
