use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::pool::Endpoint;

/// Result of one liveness check against one node.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Up { elapsed: Duration },
    /// The node answered, but not with a success status.
    Down { status: u16, elapsed: Duration },
    /// No answer: connection failure or timeout.
    Unreachable { error: String },
}

impl ProbeOutcome {
    pub fn is_up(&self) -> bool {
        matches!(self, ProbeOutcome::Up { .. })
    }
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Never fails; an unreachable node is an outcome, not an error.
    async fn probe(&self, endpoint: &Endpoint) -> ProbeOutcome;
}

/// `GET <node><ping_path>` bounded by `timeout`.
pub struct HttpProbe {
    client: reqwest::Client,
    ping_path: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, ping_path: &str, timeout: Duration) -> Self {
        Self { client, ping_path: ping_path.to_string(), timeout }
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let url = endpoint.url_for(&self.ping_path);
        let started = Instant::now();
        let request = self.client.get(&url).timeout(self.timeout).send();
        match tokio::time::timeout(self.timeout, request).await {
            Err(_) => ProbeOutcome::Unreachable { error: format!("health probe timed out after {}ms", self.timeout.as_millis()) },
            Ok(Err(e)) => ProbeOutcome::Unreachable { error: e.to_string() },
            Ok(Ok(response)) => {
                let elapsed = started.elapsed();
                let status = response.status();
                if status.is_success() {
                    ProbeOutcome::Up { elapsed }
                } else {
                    ProbeOutcome::Down { status: status.as_u16(), elapsed }
                }
            }
        }
    }
}
