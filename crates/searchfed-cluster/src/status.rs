use std::sync::Arc;

use futures::future::join_all;
use searchfed_core::config::ClusterSettings;
use searchfed_core::types::{ClusterStatus, NodeState, NodeStatus};

use crate::pool::Endpoint;
use crate::probe::{HealthProbe, HttpProbe, ProbeOutcome};

/// Probes every configured node, independently of query execution.
pub struct ClusterStatusReporter {
    endpoints: Vec<Endpoint>,
    probe: Arc<dyn HealthProbe>,
}

impl ClusterStatusReporter {
    pub fn new(endpoints: Vec<Endpoint>, probe: Arc<dyn HealthProbe>) -> Self {
        Self { endpoints, probe }
    }

    /// Reporter over `endpoints` with its own probe bounded by
    /// `cluster.status_timeout_ms`.
    pub fn from_settings(endpoints: Vec<Endpoint>, settings: &ClusterSettings, client: reqwest::Client) -> Self {
        let probe = HttpProbe::new(client, &settings.ping_path, settings.status_timeout());
        Self::new(endpoints, Arc::new(probe))
    }

    /// All nodes are probed concurrently; a slow node costs at most its own
    /// timeout. Entries are keyed `node_<n>` in pool order.
    pub async fn status(&self) -> ClusterStatus {
        let probes = self.endpoints.iter().map(|endpoint| async move { (endpoint, self.probe.probe(endpoint).await) });
        join_all(probes)
            .await
            .into_iter()
            .map(|(endpoint, outcome)| (endpoint.label(), node_status(endpoint, outcome)))
            .collect()
    }
}

fn node_status(endpoint: &Endpoint, outcome: ProbeOutcome) -> NodeStatus {
    match outcome {
        ProbeOutcome::Up { elapsed } => NodeStatus {
            url: endpoint.url.clone(),
            status: NodeState::Active,
            response_time: Some(elapsed.as_secs_f64()),
            error: None,
        },
        ProbeOutcome::Down { status, elapsed } => NodeStatus {
            url: endpoint.url.clone(),
            status: NodeState::Inactive,
            response_time: Some(elapsed.as_secs_f64()),
            error: Some(format!("health check returned HTTP {}", status)),
        },
        ProbeOutcome::Unreachable { error } => {
            tracing::warn!(node = %endpoint.url, %error, "node unreachable");
            NodeStatus { url: endpoint.url.clone(), status: NodeState::Error, response_time: None, error: Some(error) }
        }
    }
}
