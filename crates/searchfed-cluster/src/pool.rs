use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use searchfed_core::config::ClusterSettings;
use searchfed_core::error::{Error, Result};
use searchfed_core::types::node_label;

use crate::probe::{HealthProbe, HttpProbe};

/// A backend node and its fixed position in the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub position: usize,
}

impl Endpoint {
    /// `<url>/<path>` with exactly one slash at the seam.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn label(&self) -> String {
        node_label(self.position)
    }
}

/// Fixed, ordered set of backend nodes with a shared rotation cursor.
///
/// The cursor is the only mutable state. It is an atomic index written by
/// both the liveness picker and the retry path, always with an in-range
/// position.
pub struct NodePool {
    endpoints: Vec<Endpoint>,
    cursor: AtomicUsize,
    probe: Arc<dyn HealthProbe>,
}

impl NodePool {
    pub fn new(urls: Vec<String>, probe: Arc<dyn HealthProbe>) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::InvalidConfig("node pool needs at least one endpoint".to_string()));
        }
        let mut endpoints = Vec::with_capacity(urls.len());
        for (position, url) in urls.into_iter().enumerate() {
            let url = url.trim().to_string();
            reqwest::Url::parse(&url).map_err(|e| Error::InvalidConfig(format!("node {} ({}) is not a valid URL: {}", position + 1, url, e)))?;
            endpoints.push(Endpoint { url, position });
        }
        Ok(Self { endpoints, cursor: AtomicUsize::new(0), probe })
    }

    pub fn from_settings(settings: &ClusterSettings, client: reqwest::Client) -> anyhow::Result<Self> {
        let probe = HttpProbe::new(client, &settings.ping_path, settings.probe_timeout());
        Ok(Self::new(settings.nodes.clone(), Arc::new(probe))?)
    }

    pub fn len(&self) -> usize { self.endpoints.len() }

    pub fn is_empty(&self) -> bool { self.endpoints.is_empty() }

    pub fn endpoints(&self) -> &[Endpoint] { &self.endpoints }

    /// Position the next `pick_live_endpoint` call starts probing from.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire) % self.endpoints.len()
    }

    /// Probe nodes in pool order starting at the cursor and return the first
    /// live one, leaving the cursor just past it. After a full pass with no
    /// live node the first configured endpoint is returned anyway and the
    /// cursor is put back where it was.
    ///
    /// The start slot is reserved atomically, so concurrent callers begin
    /// their passes on different nodes.
    pub async fn pick_live_endpoint(&self) -> Endpoint {
        let n = self.endpoints.len();
        let start = self.reserve_start(n);
        let reserved = (start + 1) % n;
        for offset in 0..n {
            let endpoint = &self.endpoints[(start + offset) % n];
            let outcome = self.probe.probe(endpoint).await;
            if outcome.is_up() {
                if offset > 0 {
                    // Only move the cursor if no other caller has since.
                    let _ = self.cursor.compare_exchange(reserved, (endpoint.position + 1) % n, Ordering::AcqRel, Ordering::Acquire);
                }
                return endpoint.clone();
            }
            tracing::warn!(node = %endpoint.url, ?outcome, "node failed health probe, trying next");
        }
        let _ = self.cursor.compare_exchange(reserved, start, Ordering::AcqRel, Ordering::Acquire);
        tracing::warn!(nodes = n, "no live node after a full pass, falling back to the first endpoint");
        self.endpoints[0].clone()
    }

    /// Advance the cursor by one and return the slot it pointed at.
    fn reserve_start(&self, n: usize) -> usize {
        match self.cursor.fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c % n + 1) % n)) {
            Ok(prev) | Err(prev) => prev % n,
        }
    }

    /// The endpoint after `position` (wrapping); the cursor moves past it.
    pub fn next_after(&self, position: usize) -> Endpoint {
        let n = self.endpoints.len();
        let next = (position + 1) % n;
        self.cursor.store((next + 1) % n, Ordering::Release);
        self.endpoints[next].clone()
    }
}
