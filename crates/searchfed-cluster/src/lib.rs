//! searchfed-cluster
//!
//! The backend node pool: ordered endpoints, liveness probing with
//! round-robin failover, and the per-node cluster status report.
pub mod pool;
pub mod probe;
pub mod status;

pub use pool::{Endpoint, NodePool};
pub use probe::{HealthProbe, HttpProbe, ProbeOutcome};
pub use status::ClusterStatusReporter;
