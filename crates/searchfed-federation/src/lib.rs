//! searchfed-federation
//!
//! The query federation engine: bounded retry across the node pool,
//! request transport, and normalization of backend payloads into the
//! caller-facing result contract.
pub mod controller;
pub mod engine;
pub mod error;
pub mod http;
pub mod normalize;

pub use controller::{Outcome, RetryController};
pub use engine::{FederatedSearchEngine, Response};
pub use error::AttemptError;
pub use normalize::{normalize, pair_facets, truncate_body, FieldValue, RawResult};
