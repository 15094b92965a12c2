use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use searchfed_cluster::{Endpoint, NodePool};

use crate::error::AttemptError;

/// How one federated call ended.
#[derive(Debug)]
pub enum Outcome<T> {
    Success { value: T, endpoint: Endpoint, attempts: usize },
    /// Every node in the pool was tried once and failed.
    Exhausted { attempts: usize },
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn attempts(&self) -> usize {
        match self {
            Outcome::Success { attempts, .. } | Outcome::Exhausted { attempts } => *attempts,
            Outcome::Cancelled => 0,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Runs one request against the pool: a live node is picked, and on
/// failure the next node in pool order is tried, at most once per node.
pub struct RetryController {
    pool: Arc<NodePool>,
}

impl RetryController {
    pub fn new(pool: Arc<NodePool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    pub async fn execute<T, F, Fut>(&self, cancel: &CancellationToken, mut attempt: F) -> Outcome<T>
    where
        F: FnMut(Endpoint) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let budget = self.pool.len();
        let mut endpoint = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            picked = self.pool.pick_live_endpoint() => picked,
        };

        for attempts in 1..=budget {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AttemptError::Cancelled),
                result = attempt(endpoint.clone()) => result,
            };
            match result {
                Ok(value) => return Outcome::Success { value, endpoint, attempts },
                Err(AttemptError::Cancelled) => return Outcome::Cancelled,
                Err(error) => {
                    tracing::warn!(node = %endpoint.url, attempt = attempts, of = budget, %error, "attempt failed");
                    if attempts < budget {
                        endpoint = self.pool.next_after(endpoint.position);
                    }
                }
            }
        }
        tracing::info!(attempts = budget, "every node failed, returning empty result");
        Outcome::Exhausted { attempts: budget }
    }
}
