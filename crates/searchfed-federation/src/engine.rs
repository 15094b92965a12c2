use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use searchfed_cluster::{ClusterStatusReporter, NodePool};
use searchfed_core::config::Settings;
use searchfed_core::request::SearchRequest;
use searchfed_core::traits::Embedder;
use searchfed_core::types::{
    AutocompleteQuery, ClusterStatus, DslQuery, FacetSelections, FormattedResult, SemanticQuery, SimpleQuery, Suggestions,
};
use searchfed_query::{
    compile_conditions_with, compile_filters, compile_vector_query, sort_clause, CompileOptions, NativeQuery, Params,
};

use crate::controller::{Outcome, RetryController};
use crate::http::{get_json, post_form_json};
use crate::normalize::{normalize, RawResult};

/// Autocomplete queries shorter than this never reach a node.
const MIN_SUGGEST_CHARS: usize = 2;

/// What one request produces at the process boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Results(FormattedResult),
    Suggestions(Suggestions),
}

#[derive(Clone, Copy)]
enum Transport {
    Get,
    PostForm,
}

/// Federated search over a replicated index: every operation picks a live
/// node, fails over across the pool once, and answers with the normalized
/// contract even when every node is down.
pub struct FederatedSearchEngine {
    settings: Settings,
    client: reqwest::Client,
    controller: RetryController,
    reporter: ClusterStatusReporter,
    embedder: Option<Arc<dyn Embedder>>,
}

impl FederatedSearchEngine {
    pub fn from_settings(settings: Settings, embedder: Option<Arc<dyn Embedder>>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build().context("building HTTP client")?;
        let pool = Arc::new(NodePool::from_settings(&settings.cluster, client.clone())?);
        let reporter = ClusterStatusReporter::from_settings(pool.endpoints().to_vec(), &settings.cluster, client.clone());
        Ok(Self { controller: RetryController::new(pool), reporter, client, settings, embedder })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pool(&self) -> &NodePool {
        self.controller.pool()
    }

    pub async fn execute(&self, request: SearchRequest, cancel: &CancellationToken) -> Response {
        tracing::debug!(kind = request.kind(), "executing request");
        match request {
            SearchRequest::Simple(q) => Response::Results(self.simple_search(&q, cancel).await),
            SearchRequest::Dsl(q) => Response::Results(self.dsl_search(&q, cancel).await),
            SearchRequest::Semantic(q) => Response::Results(self.semantic_search(&q, cancel).await),
            SearchRequest::Autocomplete(q) => Response::Suggestions(self.autocomplete(&q, cancel).await),
        }
    }

    /// Free-text query in backend syntax, with optional sort clause and
    /// facet filters.
    pub async fn simple_search(&self, query: &SimpleQuery, cancel: &CancellationToken) -> FormattedResult {
        let native = NativeQuery::Text(query.query.clone());
        let params = Params::select(&native, query.start, query.rows, &self.settings.search)
            .with_sort(query.sort.as_deref())
            .with_filters(&filters(query.facets.as_ref()));
        self.run_select(params, Transport::Get, cancel).await
    }

    pub async fn dsl_search(&self, query: &DslQuery, cancel: &CancellationToken) -> FormattedResult {
        let options = CompileOptions { escape_contains: self.settings.search.escape_contains };
        let compiled = compile_conditions_with(&query.conditions, options);
        tracing::debug!(q = %compiled.query, dropped = compiled.dropped.len(), "compiled DSL query");
        let sort = query.sort.as_ref().and_then(sort_clause);
        let params = Params::select(&NativeQuery::Text(compiled.query), query.start, query.rows, &self.settings.search)
            .with_sort(sort.as_deref())
            .with_filters(&filters(query.facets.as_ref()))
            .with_boost(&query.boost);
        self.run_select(params, Transport::Get, cancel).await
    }

    /// Nearest-neighbour search over the embedded query text. Without a
    /// usable vector the backend is never queried.
    pub async fn semantic_search(&self, query: &SemanticQuery, cancel: &CancellationToken) -> FormattedResult {
        let Some(vector) = self.embed_query(&query.query, cancel).await else {
            if cancel.is_cancelled() {
                return FormattedResult::empty(ClusterStatus::new());
            }
            return FormattedResult::empty(self.cluster_status(cancel).await);
        };
        let native = compile_vector_query(&vector, query.rows, &self.settings.vector);
        let params = Params::select(&native, query.start, query.rows, &self.settings.search).with_filters(&filters(query.facets.as_ref()));
        self.run_select(params, Transport::PostForm, cancel).await
    }

    pub async fn autocomplete(&self, query: &AutocompleteQuery, cancel: &CancellationToken) -> Suggestions {
        let text = query.query.trim();
        if text.chars().count() < MIN_SUGGEST_CHARS {
            return Suggestions::default();
        }
        let search = &self.settings.search;
        let params = Params::suggest(text, query.limit, search);
        let (client, params) = (&self.client, &params);
        let outcome = self
            .controller
            .execute(cancel, move |endpoint| {
                let url = endpoint.url_for(&search.suggest_path);
                async move { get_json(client, &url, params, search.suggest_timeout()).await }
            })
            .await;
        match outcome {
            Outcome::Success { value, .. } => Suggestions { suggestions: suggestion_terms(&value, &search.suggest_dictionary, text) },
            _ => Suggestions::default(),
        }
    }

    /// Fresh per-node health snapshot; empty once `cancel` fires.
    pub async fn cluster_status(&self, cancel: &CancellationToken) -> ClusterStatus {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => ClusterStatus::new(),
            status = self.reporter.status() => status,
        }
    }

    async fn run_select(&self, params: Params, transport: Transport, cancel: &CancellationToken) -> FormattedResult {
        let search = &self.settings.search;
        let (client, params) = (&self.client, &params);
        let outcome = self
            .controller
            .execute(cancel, move |endpoint| {
                let url = endpoint.url_for(&search.select_path);
                async move {
                    match transport {
                        Transport::Get => get_json(client, &url, params, search.search_timeout()).await,
                        Transport::PostForm => post_form_json(client, &url, params, search.search_timeout()).await,
                    }
                }
            })
            .await;
        match outcome {
            Outcome::Success { value, endpoint, attempts } => {
                tracing::debug!(node = %endpoint.url, attempts, "select succeeded");
                let raw = RawResult::from_json(&value);
                normalize(&raw, search.body_max_chars, self.cluster_status(cancel).await)
            }
            Outcome::Exhausted { .. } => FormattedResult::empty(self.cluster_status(cancel).await),
            Outcome::Cancelled => FormattedResult::empty(ClusterStatus::new()),
        }
    }

    async fn embed_query(&self, text: &str, cancel: &CancellationToken) -> Option<Vec<f32>> {
        if text.trim().is_empty() {
            return None;
        }
        let Some(embedder) = self.embedder.clone() else {
            tracing::warn!("semantic search requested but no embedder is loaded");
            return None;
        };
        let text = text.to_string();
        let job = tokio::task::spawn_blocking(move || embedder.embed(&text));
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            joined = job => joined,
        };
        match joined {
            Ok(Ok(vector)) if !vector.is_empty() => Some(vector),
            Ok(Ok(_)) => {
                tracing::warn!("embedder returned an empty vector");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "query embedding failed");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "embedding task panicked");
                None
            }
        }
    }
}

fn filters(facets: Option<&FacetSelections>) -> Vec<String> {
    facets.map(compile_filters).unwrap_or_default()
}

/// `suggest.<dictionary>.<query>.suggestions[].term`. If the backend keyed
/// the entry differently, the dictionary's first entry is used.
fn suggestion_terms(body: &Value, dictionary: &str, query: &str) -> Vec<String> {
    let Some(entries) = body.get("suggest").and_then(|s| s.get(dictionary)).and_then(Value::as_object) else {
        return Vec::new();
    };
    let entry = entries.get(query).or_else(|| entries.values().next());
    entry
        .and_then(|e| e.get("suggestions"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|s| s.get("term").and_then(Value::as_str)).map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn suggestion_terms_by_query_key() {
        let body = json!({"suggest": {"mySuggester": {"sol": {"numFound": 2, "suggestions": [{"term": "solr"}, {"term": "solar"}]}}}});
        assert_eq!(suggestion_terms(&body, "mySuggester", "sol"), vec!["solr", "solar"]);
        assert_eq!(suggestion_terms(&body, "mySuggester", "SOL"), vec!["solr", "solar"]);
        assert!(suggestion_terms(&body, "other", "sol").is_empty());
        assert!(suggestion_terms(&json!({}), "mySuggester", "sol").is_empty());
    }

    #[test]
    fn response_serializes_untagged() {
        let v = serde_json::to_value(Response::Suggestions(Suggestions { suggestions: vec!["a".into()] })).unwrap();
        assert_eq!(v, json!({"suggestions": ["a"]}));
    }
}
