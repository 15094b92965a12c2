//! Request and response types shared by the compiler, the cluster layer and
//! the federation engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison applied by a DSL condition.
///
/// Unrecognised operator names deserialize into `Other` instead of failing,
/// so the compiler can drop them quietly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Contains,
    Exact,
    StartsWith,
    EndsWith,
    Range,
    Other(String),
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "contains" => Operator::Contains,
            "exact" => Operator::Exact,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "range" => Operator::Range,
            _ => Operator::Other(s),
        }
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Other(String::new())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Contains => "contains",
            Operator::Exact => "exact",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::Range => "range",
            Operator::Other(s) => s,
        }
    }
}

/// A condition value: a string, a list, or any other JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Text(String),
    List(Vec<Value>),
    Scalar(Value),
}

impl Default for ConditionValue {
    fn default() -> Self {
        ConditionValue::Scalar(Value::Null)
    }
}

impl ConditionValue {
    /// Collapse to a single string; lists are space-joined, `null` is empty.
    pub fn to_text(&self) -> String {
        match self {
            ConditionValue::Text(s) => s.clone(),
            ConditionValue::List(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(" "),
            ConditionValue::Scalar(v) => scalar_text(v),
        }
    }
}

/// Plain text for a JSON scalar: strings unquoted, `null` empty.
pub fn scalar_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| scalar_text(&v))
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        ConditionValue::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "lenient_text")]
    pub field: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(field: &str, operator: Operator, value: impl Into<ConditionValue>) -> Self {
        Self { field: field.to_string(), operator, value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "desc".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boost {
    pub field: String,
    pub factor: f64,
}

/// Selected facet values per field. Values are kept as raw JSON; only
/// non-empty arrays produce filters.
pub type FacetSelections = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DslQuery {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub sort: Option<Sort>,
    #[serde(default)]
    pub boost: Vec<Boost>,
    #[serde(default)]
    pub facets: Option<FacetSelections>,
    #[serde(default)]
    pub start: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
}

pub(crate) fn default_rows() -> usize {
    10
}

impl Default for DslQuery {
    fn default() -> Self {
        Self { conditions: Vec::new(), sort: None, boost: Vec::new(), facets: None, start: 0, rows: default_rows() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleQuery {
    pub query: String,
    pub start: usize,
    pub rows: usize,
    pub sort: Option<String>,
    pub facets: Option<FacetSelections>,
}

impl SimpleQuery {
    pub fn new(query: &str) -> Self {
        Self { query: query.to_string(), start: 0, rows: default_rows(), sort: None, facets: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticQuery {
    pub query: String,
    pub start: usize,
    pub rows: usize,
    pub facets: Option<FacetSelections>,
}

impl SemanticQuery {
    pub fn new(query: &str) -> Self {
        Self { query: query.to_string(), start: 0, rows: default_rows(), facets: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteQuery {
    pub query: String,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Active,
    Inactive,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub url: String,
    pub status: NodeState,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Keyed `node_1`, `node_2`, ... in pool order.
pub type ClusterStatus = IndexMap<String, NodeStatus>;

pub fn node_label(position: usize) -> String {
    format!("node_{}", position + 1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedDoc {
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    pub body: String,
    pub meta_description: String,
    pub score: f64,
    pub last_modified: String,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResult {
    pub docs: Vec<FormattedDoc>,
    #[serde(rename = "numFound")]
    pub num_found: u64,
    pub facets: IndexMap<String, IndexMap<String, u64>>,
    pub cluster_status: ClusterStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl FormattedResult {
    /// The empty-but-valid contract returned when nothing could be fetched.
    pub fn empty(cluster_status: ClusterStatus) -> Self {
        Self { docs: Vec::new(), num_found: 0, facets: IndexMap::new(), cluster_status, debug: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub suggestions: Vec<String>,
}

/// Error document written at the process boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub status: String,
    pub kind: String,
    pub message: String,
}

impl ErrorReport {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self { status: "error".to_string(), kind: kind.to_string(), message: message.into() }
    }
}
