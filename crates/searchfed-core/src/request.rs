//! Decoding of the single JSON request accepted at the process boundary.
//!
//! The request kind is chosen by key presence, in this order: `dsl_query`,
//! a truthy `autocomplete`, a truthy `semantic_search`, otherwise a simple
//! free-text search.

use serde_json::{Map, Value};

use crate::config::SearchSettings;
use crate::error::{Error, Result};
use crate::types::{
    scalar_text, AutocompleteQuery, Boost, Condition, ConditionValue, DslQuery, FacetSelections, Operator, SemanticQuery,
    SimpleQuery, Sort,
};

/// Backend query that matches every document.
pub const MATCH_ALL: &str = "*:*";

#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    Simple(SimpleQuery),
    Dsl(DslQuery),
    Semantic(SemanticQuery),
    Autocomplete(AutocompleteQuery),
}

impl SearchRequest {
    pub fn from_json(args: &Value, settings: &SearchSettings) -> Result<Self> {
        let empty = Map::new();
        let obj = match args {
            Value::Object(m) => m,
            Value::Null => &empty,
            other => return Err(Error::Operation(format!("request must be a JSON object, got {}", type_name(other)))),
        };

        if let Some(dsl) = obj.get("dsl_query") {
            return parse_dsl(dsl, obj, settings).map(SearchRequest::Dsl);
        }

        if is_truthy(obj.get("autocomplete")) {
            return Ok(SearchRequest::Autocomplete(AutocompleteQuery {
                query: text_or(obj.get("query"), MATCH_ALL),
                limit: obj.get("limit").and_then(as_usize).unwrap_or(settings.suggest_limit),
            }));
        }

        let start = obj.get("start").and_then(as_usize).unwrap_or(0);
        let rows = obj.get("rows").and_then(as_usize).unwrap_or(settings.default_rows);
        let facets = obj.get("facets").and_then(facet_selections);

        if is_truthy(obj.get("semantic_search")) {
            return Ok(SearchRequest::Semantic(SemanticQuery {
                query: obj.get("query").map(scalar_text).unwrap_or_default(),
                start,
                rows,
                facets,
            }));
        }

        Ok(SearchRequest::Simple(SimpleQuery {
            query: text_or(obj.get("query"), MATCH_ALL),
            start,
            rows,
            sort: obj.get("sort").and_then(sort_clause),
            facets,
        }))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SearchRequest::Simple(_) => "simple",
            SearchRequest::Dsl(_) => "dsl",
            SearchRequest::Semantic(_) => "semantic",
            SearchRequest::Autocomplete(_) => "autocomplete",
        }
    }
}

/// Accepts the flat `{conditions, ...}` shape and the wrapped
/// `{query: {conditions, ...}, facets, start, rows}` shape. Pagination and
/// facets found on an outer layer override the inner ones.
fn parse_dsl(dsl: &Value, outer: &Map<String, Value>, settings: &SearchSettings) -> Result<DslQuery> {
    let mut current = dsl
        .as_object()
        .ok_or_else(|| Error::Operation(format!("dsl_query must be an object, got {}", type_name(dsl))))?;
    let mut wrappers = vec![outer];
    if let Some(inner) = current.get("query").and_then(Value::as_object).filter(|q| q.contains_key("conditions")) {
        wrappers.push(current);
        current = inner;
    }

    let mut query = DslQuery {
        conditions: current.get("conditions").map(conditions).unwrap_or_default(),
        sort: current.get("sort").and_then(dsl_sort),
        boost: current.get("boost").map(boosts).unwrap_or_default(),
        facets: current.get("facets").and_then(facet_selections),
        start: current.get("start").and_then(as_usize).unwrap_or(0),
        rows: current.get("rows").and_then(as_usize).unwrap_or(settings.default_rows),
    };
    for layer in wrappers.iter().rev() {
        if let Some(start) = layer.get("start").and_then(as_usize) { query.start = start; }
        if let Some(rows) = layer.get("rows").and_then(as_usize) { query.rows = rows; }
        if let Some(facets) = layer.get("facets").and_then(facet_selections) { query.facets = Some(facets); }
    }
    Ok(query)
}

/// Malformed entries become conditions the compiler drops, so one bad
/// condition never rejects the whole query.
fn conditions(v: &Value) -> Vec<Condition> {
    let Some(items) = v.as_array() else { return Vec::new() };
    items
        .iter()
        .map(|item| {
            let Some(m) = item.as_object() else { return Condition::default() };
            Condition {
                field: m.get("field").map(scalar_text).unwrap_or_default(),
                operator: m.get("operator").map(|op| Operator::from(scalar_text(op))).unwrap_or_default(),
                value: m.get("value").and_then(|v| serde_json::from_value::<ConditionValue>(v.clone()).ok()).unwrap_or_default(),
            }
        })
        .collect()
}

fn dsl_sort(v: &Value) -> Option<Sort> {
    let m = v.as_object()?;
    let field = m.get("field").map(scalar_text).filter(|f| !f.trim().is_empty())?;
    let direction = m.get("direction").map(scalar_text).filter(|d| !d.trim().is_empty()).unwrap_or_else(|| "desc".to_string());
    Some(Sort { field, direction })
}

/// Entries without a field or a numeric factor are skipped.
fn boosts(v: &Value) -> Vec<Boost> {
    let Some(items) = v.as_array() else { return Vec::new() };
    items
        .iter()
        .filter_map(|item| {
            let field = item.get("field").map(scalar_text).filter(|f| !f.trim().is_empty())?;
            let factor = match item.get("factor")? {
                Value::Number(n) => n.as_f64()?,
                Value::String(s) => s.trim().parse().ok()?,
                _ => return None,
            };
            Some(Boost { field, factor })
        })
        .collect()
}

fn facet_selections(v: &Value) -> Option<FacetSelections> {
    v.as_object().map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

/// `"title asc"` or `{"field": "title", "direction": "asc"}`.
fn sort_clause(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(m) => {
            let field = m.get("field").map(scalar_text).filter(|f| !f.trim().is_empty())?;
            let direction = m.get("direction").map(scalar_text).unwrap_or_else(|| "desc".to_string());
            Some(format!("{} {}", field.trim(), direction.trim()))
        }
        _ => None,
    }
}

fn text_or(v: Option<&Value>, fallback: &str) -> String {
    match v.map(scalar_text) {
        Some(s) if !s.trim().is_empty() => s,
        _ => fallback.to_string(),
    }
}

fn is_truthy(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

fn as_usize(v: &Value) -> Option<usize> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)).map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
