//! Backend-native payloads to the caller-facing result contract.
//!
//! Backend responses are read field by field. A missing or oddly typed
//! member degrades to its empty value instead of failing the whole response.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use searchfed_core::types::{scalar_text, ClusterStatus, FormattedDoc, FormattedResult};

/// A stored field that may be single- or multi-valued.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    pub fn from_json(v: Option<&Value>) -> Self {
        match v {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::Array(items)) => FieldValue::Many(items.iter().map(scalar_text).collect()),
            Some(other) => FieldValue::One(scalar_text(other)),
        }
    }

    /// Multi-valued fields are space-joined.
    pub fn joined(&self) -> String {
        match self {
            FieldValue::Missing => String::new(),
            FieldValue::One(s) => s.clone(),
            FieldValue::Many(items) => items.join(" "),
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            FieldValue::Missing => None,
            FieldValue::One(s) => Some(s),
            FieldValue::Many(items) => items.first().map(String::as_str),
        }
    }
}

/// Highlight fragments for one document, keyed by field.
pub type Highlights = IndexMap<String, FieldValue>;

/// The parts of a select response the normalizer reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    pub docs: Vec<Map<String, Value>>,
    pub num_found: u64,
    pub highlighting: IndexMap<String, Highlights>,
    /// Flat alternating `[value, count, value, count, ...]` arrays.
    pub facet_fields: IndexMap<String, Vec<Value>>,
    pub debug: Option<Value>,
}

impl RawResult {
    pub fn from_json(raw: &Value) -> Self {
        let response = raw.get("response");
        let docs = response
            .and_then(|r| r.get("docs"))
            .and_then(Value::as_array)
            .map(|docs| docs.iter().filter_map(Value::as_object).cloned().collect())
            .unwrap_or_default();
        let num_found = response.and_then(|r| r.get("numFound")).and_then(Value::as_u64).unwrap_or(0);

        let highlighting = raw
            .get("highlighting")
            .and_then(Value::as_object)
            .map(|by_id| {
                by_id
                    .iter()
                    .filter_map(|(id, fields)| {
                        let fields = fields.as_object()?;
                        Some((id.clone(), fields.iter().map(|(f, v)| (f.clone(), FieldValue::from_json(Some(v)))).collect()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let facet_fields = raw
            .get("facet_counts")
            .and_then(|f| f.get("facet_fields"))
            .and_then(Value::as_object)
            .map(|fields| fields.iter().filter_map(|(f, v)| Some((f.clone(), v.as_array()?.clone()))).collect())
            .unwrap_or_default();

        let debug = raw.get("debug").filter(|d| !d.is_null()).cloned();

        Self { docs, num_found, highlighting, facet_fields, debug }
    }
}

/// First `max_chars` characters plus `...`; shorter bodies pass through
/// unchanged and an empty body stays empty.
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Pair up a flat facet array. A trailing unpaired value is dropped, as is
/// any pair whose count is not a non-negative integer.
pub fn pair_facets(flat: &[Value]) -> IndexMap<String, u64> {
    flat.chunks_exact(2).filter_map(|pair| Some((scalar_text(&pair[0]), pair[1].as_u64()?))).collect()
}

fn format_doc(doc: &Map<String, Value>, highlights: Option<&Highlights>, body_max_chars: usize) -> FormattedDoc {
    let text = |field: &str| FieldValue::from_json(doc.get(field)).joined();
    let mut formatted = FormattedDoc {
        id: doc.get("id").filter(|v| !v.is_null()).map(scalar_text),
        title: text("title"),
        url: text("url"),
        body: truncate_body(&text("body"), body_max_chars),
        meta_description: text("meta_description"),
        score: doc.get("score").and_then(Value::as_f64).unwrap_or(0.0),
        last_modified: text("last_modified"),
        domain: text("domain"),
    };
    if let Some(hl) = highlights {
        if let Some(title) = hl.get("title").and_then(FieldValue::first) {
            formatted.title = title.to_string();
        }
        if let Some(body) = hl.get("body").filter(|b| **b != FieldValue::Missing) {
            formatted.body = body.joined();
        }
    }
    formatted
}

/// Build the caller-facing result and attach `cluster_status`.
pub fn normalize(raw: &RawResult, body_max_chars: usize, cluster_status: ClusterStatus) -> FormattedResult {
    let docs = raw
        .docs
        .iter()
        .map(|doc| {
            let highlights = doc.get("id").filter(|v| !v.is_null()).and_then(|id| raw.highlighting.get(&scalar_text(id)));
            format_doc(doc, highlights, body_max_chars)
        })
        .collect();
    let facets = raw.facet_fields.iter().map(|(field, flat)| (field.clone(), pair_facets(flat))).collect();
    FormattedResult { docs, num_found: raw.num_found, facets, cluster_status, debug: raw.debug.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn facet_pairs() {
        let pairs = pair_facets(&[json!("x"), json!(3), json!("y"), json!(2)]);
        assert_eq!(pairs, IndexMap::from([("x".to_string(), 3), ("y".to_string(), 2)]));
        let pairs = pair_facets(&[json!("x"), json!(3), json!("y")]);
        assert_eq!(pairs, IndexMap::from([("x".to_string(), 3)]));
        assert!(pair_facets(&[json!("x"), json!("lots")]).is_empty());
    }

    #[test]
    fn truncation_bounds() {
        let long = "a".repeat(500);
        let cut = truncate_body(&long, 300);
        assert_eq!(cut.chars().count(), 303);
        assert!(cut.ends_with("..."));

        let exact = "b".repeat(300);
        assert_eq!(truncate_body(&exact, 300), exact);
        assert_eq!(truncate_body("short", 300), "short");
        assert_eq!(truncate_body("", 300), "");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let body = "é".repeat(301);
        let cut = truncate_body(&body, 300);
        assert_eq!(cut.chars().count(), 303);
    }

    #[test]
    fn multivalued_body_is_joined_then_truncated() {
        let raw = RawResult::from_json(&json!({
            "response": {"numFound": 1, "docs": [{"id": "1", "body": ["alpha", "beta"], "title": ["T"], "score": 1.5}]}
        }));
        let result = normalize(&raw, 8, ClusterStatus::new());
        assert_eq!(result.docs[0].body, "alpha be...");
        assert_eq!(result.docs[0].title, "T");
        assert_eq!(result.docs[0].score, 1.5);
    }

    #[test]
    fn highlights_overlay_title_and_body() {
        let raw = RawResult::from_json(&json!({
            "response": {"numFound": 2, "docs": [
                {"id": "a", "title": "plain", "body": "plain body"},
                {"id": "b", "title": "other", "body": "other body"}
            ]},
            "highlighting": {"a": {"title": ["<mark>hit</mark> one", "ignored"], "body": ["x <mark>hit</mark>", "y"]}}
        }));
        let result = normalize(&raw, 300, ClusterStatus::new());
        assert_eq!(result.docs[0].title, "<mark>hit</mark> one");
        assert_eq!(result.docs[0].body, "x <mark>hit</mark> y");
        assert_eq!(result.docs[1].title, "other");
        assert_eq!(result.docs[1].body, "other body");
    }

    #[test]
    fn missing_sections_degrade_to_empty() {
        let raw = RawResult::from_json(&json!({"response": {"docs": "not a list"}, "facet_counts": 7}));
        let result = normalize(&raw, 300, ClusterStatus::new());
        assert_eq!(result.num_found, 0);
        assert!(result.docs.is_empty() && result.facets.is_empty() && result.debug.is_none());
    }

    #[test]
    fn doc_defaults_and_debug_passthrough() {
        let raw = RawResult::from_json(&json!({
            "response": {"numFound": 1, "docs": [{"id": 42}]},
            "facet_counts": {"facet_fields": {"domain": ["example.com", 4]}},
            "debug": {"parsedquery": "title:*x*"}
        }));
        let result = normalize(&raw, 300, ClusterStatus::new());
        let doc = &result.docs[0];
        assert_eq!(doc.id.as_deref(), Some("42"));
        assert_eq!((doc.title.as_str(), doc.body.as_str(), doc.score), ("", "", 0.0));
        assert_eq!(result.facets["domain"]["example.com"], 4);
        assert_eq!(result.debug, Some(json!({"parsedquery": "title:*x*"})));
    }
}
