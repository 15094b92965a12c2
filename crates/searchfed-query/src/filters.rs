use serde_json::Value;

use searchfed_core::types::{scalar_text, FacetSelections};

use crate::compiler::escape_quotes;

/// Local-params tag shared by a field's filter and its facet request.
pub fn filter_tag(field: &str) -> String {
	format!("{}_filter", field)
}

/// Facet request for `field` that ignores the field's own filter, so a
/// selected value keeps its count.
pub fn facet_field_param(field: &str) -> String {
	format!("{{!ex={}}}{}", filter_tag(field), field)
}

/// One tagged `fq` per field with a non-empty value list:
/// `{!tag=<field>_filter}<field>:("v1" OR "v2")`.
pub fn compile_filters(selections: &FacetSelections) -> Vec<String> {
	let mut filters = Vec::new();
	for (field, values) in selections {
		let Value::Array(values) = values else { continue };
		let quoted: Vec<String> = values
			.iter()
			.map(scalar_text)
			.filter(|v| !v.is_empty())
			.map(|v| format!("\"{}\"", escape_quotes(&v)))
			.collect();
		if quoted.is_empty() || field.trim().is_empty() { continue; }
		filters.push(format!("{{!tag={}}}{}:({})", filter_tag(field), field, quoted.join(" OR ")));
	}
	filters
}
