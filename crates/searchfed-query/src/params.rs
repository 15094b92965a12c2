use searchfed_core::config::SearchSettings;
use searchfed_core::types::{Boost, Sort};

use crate::filters::facet_field_param;
use crate::vector::NativeQuery;

/// Ordered request parameters; keys may repeat (`fq`, `facet.field`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
	pairs: Vec<(String, String)>,
}

impl Params {
	pub fn new() -> Self { Self::default() }

	pub fn push(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
		self.pairs.push((key.to_string(), value.into()));
		self
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	pub fn get_all(&self, key: &str) -> Vec<&str> {
		self.pairs.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
	}

	pub fn pairs(&self) -> &[(String, String)] { &self.pairs }

	/// Select-handler parameters shared by every search flavour: paging,
	/// highlighting, self-excluding facets, scored field list, debug.
	pub fn select(query: &NativeQuery, start: usize, rows: usize, settings: &SearchSettings) -> Self {
		let mut p = Self::new();
		p.push("q", query.as_q())
			.push("start", start.to_string())
			.push("rows", rows.to_string())
			.push("wt", "json")
			.push("fl", "*,score");
		if !settings.highlight_fields.is_empty() {
			p.push("hl", "true")
				.push("hl.fl", settings.highlight_fields.join(","))
				.push("hl.simple.pre", settings.highlight_pre.as_str())
				.push("hl.simple.post", settings.highlight_post.as_str());
		}
		if !settings.facet_fields.is_empty() {
			p.push("facet", "true").push("facet.mincount", settings.facet_mincount.to_string());
			for field in &settings.facet_fields { p.push("facet.field", facet_field_param(field)); }
		}
		if settings.debug_query { p.push("debugQuery", "true"); }
		p
	}

	pub fn with_sort(mut self, sort: Option<&str>) -> Self {
		if let Some(sort) = sort.map(str::trim).filter(|s| !s.is_empty()) { self.push("sort", sort); }
		self
	}

	pub fn with_filters(mut self, filters: &[String]) -> Self {
		for fq in filters { self.push("fq", fq.as_str()); }
		self
	}

	pub fn with_boost(mut self, boost: &[Boost]) -> Self {
		let qf: Vec<String> = boost
			.iter()
			.filter(|b| !b.field.trim().is_empty() && b.factor.is_finite())
			.map(|b| format!("{}^{}", b.field.trim(), b.factor))
			.collect();
		if !qf.is_empty() { self.push("qf", qf.join(" ")); }
		self
	}

	/// Suggest-handler parameters.
	pub fn suggest(query: &str, count: usize, settings: &SearchSettings) -> Self {
		let mut p = Self::new();
		p.push("suggest", "true")
			.push("suggest.dictionary", settings.suggest_dictionary.as_str())
			.push("suggest.q", query)
			.push("suggest.count", count.to_string())
			.push("wt", "json");
		p
	}
}

/// `"<field> <asc|desc>"`; anything else is dropped.
pub fn sort_clause(sort: &Sort) -> Option<String> {
	let field = sort.field.trim();
	let direction = sort.direction.trim().to_ascii_lowercase();
	if field.is_empty() || !matches!(direction.as_str(), "asc" | "desc") { return None; }
	Some(format!("{} {}", field, direction))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn select_defaults() {
		let p = Params::select(&NativeQuery::Text("*:*".into()), 20, 5, &SearchSettings::default());
		assert_eq!(p.get("q"), Some("*:*"));
		assert_eq!(p.get("start"), Some("20"));
		assert_eq!(p.get("rows"), Some("5"));
		assert_eq!(p.get("hl.fl"), Some("title,body"));
		assert_eq!(p.get("hl.simple.pre"), Some("<mark>"));
		assert_eq!(p.get("facet.mincount"), Some("1"));
		assert_eq!(p.get_all("facet.field"), vec!["{!ex=domain_filter}domain"]);
		assert_eq!(p.get("fl"), Some("*,score"));
		assert_eq!(p.get("debugQuery"), Some("true"));
		assert!(p.get("sort").is_none() && p.get("fq").is_none());
	}

	#[test]
	fn no_facets_or_highlights_when_unconfigured() {
		let settings = SearchSettings { facet_fields: vec![], highlight_fields: vec![], debug_query: false, ..SearchSettings::default() };
		let p = Params::select(&NativeQuery::Text("x".into()), 0, 10, &settings);
		assert!(p.get("facet").is_none() && p.get("hl").is_none() && p.get("debugQuery").is_none());
	}

	#[test]
	fn sort_filters_boost() {
		let p = Params::select(&NativeQuery::Text("x".into()), 0, 10, &SearchSettings::default())
			.with_sort(Some("title asc"))
			.with_filters(&["{!tag=a_filter}a:(\"1\")".to_string(), "{!tag=b_filter}b:(\"2\")".to_string()])
			.with_boost(&[Boost { field: "title".into(), factor: 2.0 }, Boost { field: "body".into(), factor: 0.5 }]);
		assert_eq!(p.get("sort"), Some("title asc"));
		assert_eq!(p.get_all("fq").len(), 2);
		assert_eq!(p.get("qf"), Some("title^2 body^0.5"));
	}

	#[test]
	fn sort_clause_normalises_direction() {
		assert_eq!(sort_clause(&Sort { field: "score".into(), direction: "DESC".into() }).as_deref(), Some("score desc"));
		assert_eq!(sort_clause(&Sort { field: "score".into(), direction: "sideways".into() }), None);
		assert_eq!(sort_clause(&Sort { field: " ".into(), direction: "asc".into() }), None);
	}

	#[test]
	fn suggest_params() {
		let p = Params::suggest("sol", 3, &SearchSettings::default());
		assert_eq!(p.get("suggest.dictionary"), Some("mySuggester"));
		assert_eq!(p.get("suggest.q"), Some("sol"));
		assert_eq!(p.get("suggest.count"), Some("3"));
	}
}
