use searchfed_core::config::VectorSettings;

/// The compiler's output, understood only by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeQuery {
	/// Lucene/Solr standard query syntax.
	Text(String),
	/// k-nearest-neighbour local-params query over the vector field.
	Vector { top_k: usize, fragment: String },
}

impl NativeQuery {
	/// Value of the backend `q` parameter.
	pub fn as_q(&self) -> &str {
		match self {
			NativeQuery::Text(q) => q,
			NativeQuery::Vector { fragment, .. } => fragment,
		}
	}
}

/// `{!knn f=<field> topK=<k>}[v1,v2,...]` with `k = max(rows, min_top_k)`
/// so enough candidates survive pagination and filtering.
pub fn compile_vector_query(vector: &[f32], rows: usize, settings: &VectorSettings) -> NativeQuery {
	let top_k = rows.max(settings.min_top_k);
	let values: Vec<String> = vector.iter().map(|x| if x.is_finite() { x.to_string() } else { "0".to_string() }).collect();
	let fragment = format!("{{!knn f={} topK={}}}[{}]", settings.field, top_k, values.join(","));
	NativeQuery::Vector { top_k, fragment }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn knn_fragment_shape() {
		let q = compile_vector_query(&[0.5, -1.0, 0.25], 10, &VectorSettings::default());
		assert_eq!(q, NativeQuery::Vector { top_k: 100, fragment: "{!knn f=embedding_vector topK=100}[0.5,-1,0.25]".to_string() });
	}

	#[test]
	fn top_k_follows_rows_when_larger() {
		let settings = VectorSettings { field: "vec".to_string(), min_top_k: 100 };
		let NativeQuery::Vector { top_k, fragment } = compile_vector_query(&[1.0], 250, &settings) else { panic!("expected vector query") };
		assert_eq!(top_k, 250);
		assert!(fragment.starts_with("{!knn f=vec topK=250}"));
	}

	#[test]
	fn text_query_passes_through() {
		assert_eq!(NativeQuery::Text("title:*x*".to_string()).as_q(), "title:*x*");
	}
}
