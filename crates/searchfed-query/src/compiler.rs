use searchfed_core::request::MATCH_ALL;
use searchfed_core::types::{Condition, Operator};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
	/// Quote-escape `contains` values like every other operator. Off by
	/// default: `contains` values are emitted verbatim inside the wildcards.
	pub escape_contains: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
	BlankValue,
	MissingField,
	UnknownOperator,
	MalformedRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedCondition {
	/// Position in the input list.
	pub index: usize,
	pub field: String,
	pub operator: String,
	pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
	pub query: String,
	pub dropped: Vec<DroppedCondition>,
}

/// Compile conditions with default options, discarding diagnostics.
pub fn compile_conditions(conditions: &[Condition]) -> String {
	compile_conditions_with(conditions, CompileOptions::default()).query
}

pub fn compile_conditions_with(conditions: &[Condition], options: CompileOptions) -> CompiledQuery {
	let mut fragments = Vec::new();
	let mut dropped = Vec::new();
	for (index, condition) in conditions.iter().enumerate() {
		match compile_one(condition, options) {
			Ok(fragment) => fragments.push(fragment),
			Err(reason) => {
				tracing::debug!(index, field = %condition.field, operator = condition.operator.as_str(), ?reason, "dropping condition");
				dropped.push(DroppedCondition { index, field: condition.field.clone(), operator: condition.operator.as_str().to_string(), reason });
			}
		}
	}
	let query = if fragments.is_empty() { MATCH_ALL.to_string() } else { fragments.join(" AND ") };
	CompiledQuery { query, dropped }
}

fn compile_one(condition: &Condition, options: CompileOptions) -> Result<String, DropReason> {
	let raw = condition.value.to_text();
	if raw.trim().is_empty() { return Err(DropReason::BlankValue); }
	let field = condition.field.trim();
	if field.is_empty() { return Err(DropReason::MissingField); }

	let escape = !matches!(condition.operator, Operator::Contains) || options.escape_contains;
	let value = if escape { escape_quotes(&raw) } else { raw };

	match &condition.operator {
		Operator::Contains => Ok(format!("{}:*{}*", field, value)),
		Operator::Exact => Ok(format!("{}:\"{}\"", field, value)),
		Operator::StartsWith => Ok(format!("{}:{}*", field, value)),
		Operator::EndsWith => Ok(format!("{}:*{}", field, value)),
		Operator::Range => {
			let (min, max) = value.split_once(',').ok_or(DropReason::MalformedRange)?;
			Ok(format!("{}:[{} TO {}]", field, range_bound(min), range_bound(max)))
		}
		Operator::Other(_) => Err(DropReason::UnknownOperator),
	}
}

/// An empty side of a range is open-ended.
fn range_bound(s: &str) -> &str {
	let s = s.trim();
	if s.is_empty() { "*" } else { s }
}

pub(crate) fn escape_quotes(s: &str) -> String {
	s.replace('"', "\\\"")
}
