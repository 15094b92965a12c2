//! searchfed-query
//!
//! Compiles abstract query descriptions (DSL conditions, facet selections,
//! query vectors) into the backend's native Lucene/Solr syntax, and builds
//! the request parameter lists for the select and suggest handlers.
pub mod compiler;
pub mod filters;
pub mod params;
pub mod vector;

pub use compiler::{compile_conditions, compile_conditions_with, CompileOptions, CompiledQuery, DropReason, DroppedCondition};
pub use filters::{compile_filters, facet_field_param, filter_tag};
pub use params::{sort_clause, Params};
pub use vector::{compile_vector_query, NativeQuery};
