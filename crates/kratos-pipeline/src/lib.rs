//! kratos-pipeline: natural-language question → validated Cypher → grounded answer.
//!
//! A run moves through a fixed sequence of stages:
//! acquire schema → classify intent → synthesize query → validate →
//! execute → compress → synthesize answer. The validator is the safety gate;
//! nothing reaches the graph store without passing it, and the executor only
//! accepts a `ValidatedQuery`.

pub mod answer;
pub mod compress;
pub mod execute;
pub mod intent;
pub mod pipeline;
pub mod prompts;
pub mod schema_cache;
pub mod synthesize;
pub mod trace;
pub mod validate;

pub use compress::{compress, NO_DATA_FOUND};
pub use pipeline::{Pipeline, PipelineOptions, PipelineState, Stage};
pub use schema_cache::SchemaCache;
pub use validate::{validate, QueryValidator, ValidatedQuery, ValidationPolicy};
