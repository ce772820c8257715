//! Kratos Graph: read-only Neo4j access for the query pipeline.
//!
//! The pipeline only ever sees the `GraphStore` capability: schema
//! introspection plus read-query execution with a timeout. `GraphClient`
//! is the Neo4j implementation; every generated query it runs is executed
//! inside a transaction that is rolled back, so nothing can be written.

pub mod client;
pub mod introspect;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use store::GraphStore;
