//! The graph-store capability consumed by the pipeline.

use std::time::Duration;

use async_trait::async_trait;

use kratos_core::{RawSchema, Record};

use crate::client::{GraphClient, GraphError};

/// What the pipeline needs from a property graph store.
///
/// Implementations must refuse to persist writes on their own; the query
/// validator is not the only safety boundary.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Report the labels, relationship types, and node properties in the store.
    async fn introspect_schema(&self) -> Result<RawSchema, GraphError>;

    /// Run query text read-only, failing with `GraphError::Timeout` past `timeout`.
    async fn run_read_query(&self, text: &str, timeout: Duration)
        -> Result<Vec<Record>, GraphError>;
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn introspect_schema(&self) -> Result<RawSchema, GraphError> {
        GraphClient::introspect_schema(self).await
    }

    async fn run_read_query(
        &self,
        text: &str,
        timeout: Duration,
    ) -> Result<Vec<Record>, GraphError> {
        self.run_read_only(text, timeout).await
    }
}
