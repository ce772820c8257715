//! Query execution stage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kratos_core::error::Result;
use kratos_core::{PipelineError, Record};
use kratos_graph::{GraphError, GraphStore};

use crate::validate::ValidatedQuery;

/// Default per-query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Runs validated queries against the graph store with a fixed timeout.
///
/// Single shot: failures are returned, never retried.
pub struct QueryExecutor {
    store: Arc<dyn GraphStore>,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn GraphStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn execute(&self, query: &ValidatedQuery) -> Result<Vec<Record>> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let start = Instant::now();

        // The store is asked to honour the timeout; the outer bound covers
        // implementations that don't.
        let result = tokio::time::timeout(
            self.timeout,
            self.store.run_read_query(query.as_str(), self.timeout),
        )
        .await
        .unwrap_or(Err(GraphError::Timeout { timeout_ms }));

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(rows) => {
                tracing::info!(
                    query = %query,
                    rows = rows.len(),
                    duration_ms,
                    "Query executed"
                );
                Ok(rows)
            }
            Err(GraphError::Timeout { timeout_ms }) => {
                tracing::warn!(query = %query, duration_ms, "Query timed out");
                Err(PipelineError::ExecutionTimeout { timeout_ms })
            }
            Err(e) => {
                tracing::warn!(query = %query, duration_ms, error = %e, "Query failed");
                Err(PipelineError::ExecutionError(e.to_string()))
            }
        }
    }
}
