//! Neo4j connection management and the read-only graph client.

use std::time::{Duration, Instant};

use neo4rs::{ConfigBuilder, Graph, Query};

use kratos_core::config::Neo4jSettings;
use kratos_core::Record;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Query timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::from(&Neo4jSettings::default())
    }
}

impl From<&Neo4jSettings> for GraphConfig {
    fn from(settings: &Neo4jSettings) -> Self {
        Self {
            uri: settings.uri.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            database: settings.database.clone(),
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
        }
    }
}

/// Thread-safe Neo4j client with connection pooling.
///
/// Clone is cheap (inner Arc). Dropping the last clone closes the pool.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a trusted, internally-built read query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute generated query text inside a transaction that is always
    /// rolled back, bounded by `timeout`.
    pub async fn run_read_only(
        &self,
        text: &str,
        timeout: Duration,
    ) -> Result<Vec<Record>, GraphError> {
        let start = Instant::now();
        let timeout_ms = timeout.as_millis() as u64;

        let records = tokio::time::timeout(timeout, self.collect_rolled_back(text))
            .await
            .map_err(|_| GraphError::Timeout { timeout_ms })??;

        tracing::debug!(
            rows = records.len(),
            duration_ms = start.elapsed().as_millis(),
            "Read-only query finished"
        );
        Ok(records)
    }

    async fn collect_rolled_back(&self, text: &str) -> Result<Vec<Record>, GraphError> {
        let mut txn = self.graph.start_txn().await?;
        let mut stream = txn.execute(neo4rs::query(text)).await?;

        let mut records = Vec::new();
        while let Some(row) = stream.next(txn.handle()).await? {
            records.push(row_to_record(&row)?);
        }

        txn.rollback().await?;
        Ok(records)
    }
}

/// Convert a neo4rs row into an ordered column → JSON value map.
fn row_to_record(row: &neo4rs::Row) -> Result<Record, GraphError> {
    row.to::<Record>()
        .map_err(|e| GraphError::Serialization(format!("Failed to decode row: {e}")))
}
