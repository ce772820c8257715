//! Single-flight cache for the graph schema snapshot.
//!
//! The first caller triggers introspection; concurrent callers wait on the
//! same in-flight fetch and all observe the same `Arc<SchemaSnapshot>`.
//! A failed fetch stores nothing, so the next waiter retries. The snapshot
//! lives until `invalidate` is called.
//!
//! Reads never take a lock: the current slot sits behind an `ArcSwap` and
//! invalidation swaps in a fresh one.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::OnceCell;

use kratos_core::error::Result;
use kratos_core::{PipelineError, SchemaSnapshot};
use kratos_graph::GraphStore;

pub struct SchemaCache {
    store: Arc<dyn GraphStore>,
    slot: ArcSwap<OnceCell<Arc<SchemaSnapshot>>>,
}

impl SchemaCache {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            slot: ArcSwap::from_pointee(OnceCell::new()),
        }
    }

    /// Return the cached snapshot, fetching it once if absent.
    pub async fn get(&self) -> Result<Arc<SchemaSnapshot>> {
        if let Some(snapshot) = self.slot.load().get() {
            return Ok(snapshot.clone());
        }

        // Own the slot across the await so an invalidate can't pull it away.
        let slot = self.slot.load_full();
        let snapshot = slot.get_or_try_init(|| self.fetch()).await?;
        Ok(snapshot.clone())
    }

    /// The cached snapshot, without fetching.
    pub fn cached(&self) -> Option<Arc<SchemaSnapshot>> {
        self.slot.load().get().cloned()
    }

    /// Drop the cached snapshot; the next `get` re-introspects.
    ///
    /// Fetches already in flight complete into the old slot and are discarded.
    pub fn invalidate(&self) {
        self.slot.store(Arc::new(OnceCell::new()));
        tracing::info!("Schema cache invalidated");
    }

    async fn fetch(&self) -> Result<Arc<SchemaSnapshot>> {
        let raw = self.store.introspect_schema().await.map_err(|e| {
            tracing::warn!(error = %e, "Schema introspection failed");
            PipelineError::SchemaUnavailable(e.to_string())
        })?;

        let snapshot = SchemaSnapshot::from_raw(raw)?;
        tracing::info!(
            labels = snapshot.labels().len(),
            relationship_types = snapshot.relationship_types().len(),
            "Schema snapshot cached"
        );
        Ok(Arc::new(snapshot))
    }
}
