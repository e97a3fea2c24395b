//! Atomic-swap cache for the published taxon tree.
//!
//! Readers take a cheap clone of the current `Arc<TaxonTree>` handle; the
//! tree itself is immutable. A rebuild constructs the new tree fully before
//! publishing it, so readers never observe a partially built tree. A
//! single-flight guard collapses concurrent cache-miss rebuilds into one
//! snapshot fetch instead of serializing readers behind a lock.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{info, warn};

use sightline_core::{Error, Result, TaxonSnapshotProvider};

use crate::taxon_tree::TaxonTree;

/// Cache of the current taxon-tree generation.
pub struct TaxonTreeCache {
    provider: Arc<dyn TaxonSnapshotProvider>,
    /// Published handle. `None` until the first successful build or after
    /// an invalidation.
    current: RwLock<Option<Arc<TaxonTree>>>,
    /// Single-flight guard: only one rebuild runs at a time; latecomers
    /// re-check the published handle after acquiring it.
    rebuild: Mutex<()>,
}

impl TaxonTreeCache {
    pub fn new(provider: Arc<dyn TaxonSnapshotProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
            rebuild: Mutex::new(()),
        }
    }

    /// Get the current tree, building it on first access.
    pub async fn get(&self) -> Result<Arc<TaxonTree>> {
        if let Some(tree) = self.read_current() {
            return Ok(tree);
        }

        let _guard = self.rebuild.lock().await;
        // Another caller may have finished the rebuild while we waited.
        if let Some(tree) = self.read_current() {
            return Ok(tree);
        }

        let started = Instant::now();
        let taxa = self.provider.get_all_basic_taxa().await.map_err(|e| {
            warn!(
                subsystem = "taxonomy",
                component = "taxon_tree_cache",
                error = %e,
                "taxon snapshot fetch failed"
            );
            Error::Upstream(format!("taxon snapshot unavailable: {e}"))
        })?;

        let tree = Arc::new(TaxonTree::build(taxa));
        info!(
            subsystem = "taxonomy",
            component = "taxon_tree_cache",
            op = "rebuild",
            taxon_count = tree.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "taxon tree rebuilt"
        );

        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&tree));
        Ok(tree)
    }

    /// Drop the published tree; the next `get` rebuilds from a fresh
    /// snapshot. In-flight readers keep their old handle.
    pub fn invalidate(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn read_current(&self) -> Option<Arc<TaxonTree>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
