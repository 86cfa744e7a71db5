//! Process-wide table-name → statistics registry.
//!
//! Copy-on-write: readers clone the currently published `Arc` snapshot and
//! never block behind a rebuild. `rebuild_all` constructs a complete fresh
//! map off to the side and swaps it in with one write; a failure publishes
//! nothing, so every previously published entry stays valid.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use granite_error::{GraniteError, Result};
use granite_storage::Catalog;
use granite_types::TableId;

use crate::table_stats::{TableStats, DEFAULT_IO_COST_PER_PAGE};

type StatsMap = HashMap<String, Arc<TableStats>>;

/// Registry of per-table statistics, consulted by the planner.
///
/// An explicitly owned service object: construct one per engine instance and
/// hand it to whoever does plan costing. Tests seed it through [`insert`]
/// rather than scanning real tables.
///
/// [`insert`]: StatsRegistry::insert
pub struct StatsRegistry {
    io_cost_per_page: u64,
    published: RwLock<Arc<StatsMap>>,
}

impl StatsRegistry {
    /// Create an empty registry with the given per-page I/O cost.
    #[must_use]
    pub fn new(io_cost_per_page: u64) -> Self {
        Self {
            io_cost_per_page,
            published: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Statistics for `name`, if computed. A pure read: never blocks behind
    /// a rebuild beyond the instant of cloning the published snapshot.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<TableStats>> {
        self.published.read().get(name).cloned()
    }

    /// Like [`get`](StatsRegistry::get), but a missing entry is an error —
    /// for callers that must cost a plan and cannot proceed on a sentinel.
    pub fn require(&self, name: &str) -> Result<Arc<TableStats>> {
        self.get(name).ok_or_else(|| GraniteError::NoStatistics {
            name: name.to_owned(),
        })
    }

    /// Publish `stats` under `name`, replacing any previous entry.
    pub fn insert(&self, name: impl Into<String>, stats: TableStats) {
        let name = name.into();
        let mut published = self.published.write();
        let mut next: StatsMap = (**published).clone();
        next.insert(name, Arc::new(stats));
        *published = Arc::new(next);
    }

    /// Recompute statistics for every table in `catalog` and atomically
    /// replace the published map.
    ///
    /// Readers racing this call observe either the old complete map or the
    /// new complete map. If any table's build fails, the error propagates and
    /// the previously published map remains in place untouched.
    pub fn rebuild_all(&self, catalog: &dyn Catalog) -> Result<()> {
        info!("computing table statistics");
        let mut next: StatsMap = HashMap::new();
        for table in catalog.table_ids() {
            let name = catalog.table_name(table)?;
            let stats = TableStats::build(catalog, table, self.io_cost_per_page)?;
            debug!(%table, name, "statistics ready");
            next.insert(name, Arc::new(stats));
        }
        *self.published.write() = Arc::new(next);
        info!("table statistics published");
        Ok(())
    }

    /// Rebuild statistics for a single table and publish just that entry.
    pub fn rebuild_table(&self, catalog: &dyn Catalog, table: TableId) -> Result<()> {
        let name = catalog.table_name(table)?;
        let stats = TableStats::build(catalog, table, self.io_cost_per_page)?;
        self.insert(name, stats);
        Ok(())
    }

    /// Number of tables with published statistics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.published.read().len()
    }

    /// Whether no statistics have been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.published.read().is_empty()
    }
}

impl Default for StatsRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IO_COST_PER_PAGE)
    }
}

impl std::fmt::Debug for StatsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsRegistry")
            .field("tables", &self.len())
            .field("io_cost_per_page", &self.io_cost_per_page)
            .finish()
    }
}
