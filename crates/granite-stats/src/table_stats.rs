//! Per-table statistics: page count, tuple count, one histogram per column.
//!
//! Built by two full passes over the table through the storage collaborator:
//! the first pass finds each integer column's observed min/max (histogram
//! domains) and the tuple count, the second feeds every value into its
//! column's histogram. Immutable afterwards.

use serde::{Deserialize, Serialize};
use tracing::debug;

use granite_error::{GraniteError, Result};
use granite_storage::Catalog;
use granite_types::{ColumnType, PredicateOp, TableId, Value};

use crate::histogram::{IntHistogram, StringHistogram};

/// Number of buckets per column histogram.
pub const HIST_BUCKETS: usize = 100;

/// Default I/O cost, in abstract units, of reading one page from storage.
pub const DEFAULT_IO_COST_PER_PAGE: u64 = 1000;

/// Histogram over one column, keyed by the column's declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ColumnHistogram {
    Integer(IntHistogram),
    Text(StringHistogram),
}

/// Statistics about one base table, as consulted by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    table: TableId,
    page_count: u64,
    io_cost_per_page: u64,
    total_tuples: u64,
    columns: Vec<ColumnHistogram>,
}

impl TableStats {
    /// Build statistics for `table` by scanning it twice.
    ///
    /// Any scan failure propagates; no partially built statistics escape.
    pub fn build(catalog: &dyn Catalog, table: TableId, io_cost_per_page: u64) -> Result<Self> {
        let schema = catalog.schema(table)?;
        let page_count = catalog.page_count(table)?;

        let mut scan = catalog.scan(table)?;
        scan.open()?;

        // Pass 1: tuple count and per-column min/max for integer columns.
        let mut total_tuples = 0u64;
        let mut ranges: Vec<Option<(i64, i64)>> = vec![None; schema.width()];
        while let Some(row) = scan.next()? {
            total_tuples += 1;
            for (idx, value) in row.iter().enumerate() {
                if let Value::Integer(v) = value {
                    let range = ranges[idx].get_or_insert((*v, *v));
                    range.0 = range.0.min(*v);
                    range.1 = range.1.max(*v);
                }
            }
        }

        let mut columns: Vec<ColumnHistogram> = schema
            .iter()
            .enumerate()
            .map(|(idx, ty)| match ty {
                ColumnType::Integer => {
                    // A column with no observed rows gets a degenerate
                    // single-point domain; its histogram stays empty.
                    let (min, max) = ranges[idx].unwrap_or((0, 0));
                    ColumnHistogram::Integer(IntHistogram::new(HIST_BUCKETS, min, max))
                }
                ColumnType::Text => ColumnHistogram::Text(StringHistogram::new(HIST_BUCKETS)),
            })
            .collect();

        // Pass 2: populate the histograms.
        scan.rewind()?;
        while let Some(row) = scan.next()? {
            for (idx, value) in row.iter().enumerate() {
                match (&mut columns[idx], value) {
                    (ColumnHistogram::Integer(h), Value::Integer(v)) => h.add_value(*v),
                    (ColumnHistogram::Text(h), Value::Text(s)) => h.add_value(s),
                    // Schema/value disagreement is the storage layer's bug;
                    // skip rather than poison the whole table's statistics.
                    _ => {}
                }
            }
        }
        scan.close();

        debug!(%table, total_tuples, page_count, "table statistics built");
        Ok(Self {
            table,
            page_count,
            io_cost_per_page,
            total_tuples,
            columns,
        })
    }

    /// Estimated cost of sequentially scanning the whole table.
    ///
    /// Linear in pages: a partially filled final page costs a full read.
    #[must_use]
    pub fn estimate_scan_cost(&self) -> f64 {
        (self.page_count * self.io_cost_per_page) as f64
    }

    /// Estimated number of tuples a scan emits after applying a predicate
    /// with the given selectivity: `floor(selectivity × total_tuples)`.
    #[must_use]
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> u64 {
        (selectivity * self.total_tuples as f64) as u64
    }

    /// Estimated selectivity of the predicate `column op value`.
    ///
    /// Fails with `InvalidColumn` when `column` is out of range and
    /// `TypeMismatch` when the probe value's type does not match the column.
    pub fn estimate_selectivity(
        &self,
        column: usize,
        op: PredicateOp,
        value: &Value,
    ) -> Result<f64> {
        let hist = self
            .columns
            .get(column)
            .ok_or(GraniteError::InvalidColumn {
                column,
                width: self.columns.len(),
            })?;
        match (hist, value) {
            (ColumnHistogram::Integer(h), Value::Integer(v)) => {
                Ok(h.estimate_selectivity(op, *v))
            }
            (ColumnHistogram::Text(h), Value::Text(s)) => Ok(h.estimate_selectivity(op, s)),
            (ColumnHistogram::Integer(_), other) => Err(GraniteError::TypeMismatch {
                column,
                expected: ColumnType::Integer,
                actual: other.column_type(),
            }),
            (ColumnHistogram::Text(_), other) => Err(GraniteError::TypeMismatch {
                column,
                expected: ColumnType::Text,
                actual: other.column_type(),
            }),
        }
    }

    /// Total number of tuples in the table.
    #[must_use]
    pub fn total_tuples(&self) -> u64 {
        self.total_tuples
    }

    /// Number of pages the table occupies.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    /// The table these statistics describe.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Width of the table schema these statistics were built from.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
