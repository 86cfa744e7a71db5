//! Collaborator contracts the GraniteDB core consumes as black boxes.
//!
//! The lock manager and the statistics engine never touch physical pages or
//! tuple encodings. Everything they need from the surrounding engine flows
//! through two traits:
//!
//! - [`TableScan`] — a rewindable sequential scan over one table's rows.
//! - [`Catalog`] — per-table schema, page-count, and name metadata, plus scan
//!   construction.
//!
//! [`MemCatalog`] is a complete in-memory implementation. Tests use it as a
//! fixture, and an embedder without a disk engine can use it as-is.

pub mod mem;

pub use mem::{MemCatalog, MemTable};

use granite_error::Result;
use granite_types::{ColumnType, TableId, Value};

/// One materialized row: column values in schema order.
pub type Row = Vec<Value>;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Ordered column types of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnType>,
}

impl Schema {
    /// Build a schema from column types in order.
    #[must_use]
    pub fn new(columns: Vec<ColumnType>) -> Self {
        Self { columns }
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Declared type of column `idx`, or `None` when out of range.
    #[inline]
    #[must_use]
    pub fn column_type(&self, idx: usize) -> Option<ColumnType> {
        self.columns.get(idx).copied()
    }

    /// Iterate column types in order.
    pub fn iter(&self) -> impl Iterator<Item = ColumnType> + '_ {
        self.columns.iter().copied()
    }
}

// ---------------------------------------------------------------------------
// TableScan
// ---------------------------------------------------------------------------

/// A rewindable sequential scan over one table.
///
/// Usage protocol: `open` before the first `next`, `rewind` to restart from
/// the first row, `close` when done. Implementations report storage failures
/// through `GraniteError::ScanFailure`; callers propagate rather than retry.
pub trait TableScan: Send {
    /// Prepare the scan. Must be called before `next` or `rewind`.
    fn open(&mut self) -> Result<()>;

    /// Produce the next row, or `None` once the table is exhausted.
    fn next(&mut self) -> Result<Option<Row>>;

    /// Restart the scan from the first row. The scan must be open.
    fn rewind(&mut self) -> Result<()>;

    /// Release any resources held by the scan.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Per-table metadata supplied by the surrounding engine.
pub trait Catalog: Send + Sync {
    /// All table ids currently known, in stable order.
    fn table_ids(&self) -> Vec<TableId>;

    /// The name of table `table`.
    fn table_name(&self, table: TableId) -> Result<String>;

    /// The ordered column types of table `table`.
    fn schema(&self, table: TableId) -> Result<Schema>;

    /// Number of physical pages the table occupies.
    fn page_count(&self, table: TableId) -> Result<u64>;

    /// Construct a fresh sequential scan over table `table`.
    fn scan(&self, table: TableId) -> Result<Box<dyn TableScan>>;
}
