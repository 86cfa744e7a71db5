//! In-memory [`Catalog`] implementation.
//!
//! Rows live in an `Arc<Vec<Row>>` snapshot per table, so scans stay valid
//! while the catalog is mutated concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use granite_error::{GraniteError, Result};
use granite_types::TableId;

use crate::{Catalog, Row, Schema, TableScan};

/// One in-memory table: name, schema, page-count metadata, and rows.
#[derive(Debug, Clone)]
pub struct MemTable {
    name: String,
    schema: Schema,
    page_count: u64,
    rows: Arc<Vec<Row>>,
}

impl MemTable {
    /// Build a table. `page_count` is taken as given; the in-memory catalog
    /// does not model physical pages.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Schema, page_count: u64, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            schema,
            page_count,
            rows: Arc::new(rows),
        }
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// In-memory catalog keyed by [`TableId`].
#[derive(Debug, Default)]
pub struct MemCatalog {
    tables: RwLock<BTreeMap<TableId, MemTable>>,
}

impl MemCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` under `id`, replacing any previous table with that id.
    pub fn add_table(&self, id: TableId, table: MemTable) {
        self.tables.write().insert(id, table);
    }

    fn with_table<T>(&self, id: TableId, f: impl FnOnce(&MemTable) -> T) -> Result<T> {
        let tables = self.tables.read();
        let table = tables.get(&id).ok_or_else(|| GraniteError::NoSuchTable {
            name: id.to_string(),
        })?;
        Ok(f(table))
    }
}

impl Catalog for MemCatalog {
    fn table_ids(&self) -> Vec<TableId> {
        self.tables.read().keys().copied().collect()
    }

    fn table_name(&self, table: TableId) -> Result<String> {
        self.with_table(table, |t| t.name.clone())
    }

    fn schema(&self, table: TableId) -> Result<Schema> {
        self.with_table(table, |t| t.schema.clone())
    }

    fn page_count(&self, table: TableId) -> Result<u64> {
        self.with_table(table, |t| t.page_count)
    }

    fn scan(&self, table: TableId) -> Result<Box<dyn TableScan>> {
        let rows = self.with_table(table, |t| Arc::clone(&t.rows))?;
        Ok(Box::new(MemScan {
            rows,
            pos: 0,
            open: false,
        }))
    }
}

/// Sequential scan over a row snapshot.
struct MemScan {
    rows: Arc<Vec<Row>>,
    pos: usize,
    open: bool,
}

impl MemScan {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(GraniteError::ScanFailure {
                detail: "scan used before open()".to_owned(),
            })
        }
    }
}

impl TableScan for MemScan {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        self.pos = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        self.ensure_open()?;
        let row = self.rows.get(self.pos).cloned();
        if row.is_some() {
            self.pos += 1;
        }
        Ok(row)
    }

    fn rewind(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.pos = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }
}
