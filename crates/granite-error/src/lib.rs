//! Primary error type for GraniteDB core operations.
//!
//! One enum for the whole workspace: lock-manager aborts, statistics lookup
//! failures, and scan propagation all surface as [`GraniteError`]. Variants
//! carry structured fields rather than pre-formatted strings so callers can
//! match on them.

use granite_types::{ColumnType, TxnId};
use thiserror::Error;

/// Errors surfaced by the lock manager and the statistics engine.
#[derive(Error, Debug)]
pub enum GraniteError {
    // === Lock manager ===
    /// A blocked lock request was cancelled because its owning transaction
    /// was aborted or timed out while waiting.
    #[error("transaction {txn} aborted while waiting for a page lock")]
    Aborted { txn: TxnId },

    // === Statistics ===
    /// Selectivity was requested for a column index outside the table schema.
    #[error("no column {column} in a table with {width} columns")]
    InvalidColumn { column: usize, width: usize },

    /// The probe value's type does not match the column's declared type.
    #[error("type mismatch on column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: usize,
        expected: ColumnType,
        actual: ColumnType,
    },

    /// The underlying table scan failed during statistics construction.
    #[error("table scan failed: {detail}")]
    ScanFailure { detail: String },

    /// A plan-costing query asked for statistics that were never computed.
    #[error("no statistics computed for table: {name}")]
    NoStatistics { name: String },

    // === Catalog ===
    /// The catalog has no table with the given identifier or name.
    #[error("no such table: {name}")]
    NoSuchTable { name: String },
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, GraniteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        let e = GraniteError::Aborted {
            txn: TxnId::new(9).unwrap(),
        };
        assert_eq!(
            e.to_string(),
            "transaction txn9 aborted while waiting for a page lock"
        );

        let e = GraniteError::InvalidColumn {
            column: 5,
            width: 3,
        };
        assert_eq!(e.to_string(), "no column 5 in a table with 3 columns");

        let e = GraniteError::NoStatistics {
            name: "orders".into(),
        };
        assert_eq!(e.to_string(), "no statistics computed for table: orders");
    }
}
