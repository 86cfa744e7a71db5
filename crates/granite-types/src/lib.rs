//! Cross-cutting types for the GraniteDB core.
//!
//! This crate defines the opaque identifiers the lock manager and the
//! statistics engine are keyed by (`PageNumber`, `TxnId`, `TableId`), the
//! lock-mode and permission enums, and the column value model the catalog
//! collaborator hands back during table scans.

use std::fmt;
use std::num::NonZeroU64;

// ---------------------------------------------------------------------------
// PageNumber
// ---------------------------------------------------------------------------

/// A physical page identifier supplied by the storage layer.
///
/// Page numbers are 1-based; 0 is reserved so the identifier packs into a
/// `NonZeroU64` and `Option<PageNumber>` stays word-sized.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct PageNumber(NonZeroU64);

impl PageNumber {
    /// Create a new page number from a raw u64.
    ///
    /// Returns `None` if `n` is 0.
    #[inline]
    pub const fn new(n: u64) -> Option<Self> {
        match NonZeroU64::new(n) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Get the raw u64 value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TxnId
// ---------------------------------------------------------------------------

/// An in-flight transaction identifier, unique for the transaction's lifetime.
///
/// Allocated by the transaction-management layer; this core only compares and
/// hashes it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct TxnId(NonZeroU64);

impl TxnId {
    /// Construct a `TxnId` from a raw u64. Returns `None` for 0.
    #[inline]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Get the raw u64 value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TableId
// ---------------------------------------------------------------------------

/// Catalog-assigned table identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct TableId(pub u32);

impl TableId {
    /// Get the raw u32 value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Lock modes and permissions
// ---------------------------------------------------------------------------

/// Mode of a page lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// No transaction holds the page.
    Unlocked,
    /// One or more transactions hold the page for reading.
    Shared,
    /// Exactly one transaction holds the page for writing.
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlocked => f.write_str("unlocked"),
            Self::Shared => f.write_str("shared"),
            Self::Exclusive => f.write_str("exclusive"),
        }
    }
}

/// Access permission requested by an operator when it touches a page.
///
/// The lock manager maps `ReadOnly` to a shared lock and `ReadWrite` to an
/// exclusive lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    /// The lock mode this permission acquires.
    #[inline]
    #[must_use]
    pub fn lock_mode(self) -> LockMode {
        match self {
            Self::ReadOnly => LockMode::Shared,
            Self::ReadWrite => LockMode::Exclusive,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate operators
// ---------------------------------------------------------------------------

/// Comparison operator in a `column op constant` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PredicateOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
}

impl fmt::Display for PredicateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEq => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEq => ">=",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Column values
// ---------------------------------------------------------------------------

/// Declared type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
    Integer,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("INTEGER"),
            Self::Text => f.write_str("TEXT"),
        }
    }
}

/// A typed column value produced by a table scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    /// The column type this value inhabits.
    #[inline]
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Integer(_) => ColumnType::Integer,
            Self::Text(_) => ColumnType::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}
