//! Page-level two-phase locking.
//!
//! Transactions acquire shared or exclusive locks on pages through a
//! process-wide [`LockManager`] before touching page contents, and release
//! them (all at once or page by page) when they complete. The per-page state
//! machine lives in [`PageLock`]; it supports in-place upgrade from shared to
//! exclusive for a sole shared holder.
//!
//! The manager performs no deadlock detection. An external watchdog aborts a
//! stuck transaction by cancelling the [`CancellationToken`] passed to
//! `lock()`, which makes the blocked call return `GraniteError::Aborted`.

pub mod cancel;
pub mod manager;
pub mod page_lock;

pub use cancel::CancellationToken;
pub use manager::{LockManager, LOCK_TABLE_SHARDS};
pub use page_lock::PageLock;
