//! Process-wide page → lock registry.
//!
//! Sharded into [`LOCK_TABLE_SHARDS`] buckets to keep registry operations off
//! each other's necks; the blocking itself happens inside the per-page
//! [`PageLock`], never under a shard mutex.
//!
//! Entries are created lazily on the first request for a page and evicted
//! once the page returns to unlocked with no waiters and no in-flight
//! request pinning the entry, so the table tracks the working set instead of
//! every page ever touched.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use granite_error::Result;
use granite_types::{PageNumber, Permission, TxnId};

use crate::cancel::CancellationToken;
use crate::page_lock::PageLock;

/// Number of shards in the lock table (power of 2 for fast modular indexing).
pub const LOCK_TABLE_SHARDS: usize = 64;

type Shard = Mutex<HashMap<PageNumber, Arc<PageLock>>>;

/// Two-phase-locking lock manager over pages.
///
/// An explicitly owned service object: construct one per engine instance and
/// hand it to the transaction executor. Lock ordering inside: shard mutex
/// first, page state mutex second, never the reverse.
pub struct LockManager {
    shards: Box<[Shard; LOCK_TABLE_SHARDS]>,
}

impl LockManager {
    /// Create an empty lock manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shards: Box::new(std::array::from_fn(|_| Mutex::new(HashMap::new()))),
        }
    }

    /// Acquire the lock on `page` for `txn` in the mode `perm` maps to
    /// (`ReadOnly` → shared, `ReadWrite` → exclusive).
    ///
    /// Blocks until granted. Returns immediately when `txn` already holds the
    /// page in a mode at least as strong as requested. Fails with
    /// `GraniteError::Aborted` when `cancel` fires while waiting; the page
    /// state is left exactly as it was.
    pub fn lock(
        &self,
        txn: TxnId,
        page: PageNumber,
        perm: Permission,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let entry = {
            let mut map = self.shards[self.shard_index(page)].lock();
            let entry = Arc::clone(
                map.entry(page)
                    .or_insert_with(|| Arc::new(PageLock::new())),
            );
            // Pin under the shard mutex so eviction cannot race the clone.
            entry.pin();
            entry
        };

        let result = entry.acquire(txn, perm, cancel);
        entry.unpin();
        if result.is_err() {
            // An aborted waiter may have been the entry's last user.
            self.maybe_evict(page);
        }
        result
    }

    /// Release whatever lock `txn` holds on `page`. No-op when it holds
    /// nothing. Wakes all waiters on that page.
    pub fn unlock(&self, txn: TxnId, page: PageNumber) {
        let mut map = self.shards[self.shard_index(page)].lock();
        let Some(entry) = map.get(&page) else {
            return;
        };
        let idle = entry.release(txn);
        if idle && entry.pinned() == 0 {
            debug!(%page, "evicting idle lock entry");
            map.remove(&page);
        }
    }

    /// Release every lock `txn` holds, across all pages.
    ///
    /// The transaction-complete path: two-phase locking releases everything
    /// at once at commit or abort.
    pub fn unlock_all(&self, txn: TxnId) {
        for shard in self.shards.iter() {
            let mut map = shard.lock();
            map.retain(|_, entry| {
                let idle = entry.release(txn);
                !(idle && entry.pinned() == 0)
            });
        }
    }

    /// Whether `txn` holds a lock on `page` in any mode. Never blocks.
    #[must_use]
    pub fn holds_lock(&self, txn: TxnId, page: PageNumber) -> bool {
        let map = self.shards[self.shard_index(page)].lock();
        map.get(&page).is_some_and(|entry| entry.holds(txn))
    }

    /// Number of live lock-table entries across all shards.
    ///
    /// Diagnostic: stays bounded by the working set because idle entries are
    /// evicted.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    fn maybe_evict(&self, page: PageNumber) {
        let mut map = self.shards[self.shard_index(page)].lock();
        if let Some(entry) = map.get(&page) {
            if entry.pinned() == 0 && entry.is_idle() {
                debug!(%page, "evicting idle lock entry");
                map.remove(&page);
            }
        }
    }

    #[allow(clippy::unused_self)]
    fn shard_index(&self, page: PageNumber) -> usize {
        (page.get() as usize) & (LOCK_TABLE_SHARDS - 1)
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("entry_count", &self.entry_count())
            .finish()
    }
}
