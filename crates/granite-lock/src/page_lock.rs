//! Per-page lock state machine.
//!
//! State invariants:
//! - `mode == Exclusive` ⇒ exactly one owner
//! - `mode == Shared` ⇒ at least one owner
//! - `mode == Unlocked` ⇔ no owners
//!
//! Waiters are woken broadcast-style (`notify_all`, re-check under the state
//! mutex). No fairness or starvation-freedom is guaranteed; callers that need
//! bounded waiting abort via the cancellation token.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use granite_error::{GraniteError, Result};
use granite_types::{LockMode, Permission, TxnId};

use crate::cancel::CancellationToken;

/// Upper bound on one condvar sleep. Bounds how stale an unobserved
/// cancellation can get; wakes from `notify_all` arrive earlier.
const WAIT_SLICE: Duration = Duration::from_millis(5);

struct LockState {
    owners: HashSet<TxnId>,
    mode: LockMode,
    /// Transactions currently parked on the condvar.
    waiters: usize,
}

/// Lock state for a single page.
///
/// Created lazily by [`crate::LockManager`] on the first request for a page
/// and evicted once the page is unlocked with no waiters or pinned requests.
pub struct PageLock {
    state: Mutex<LockState>,
    cond: Condvar,
    /// In-flight `lock()` calls holding a reference to this entry. Guards
    /// eviction: an entry may only leave the manager's table at zero pins.
    pins: AtomicUsize,
}

impl PageLock {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LockState {
                owners: HashSet::new(),
                mode: LockMode::Unlocked,
                waiters: 0,
            }),
            cond: Condvar::new(),
            pins: AtomicUsize::new(0),
        }
    }

    /// Block until `txn` holds the page in at least the mode `perm` maps to,
    /// or until `cancel` fires.
    ///
    /// Grant rules (two-phase locking with in-place upgrade):
    /// - Shared request: granted unless another transaction holds Exclusive.
    ///   No-op when `txn` already owns the page in any mode.
    /// - Exclusive request: granted when the page is unlocked, when `txn`
    ///   already holds Exclusive, or when `txn` is the sole owner (upgrade
    ///   in place). A shared holder among several keeps its shared seat and
    ///   waits for the others to release.
    pub(crate) fn acquire(
        &self,
        txn: TxnId,
        perm: Permission,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut state = self.state.lock();
        loop {
            match perm {
                Permission::ReadOnly => {
                    // Already an owner: holds Shared or Exclusive, both ≥ Shared.
                    if state.owners.contains(&txn) {
                        return Ok(());
                    }
                    if state.mode != LockMode::Exclusive {
                        state.owners.insert(txn);
                        state.mode = LockMode::Shared;
                        return Ok(());
                    }
                }
                Permission::ReadWrite => {
                    if state.owners.contains(&txn) {
                        if state.mode == LockMode::Exclusive {
                            return Ok(());
                        }
                        if state.owners.len() == 1 {
                            // Sole shared holder: upgrade without releasing.
                            state.mode = LockMode::Exclusive;
                            return Ok(());
                        }
                        // Other shared holders present. Keep our shared seat
                        // (dropping it would forfeit our place and reopen the
                        // upgrade race) and wait for them to release.
                    } else if state.mode == LockMode::Unlocked {
                        state.owners.insert(txn);
                        state.mode = LockMode::Exclusive;
                        return Ok(());
                    }
                }
            }

            if cancel.is_cancelled() {
                debug!(%txn, "lock wait cancelled");
                return Err(GraniteError::Aborted { txn });
            }

            state.waiters += 1;
            // Timed wait so a cancellation with no accompanying wake is still
            // observed within WAIT_SLICE. Spurious wakes just re-check.
            let _ = self.cond.wait_for(&mut state, WAIT_SLICE);
            state.waiters -= 1;
        }
    }

    /// Remove `txn` from the owner set. No-op when `txn` holds nothing.
    ///
    /// Returns `true` when the page is now unlocked with no waiters, meaning
    /// the entry is eligible for eviction (subject to the pin count).
    pub(crate) fn release(&self, txn: TxnId) -> bool {
        let mut state = self.state.lock();
        state.owners.remove(&txn);
        if state.owners.is_empty() {
            state.mode = LockMode::Unlocked;
        }
        // Wake everyone; each waiter re-evaluates the grant rules.
        self.cond.notify_all();
        state.owners.is_empty() && state.waiters == 0
    }

    /// Whether `txn` currently owns this page in any mode.
    pub(crate) fn holds(&self, txn: TxnId) -> bool {
        self.state.lock().owners.contains(&txn)
    }

    /// Current lock mode.
    #[must_use]
    pub fn mode(&self) -> LockMode {
        self.state.lock().mode
    }

    /// Number of owning transactions.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.state.lock().owners.len()
    }

    /// Unlocked with no parked waiters.
    pub(crate) fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.owners.is_empty() && state.waiters == 0
    }

    pub(crate) fn pin(&self) {
        self.pins.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn unpin(&self) {
        self.pins.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn pinned(&self) -> usize {
        self.pins.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PageLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PageLock")
            .field("mode", &state.mode)
            .field("owners", &state.owners.len())
            .field("waiters", &state.waiters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(n: u64) -> TxnId {
        TxnId::new(n).unwrap()
    }

    fn token() -> CancellationToken {
        CancellationToken::new()
    }

    #[test]
    fn shared_then_shared_coexist() {
        let lock = PageLock::new();
        lock.acquire(txn(1), Permission::ReadOnly, &token()).unwrap();
        lock.acquire(txn(2), Permission::ReadOnly, &token()).unwrap();
        assert_eq!(lock.mode(), LockMode::Shared);
        assert_eq!(lock.owner_count(), 2);
    }

    #[test]
    fn exclusive_on_unlocked_page() {
        let lock = PageLock::new();
        lock.acquire(txn(1), Permission::ReadWrite, &token()).unwrap();
        assert_eq!(lock.mode(), LockMode::Exclusive);
        assert_eq!(lock.owner_count(), 1);
    }

    #[test]
    fn sole_shared_holder_upgrades_in_place() {
        let lock = PageLock::new();
        lock.acquire(txn(1), Permission::ReadOnly, &token()).unwrap();
        lock.acquire(txn(1), Permission::ReadWrite, &token()).unwrap();
        assert_eq!(lock.mode(), LockMode::Exclusive);
        assert_eq!(lock.owner_count(), 1);
        assert!(lock.holds(txn(1)));
    }

    #[test]
    fn shared_request_is_noop_for_exclusive_holder() {
        let lock = PageLock::new();
        lock.acquire(txn(1), Permission::ReadWrite, &token()).unwrap();
        lock.acquire(txn(1), Permission::ReadOnly, &token()).unwrap();
        // Still exclusive: the held mode dominates the request.
        assert_eq!(lock.mode(), LockMode::Exclusive);
    }

    #[test]
    fn release_resets_to_unlocked() {
        let lock = PageLock::new();
        lock.acquire(txn(1), Permission::ReadOnly, &token()).unwrap();
        lock.acquire(txn(2), Permission::ReadOnly, &token()).unwrap();
        assert!(!lock.release(txn(1)));
        assert_eq!(lock.mode(), LockMode::Shared);
        assert!(lock.release(txn(2)));
        assert_eq!(lock.mode(), LockMode::Unlocked);
        assert_eq!(lock.owner_count(), 0);
    }

    #[test]
    fn release_of_non_owner_is_noop() {
        let lock = PageLock::new();
        lock.acquire(txn(1), Permission::ReadWrite, &token()).unwrap();
        lock.release(txn(2));
        assert!(lock.holds(txn(1)));
        assert_eq!(lock.mode(), LockMode::Exclusive);
    }

    #[test]
    fn cancelled_waiter_gets_aborted() {
        let lock = PageLock::new();
        lock.acquire(txn(1), Permission::ReadWrite, &token()).unwrap();

        let cancel = token();
        cancel.cancel();
        let err = lock.acquire(txn(2), Permission::ReadOnly, &cancel).unwrap_err();
        assert!(matches!(err, GraniteError::Aborted { .. }));

        // Holder state is untouched by the aborted request.
        assert!(lock.holds(txn(1)));
        assert!(!lock.holds(txn(2)));
    }
}
