//! Published ledger views
//!
//! The writer thread publishes each successor snapshot into a shared
//! cell; any number of readers clone the current `Arc` out of it. Locks
//! are held only for the pointer swap or clone, never while applying a
//! transaction or rendering a view.

use std::sync::Arc;

use parking_lot::RwLock;

use types::ledger::LedgerSnapshot;

/// Cell the replica publishes successor snapshots into.
#[derive(Debug)]
pub(crate) struct SnapshotCell {
    current: RwLock<Arc<LedgerSnapshot>>,
}

impl SnapshotCell {
    pub(crate) fn new(snapshot: Arc<LedgerSnapshot>) -> Self {
        Self {
            current: RwLock::new(snapshot),
        }
    }

    pub(crate) fn publish(&self, snapshot: Arc<LedgerSnapshot>) {
        *self.current.write() = snapshot;
    }

    pub(crate) fn load(&self) -> Arc<LedgerSnapshot> {
        Arc::clone(&self.current.read())
    }
}

/// Read handle onto a replica's latest published snapshot.
///
/// Cloning is cheap and every clone observes the same replica. The
/// returned snapshot is frozen: a reader holding one sees a consistent
/// ledger no matter how far the writer advances in the meantime.
#[derive(Debug, Clone)]
pub struct LedgerView {
    cell: Arc<SnapshotCell>,
}

impl LedgerView {
    pub(crate) fn new(cell: Arc<SnapshotCell>) -> Self {
        Self { cell }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<LedgerSnapshot> {
        self.cell.load()
    }
}
