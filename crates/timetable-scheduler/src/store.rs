use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::types::ScheduleEntry;

/// Authoritative, versioned list of routine entries.
///
/// Readers clone an `Arc` of the current version and never see a write in
/// progress. Writers serialise through a single gate: a [`StoreTxn`] works on
/// a private copy and publishes it on [`StoreTxn::commit`].
pub struct EntryStore {
    current: RwLock<Arc<Vec<ScheduleEntry>>>,
    write_gate: Mutex<()>,
}

impl EntryStore {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self {
            current: RwLock::new(Arc::new(entries)),
            write_gate: Mutex::new(()),
        }
    }

    /// The current version. Stays valid (and unchanged) after later commits.
    pub fn snapshot(&self) -> Arc<Vec<ScheduleEntry>> {
        Arc::clone(&self.current.read())
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<ScheduleEntry> {
        self.snapshot().iter().find(|e| e.id == id).cloned()
    }

    /// Owned copies of every entry matching `pred`, in commit order.
    pub fn query<F>(&self, pred: F) -> Vec<ScheduleEntry>
    where
        F: Fn(&ScheduleEntry) -> bool,
    {
        self.snapshot().iter().filter(|e| pred(*e)).cloned().collect()
    }

    /// Open a write transaction. Blocks while another writer holds the gate.
    pub fn begin(&self) -> StoreTxn<'_> {
        let gate = self.write_gate.lock();
        // Taken after the gate so no other writer can publish in between.
        let working = (*self.snapshot()).clone();
        StoreTxn {
            store: self,
            _gate: gate,
            working,
        }
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Exclusive write access to an [`EntryStore`].
///
/// Dropping a transaction without committing discards its changes.
pub struct StoreTxn<'a> {
    store: &'a EntryStore,
    _gate: MutexGuard<'a, ()>,
    working: Vec<ScheduleEntry>,
}

impl StoreTxn<'_> {
    /// The working copy, including this transaction's uncommitted changes.
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.working
    }

    pub fn get(&self, id: &str) -> Option<&ScheduleEntry> {
        self.working.iter().find(|e| e.id == id)
    }

    pub fn insert(&mut self, entry: ScheduleEntry) {
        self.working.push(entry);
    }

    /// Swap in `entry` at the position of the entry with the same id.
    /// Returns the previous version, or `None` if no such entry exists.
    pub fn replace(&mut self, entry: ScheduleEntry) -> Option<ScheduleEntry> {
        let slot = self.working.iter_mut().find(|e| e.id == entry.id)?;
        Some(std::mem::replace(slot, entry))
    }

    pub fn remove(&mut self, id: &str) -> Option<ScheduleEntry> {
        let pos = self.working.iter().position(|e| e.id == id)?;
        Some(self.working.remove(pos))
    }

    /// Publish the working copy as the store's new version.
    pub fn commit(self) {
        *self.store.current.write() = Arc::new(self.working);
    }
}
