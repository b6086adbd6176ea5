//! Test repositories: in-memory and failing `Repository` implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use talentradar_core::error::DomainError;
use talentradar_core::repository::{
    Record, Repository, Snapshot, SnapshotQuery, SnapshotWrite, StoredEvent, Transaction,
};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct Store {
    events: Vec<StoredEvent>,
    snapshots: HashMap<(String, Uuid), Snapshot>,
}

impl Store {
    fn apply(&mut self, record: Record) -> Result<(), DomainError> {
        match record {
            Record::Event(event) => self.append(event),
            Record::Snapshot(write) => self.upsert(write),
        }
    }

    fn append(&mut self, event: StoredEvent) -> Result<(), DomainError> {
        let latest = self
            .events
            .iter()
            .filter(|e| e.aggregate_id == event.aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(0);
        if event.version <= latest {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: event.aggregate_id,
                expected: event.version - 1,
                actual: latest,
            });
        }
        self.events.push(event);
        Ok(())
    }

    fn upsert(&mut self, write: SnapshotWrite) -> Result<(), DomainError> {
        let SnapshotWrite {
            mut snapshot,
            expected_version,
        } = write;
        let key = (snapshot.table.clone(), snapshot.id);
        let existing = self.snapshots.get(&key);
        let actual = existing.map_or(0, |s| s.version);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: snapshot.id,
                expected: expected_version,
                actual,
            });
        }
        if let Some(existing) = existing {
            snapshot.created_at = existing.created_at;
        }
        self.snapshots.insert(key, snapshot);
        Ok(())
    }
}

/// A repository that keeps the event log and snapshot tables in memory.
///
/// Transactions stage their records and apply them atomically on commit,
/// with the same version checks the Postgres adapter enforces. Clones share
/// the same store, so a test can keep one handle for assertions while the
/// context owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<Mutex<Store>>,
    fail_commits: Arc<AtomicBool>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent commit fail with an infrastructure error
    /// (or succeed again when `fail` is `false`).
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Inserts a snapshot row directly, bypassing the version check.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_snapshot(&self, snapshot: Snapshot) {
        self.store
            .lock()
            .unwrap()
            .snapshots
            .insert((snapshot.table.clone(), snapshot.id), snapshot);
    }

    /// Returns every event in append order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<StoredEvent> {
        self.store.lock().unwrap().events.clone()
    }

    /// Returns the events of one aggregate in version order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events_for(&self, aggregate_id: Uuid) -> Vec<StoredEvent> {
        let mut events: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        events
    }

    /// Returns the event types appended so far, in append order.
    pub fn event_types(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event_type).collect()
    }

    /// Returns one snapshot row.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshot(&self, table: &str, id: Uuid) -> Option<Snapshot> {
        self.store
            .lock()
            .unwrap()
            .snapshots
            .get(&(table.to_owned(), id))
            .cloned()
    }

    /// Returns every snapshot row of `table`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshots(&self, table: &str) -> Vec<Snapshot> {
        let mut rows: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .snapshots
            .values()
            .filter(|s| s.table == table)
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.created_at, s.id));
        rows
    }

    /// Number of events in the log.
    pub fn event_count(&self) -> usize {
        self.events().len()
    }

    /// Number of snapshot rows across every table.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshot_count(&self) -> usize {
        self.store.lock().unwrap().snapshots.len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn load(&self, table: &str, id: Uuid) -> Result<Option<Snapshot>, DomainError> {
        Ok(self.snapshot(table, id))
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.events_for(aggregate_id))
    }

    async fn find(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>, DomainError> {
        Ok(self
            .snapshots(&query.table)
            .into_iter()
            .filter(|s| query.matches(s))
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError> {
        Ok(Box::new(InMemoryTransaction {
            repo: self.clone(),
            staged: Vec::new(),
        }))
    }
}

struct InMemoryTransaction {
    repo: InMemoryRepository,
    staged: Vec<Record>,
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn save(&mut self, record: Record) -> Result<(), DomainError> {
        self.staged.push(record);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let Self { repo, staged } = *self;
        if repo.fail_commits.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("connection refused".into()));
        }
        let mut store = repo
            .store
            .lock()
            .map_err(|_| DomainError::Infrastructure("store lock poisoned".into()))?;
        // Apply to a copy so a conflict halfway through leaves nothing behind.
        let mut next = store.clone();
        for record in staged {
            next.apply(record)?;
        }
        *store = next;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        tracing::debug!(discarded = self.staged.len(), "in-memory transaction rolled back");
        Ok(())
    }
}

/// A repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingRepository;

#[async_trait]
impl Repository for FailingRepository {
    async fn load(&self, _table: &str, _id: Uuid) -> Result<Option<Snapshot>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn find(&self, _query: &SnapshotQuery) -> Result<Vec<Snapshot>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
