use crate::types::{CanonicalRecord, RecordStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Failure reported by a canonical store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("note store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("note {0} not found")]
    NotFound(Uuid),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// Selection of records for [`CanonicalStore::query`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub status: Option<RecordStatus>,
    pub untriaged_only: bool,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Active, untriaged notes: the resurfacing candidates.
    pub fn inbox() -> Self {
        Self {
            status: Some(RecordStatus::Active),
            untriaged_only: true,
            limit: None,
        }
    }

    pub fn with_status(status: RecordStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        !(self.untriaged_only && record.is_triaged)
    }
}

/// The durable home of notes once they leave the capture buffer.
///
/// Implementations must make `commit_batch` all-or-nothing. Records come back
/// from `query` ordered by `created_at`, oldest first.
pub trait CanonicalStore {
    /// Commit every record or none. Returns how many rows were newly created.
    fn commit_batch(&self, records: &[CanonicalRecord]) -> Result<usize, StoreError>;

    fn query(&self, filter: &RecordFilter) -> Result<Vec<CanonicalRecord>, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<CanonicalRecord>, StoreError>;

    /// Overwrite the mutable fields of an existing record.
    fn update(&self, record: &CanonicalRecord) -> Result<(), StoreError>;
}

impl<T: CanonicalStore + ?Sized> CanonicalStore for &T {
    fn commit_batch(&self, records: &[CanonicalRecord]) -> Result<usize, StoreError> {
        (**self).commit_batch(records)
    }

    fn query(&self, filter: &RecordFilter) -> Result<Vec<CanonicalRecord>, StoreError> {
        (**self).query(filter)
    }

    fn get(&self, id: Uuid) -> Result<Option<CanonicalRecord>, StoreError> {
        (**self).get(id)
    }

    fn update(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        (**self).update(record)
    }
}

/// In-process [`CanonicalStore`] with the same commit semantics as the SQLite
/// store. Used by tests and hosts that keep notes elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CanonicalRecord>>,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent commits fail without writing anything.
    pub fn set_failing(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CanonicalRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("commit refused")]
struct CommitRefused;

impl CanonicalStore for MemoryStore {
    fn commit_batch(&self, records: &[CanonicalRecord]) -> Result<usize, StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::backend(CommitRefused));
        }
        let mut rows = self.lock();
        let mut created = 0;
        for record in records {
            if rows.iter().all(|r| r.id != record.id) {
                rows.push(record.clone());
                created += 1;
            }
        }
        Ok(created)
    }

    fn query(&self, filter: &RecordFilter) -> Result<Vec<CanonicalRecord>, StoreError> {
        let mut out: Vec<_> = self
            .lock()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn get(&self, id: Uuid) -> Result<Option<CanonicalRecord>, StoreError> {
        Ok(self.lock().iter().find(|r| r.id == id).cloned())
    }

    fn update(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        let mut rows = self.lock();
        let row = rows
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StoreError::NotFound(record.id))?;
        *row = record.clone();
        Ok(())
    }
}
