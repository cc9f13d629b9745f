use chrono::TimeZone;
use flashnote_core::{CanonicalRecord, CanonicalStore, StoreError};
use flashnote_ledger::{EntryLog, FlushedIdSet, LogError};
use flashnote_resurface::{DeliveryService, PlanOutcome, ReminderPlanner};
use flashnote_store::StorePaths;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum FlushError {
    #[error("reading capture buffer: {0}")]
    Log(#[from] LogError),
    #[error("reading flush marker ({}): {source}", path.display())]
    Marker {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Nothing was committed and the buffer is intact; retry later.
    #[error("committing captured notes: {0}")]
    Commit(#[from] StoreError),
}

/// What one flush did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Records committed by this flush, in capture order.
    pub committed: Vec<CanonicalRecord>,
    /// Rows the store reported as newly created.
    pub created: usize,
    /// Entries skipped because an earlier, interrupted flush already committed them.
    pub already_flushed: usize,
    /// Ids of those skipped entries, in capture order. They are in the store
    /// but may never have been planned.
    pub recovered: Vec<Uuid>,
    /// False if the buffer could not be cleared; the marker is kept so the
    /// next flush skips what was committed here.
    pub log_cleared: bool,
}

impl FlushReport {
    pub fn is_noop(&self) -> bool {
        self.committed.is_empty() && self.already_flushed == 0
    }
}

/// Drains the capture buffer into a canonical store exactly once per entry.
///
/// Commit happens before clear, so a crash can only cause a replay. The
/// flushed-id marker written between the two lets the replay recognise and
/// skip what is already stored. Not reentrant: callers run one flush at a time.
pub struct FlushCoordinator<S> {
    log: EntryLog,
    marker_path: PathBuf,
    store: S,
}

impl<S: CanonicalStore> FlushCoordinator<S> {
    pub fn new(log: EntryLog, marker_path: impl Into<PathBuf>, store: S) -> Self {
        Self {
            log,
            marker_path: marker_path.into(),
            store,
        }
    }

    pub fn open(paths: &StorePaths, store: S) -> Self {
        Self::new(EntryLog::open(paths), &paths.flushed_ids_json, store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn log(&self) -> &EntryLog {
        &self.log
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    pub fn flush(&self) -> Result<FlushReport, FlushError> {
        let entries = self.log.read_all()?;
        if entries.is_empty() {
            return Ok(FlushReport {
                log_cleared: true,
                ..FlushReport::default()
            });
        }

        let mut flushed = FlushedIdSet::load(&self.marker_path).map_err(|source| {
            FlushError::Marker {
                path: self.marker_path.clone(),
                source,
            }
        })?;
        let (recovered, pending): (Vec<_>, Vec<_>) =
            entries.iter().partition(|e| flushed.contains(&e.id()));
        let pending: Vec<CanonicalRecord> =
            pending.into_iter().map(CanonicalRecord::from_entry).collect();
        let recovered: Vec<Uuid> = recovered.into_iter().map(|e| e.id()).collect();
        if !recovered.is_empty() {
            tracing::info!(
                already_flushed = recovered.len(),
                "skipping entries committed by an interrupted flush"
            );
        }

        let mut report = FlushReport {
            already_flushed: recovered.len(),
            recovered,
            ..FlushReport::default()
        };

        if !pending.is_empty() {
            report.created = self.store.commit_batch(&pending).map_err(|e| {
                tracing::error!(entries = pending.len(), error = %e, "flush commit failed, buffer kept");
                e
            })?;

            flushed.extend(pending.iter().map(|r| r.id));
            if let Err(e) = flushed.save(&self.marker_path) {
                tracing::warn!(
                    path = %self.marker_path.display(),
                    error = %e,
                    "cannot write flush marker, a crash before clear may duplicate notes"
                );
            }
            report.committed = pending;
        }

        report.log_cleared = self.finish();
        tracing::info!(
            committed = report.committed.len(),
            created = report.created,
            already_flushed = report.already_flushed,
            "flushed capture buffer"
        );
        Ok(report)
    }

    /// Flush, then plan a reminder for every record this flush committed or
    /// recovered from an interrupted run.
    ///
    /// Plans from the stored row, which may be ahead of the buffered entry
    /// when a replay was absorbed by the store. Reminder ids are
    /// deterministic, so planning a record twice replaces rather than adds.
    pub fn flush_and_plan<D, Tz>(
        &self,
        planner: &ReminderPlanner<D, Tz>,
    ) -> Result<(FlushReport, Vec<PlanOutcome>), FlushError>
    where
        D: DeliveryService,
        Tz: TimeZone,
    {
        let report = self.flush()?;
        let ids = report
            .committed
            .iter()
            .map(|r| r.id)
            .chain(report.recovered.iter().copied());
        let mut outcomes = Vec::with_capacity(report.committed.len() + report.recovered.len());
        for id in ids {
            match self.store.get(id) {
                Ok(Some(record)) => outcomes.push(planner.plan(&record)),
                Ok(None) => tracing::warn!(%id, "flushed note missing from store, not planning"),
                Err(e) => tracing::warn!(%id, error = %e, "cannot read flushed note, not planning"),
            }
        }
        Ok((report, outcomes))
    }

    /// Clear the buffer, then drop the marker. If the clear fails the marker
    /// must survive, or the next flush would commit everything again.
    fn finish(&self) -> bool {
        if let Err(e) = self.log.clear() {
            tracing::error!(error = %e, "cannot clear capture buffer after commit");
            return false;
        }
        if let Err(e) = FlushedIdSet::remove(&self.marker_path) {
            tracing::warn!(path = %self.marker_path.display(), error = %e, "cannot remove flush marker");
        }
        true
    }
}
