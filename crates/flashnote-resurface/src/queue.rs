use chrono::{DateTime, Utc};
use flashnote_store::{lock_file, write_atomic, LockGuard, StorePaths};
use std::path::PathBuf;

use crate::delivery::{
    pending_within, remove_prefix, upsert, DayWindow, DeliveryError, DeliveryService,
    PendingReminder, QueuedReminder, ReminderPayload,
};

/// Delivery queue persisted as `reminders.json` under the store root.
///
/// Every operation is read-modify-write under an exclusive file lock, and the
/// file is replaced atomically, so concurrent CLI invocations cannot lose
/// each other's reminders.
#[derive(Debug, Clone)]
pub struct FileDeliveryQueue {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileDeliveryQueue {
    pub fn new(path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_path: lock_path.into(),
        }
    }

    pub fn open(paths: &StorePaths) -> Self {
        Self::new(&paths.reminders_json, &paths.reminders_lock)
    }

    /// Everything pending, earliest first.
    pub fn all(&self) -> Result<Vec<QueuedReminder>, DeliveryError> {
        let _guard = self.lock()?;
        self.load()
    }

    /// Reminders whose fire time is at or before `now`, left in the queue.
    pub fn due(&self, now: DateTime<Utc>) -> Result<Vec<QueuedReminder>, DeliveryError> {
        let mut queue = self.all()?;
        queue.retain(|q| q.fire_at <= now);
        Ok(queue)
    }

    /// Remove and return every reminder whose fire time is at or before `now`.
    pub fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<QueuedReminder>, DeliveryError> {
        let _guard = self.lock()?;
        let mut queue = self.load()?;
        let split = queue.partition_point(|q| q.fire_at <= now);
        let due: Vec<_> = queue.drain(..split).collect();
        if !due.is_empty() {
            self.store(&queue)?;
        }
        Ok(due)
    }

    fn lock(&self) -> Result<LockGuard, DeliveryError> {
        Ok(lock_file(&self.lock_path)?)
    }

    fn load(&self) -> Result<Vec<QueuedReminder>, DeliveryError> {
        let content = match std::fs::read(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut queue: Vec<QueuedReminder> = serde_json::from_slice(&content)?;
        queue.sort_by_key(|q| q.fire_at);
        Ok(queue)
    }

    fn store(&self, queue: &[QueuedReminder]) -> Result<(), DeliveryError> {
        let json = serde_json::to_vec_pretty(queue)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    fn modify<T>(
        &self,
        f: impl FnOnce(&mut Vec<QueuedReminder>) -> T,
    ) -> Result<T, DeliveryError> {
        let _guard = self.lock()?;
        let mut queue = self.load()?;
        let out = f(&mut queue);
        self.store(&queue)?;
        Ok(out)
    }
}

impl DeliveryService for FileDeliveryQueue {
    fn schedule(
        &self,
        reminder_id: &str,
        fire_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<(), DeliveryError> {
        let item = QueuedReminder {
            reminder_id: reminder_id.to_string(),
            fire_at,
            payload: payload.clone(),
        };
        self.modify(|queue| upsert(queue, item))
    }

    fn cancel(&self, reminder_id_prefix: &str) -> Result<usize, DeliveryError> {
        self.modify(|queue| remove_prefix(queue, reminder_id_prefix))
    }

    fn list_pending(&self, day: &DayWindow) -> Result<Vec<PendingReminder>, DeliveryError> {
        let _guard = self.lock()?;
        Ok(pending_within(&self.load()?, day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn setup() -> (tempfile::TempDir, FileDeliveryQueue) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::discover(tmp.path());
        (tmp, FileDeliveryQueue::open(&paths))
    }

    fn t(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn empty_queue_has_nothing_pending() {
        let (_tmp, q) = setup();
        assert!(q.all().unwrap().is_empty());
        let day = DayWindow::containing(t(10, 12), &Utc);
        assert!(q.list_pending(&day).unwrap().is_empty());
    }

    #[test]
    fn schedule_persists_across_handles() {
        let (tmp, q) = setup();
        let note = Uuid::new_v4();
        q.schedule("resurface-x-0", t(10, 9), &ReminderPayload::resurface(note, 1))
            .unwrap();

        let reopened = FileDeliveryQueue::open(&StorePaths::discover(tmp.path()));
        let all = reopened.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].payload.note_id, Some(note));
    }

    #[test]
    fn list_pending_filters_by_day() {
        let (_tmp, q) = setup();
        let payload = ReminderPayload::snoozed(Uuid::new_v4());
        q.schedule("resurface-a-0", t(10, 9), &payload).unwrap();
        q.schedule("resurface-b-0", t(10, 23), &payload).unwrap();
        q.schedule("resurface-c-0", t(11, 0), &payload).unwrap();

        let day = DayWindow::containing(t(10, 12), &Utc);
        let ids: Vec<_> = q
            .list_pending(&day)
            .unwrap()
            .into_iter()
            .map(|p| p.reminder_id)
            .collect();
        assert_eq!(ids, ["resurface-a-0", "resurface-b-0"]);
    }

    #[test]
    fn cancel_by_prefix_and_take_due() {
        let (_tmp, q) = setup();
        let payload = ReminderPayload::snoozed(Uuid::new_v4());
        q.schedule("resurface-a-0", t(10, 9), &payload).unwrap();
        q.schedule("resurface-a-1", t(12, 9), &payload).unwrap();
        q.schedule("resurface-b-0", t(11, 9), &payload).unwrap();

        assert_eq!(q.cancel("resurface-a-").unwrap(), 2);
        assert!(q.take_due(t(11, 8)).unwrap().is_empty());
        assert_eq!(q.due(t(11, 9)).unwrap().len(), 1);
        let due = q.take_due(t(11, 9) + Duration::minutes(1)).unwrap();
        assert_eq!(due.len(), 1);
        assert!(q.all().unwrap().is_empty());
    }
}
