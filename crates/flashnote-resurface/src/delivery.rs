use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quiet_hours::local_hour_to_utc;

/// Category attached to resurfacing reminders; carries the keep/archive/snooze actions.
pub const RESURFACE_CATEGORY: &str = "FLASHNOTE_RESURFACE";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery queue I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("delivery queue encoding: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
    #[error("delivery service rejected request: {0}")]
    Rejected(String),
}

/// What the delivery service shows when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    /// The note a resurfacing reminder is about; none for the daily reflection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub category: String,
}

impl ReminderPayload {
    pub fn resurface(note_id: Uuid, days_ago: i64) -> Self {
        let plural = if days_ago == 1 { "" } else { "s" };
        Self {
            note_id: Some(note_id),
            title: format!("A thought from {days_ago} day{plural} ago"),
            body: "You saved a thought - tap to review".to_string(),
            category: RESURFACE_CATEGORY.to_string(),
        }
    }

    pub fn snoozed(note_id: Uuid) -> Self {
        Self {
            note_id: Some(note_id),
            title: "Snoozed thought".to_string(),
            body: "You saved a thought - tap to review".to_string(),
            category: RESURFACE_CATEGORY.to_string(),
        }
    }
}

/// A reminder the delivery service still holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReminder {
    pub reminder_id: String,
    pub fire_at: DateTime<Utc>,
}

/// A reminder as held by an in-process or file-backed delivery queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedReminder {
    pub reminder_id: String,
    pub fire_at: DateTime<Utc>,
    pub payload: ReminderPayload,
}

impl QueuedReminder {
    pub fn pending(&self) -> PendingReminder {
        PendingReminder {
            reminder_id: self.reminder_id.clone(),
            fire_at: self.fire_at,
        }
    }
}

/// Insert or replace by id, keeping the queue ordered by fire time.
pub(crate) fn upsert(queue: &mut Vec<QueuedReminder>, item: QueuedReminder) {
    queue.retain(|q| q.reminder_id != item.reminder_id);
    let pos = queue.partition_point(|q| q.fire_at <= item.fire_at);
    queue.insert(pos, item);
}

pub(crate) fn remove_prefix(queue: &mut Vec<QueuedReminder>, prefix: &str) -> usize {
    let before = queue.len();
    queue.retain(|q| !q.reminder_id.starts_with(prefix));
    before - queue.len()
}

pub(crate) fn pending_within(queue: &[QueuedReminder], day: &DayWindow) -> Vec<PendingReminder> {
    queue
        .iter()
        .filter(|q| day.contains(q.fire_at))
        .map(QueuedReminder::pending)
        .collect()
}

/// One local calendar day, as a UTC half-open range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The local day in `tz` that contains `instant`.
    pub fn containing<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> Self {
        let date = instant.with_timezone(tz).date_naive();
        Self::for_date(date, tz)
    }

    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let start = local_hour_to_utc(tz, date, 0).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = date
            .succ_opt()
            .and_then(|next| local_hour_to_utc(tz, next, 0))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { date, start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// The platform service that shows reminders to the user.
///
/// Calls may fail; the planner logs failures and moves on.
pub trait DeliveryService {
    /// Schedule a reminder. Scheduling an id that is already pending replaces it.
    fn schedule(
        &self,
        reminder_id: &str,
        fire_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<(), DeliveryError>;

    /// Cancel every pending reminder whose id starts with `reminder_id_prefix`.
    /// Returns how many were removed.
    fn cancel(&self, reminder_id_prefix: &str) -> Result<usize, DeliveryError>;

    /// Pending reminders firing within `day`.
    fn list_pending(&self, day: &DayWindow) -> Result<Vec<PendingReminder>, DeliveryError>;
}

impl<T: DeliveryService + ?Sized> DeliveryService for &T {
    fn schedule(
        &self,
        reminder_id: &str,
        fire_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<(), DeliveryError> {
        (**self).schedule(reminder_id, fire_at, payload)
    }

    fn cancel(&self, reminder_id_prefix: &str) -> Result<usize, DeliveryError> {
        (**self).cancel(reminder_id_prefix)
    }

    fn list_pending(&self, day: &DayWindow) -> Result<Vec<PendingReminder>, DeliveryError> {
        (**self).list_pending(day)
    }
}
