use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every resurfacing reminder id starts with this.
pub const RESURFACE_PREFIX: &str = "resurface-";

const SNOOZE_SUFFIX: &str = "snooze";

/// Which reminder of a note an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSlot {
    Ordinal(i64),
    Snooze,
}

/// A reminder handed to the delivery service.
///
/// `reminder_id` is a pure function of `(note_id, ordinal)`, so reminders can be
/// found and cancelled by id prefix without a side index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub reminder_id: String,
    pub note_id: Uuid,
    pub resurface_ordinal: i64,
    pub fire_at: DateTime<Utc>,
}

impl ScheduledReminder {
    pub fn new(note_id: Uuid, resurface_ordinal: i64, fire_at: DateTime<Utc>) -> Self {
        Self {
            reminder_id: reminder_id(note_id, resurface_ordinal),
            note_id,
            resurface_ordinal,
            fire_at,
        }
    }
}

/// `resurface-<note-id>-<ordinal>`
pub fn reminder_id(note_id: Uuid, ordinal: i64) -> String {
    format!("{RESURFACE_PREFIX}{note_id}-{ordinal}")
}

/// `resurface-<note-id>-snooze`
pub fn snooze_reminder_id(note_id: Uuid) -> String {
    format!("{RESURFACE_PREFIX}{note_id}-{SNOOZE_SUFFIX}")
}

/// Prefix shared by every reminder ever scheduled for `note_id`.
pub fn note_reminder_prefix(note_id: Uuid) -> String {
    format!("{RESURFACE_PREFIX}{note_id}-")
}

pub fn is_resurface_id(id: &str) -> bool {
    id.starts_with(RESURFACE_PREFIX)
}

/// Split a reminder id back into its note and slot.
pub fn parse_reminder_id(id: &str) -> Option<(Uuid, ReminderSlot)> {
    let rest = id.strip_prefix(RESURFACE_PREFIX)?;
    // UUIDs contain dashes; the slot is whatever follows the last one.
    let (note, slot) = rest.rsplit_once('-')?;
    let note_id = Uuid::parse_str(note).ok()?;
    let slot = if slot == SNOOZE_SUFFIX {
        ReminderSlot::Snooze
    } else {
        ReminderSlot::Ordinal(slot.parse().ok()?)
    };
    Some((note_id, slot))
}
