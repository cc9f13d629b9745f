use chrono::{DateTime, Duration, TimeZone, Utc};
use flashnote_core::{CanonicalRecord, CanonicalStore, RecordStatus, StoreError};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::delivery::DeliveryService;
use crate::planner::{PlanOutcome, ReminderPlanner};
use crate::policy::ResurfacingPolicy;

/// How far a snooze pushes a note out.
pub const SNOOZE_DAYS: i64 = 2;

/// The buttons on a resurfacing reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderAction {
    Keep,
    Archive,
    Snooze,
}

impl ReminderAction {
    pub fn identifier(&self) -> &'static str {
        match self {
            ReminderAction::Keep => "KEEP",
            ReminderAction::Archive => "ARCHIVE",
            ReminderAction::Snooze => "SNOOZE",
        }
    }

    pub fn from_identifier(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "KEEP" => Some(ReminderAction::Keep),
            "ARCHIVE" => Some(ReminderAction::Archive),
            "SNOOZE" => Some(ReminderAction::Snooze),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for ReminderAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_identifier(s)
            .ok_or_else(|| format!("unknown action '{s}' (expected keep, archive, or snooze)"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Count advanced; `next` is the planning result for the following reminder.
    Kept { resurface_count: i64, next: PlanOutcome },
    Archived { cancelled: usize },
    Snoozed { fire_at: DateTime<Utc>, scheduled: bool },
    /// The note no longer exists; nothing was done.
    UnknownNote,
}

/// Apply a reminder response to the note it was about.
///
/// The store write comes first for KEEP so the next reminder is planned from
/// the persisted count. ARCHIVE and SNOOZE cancel before writing.
pub fn handle_action<S, D, Tz>(
    store: &S,
    planner: &ReminderPlanner<D, Tz>,
    note_id: Uuid,
    action: ReminderAction,
    now: DateTime<Utc>,
) -> Result<ActionOutcome, StoreError>
where
    S: CanonicalStore + ?Sized,
    D: DeliveryService,
    Tz: TimeZone,
{
    let Some(mut record) = store.get(note_id)? else {
        tracing::warn!(%note_id, %action, "reminder action for unknown note");
        return Ok(ActionOutcome::UnknownNote);
    };

    match action {
        ReminderAction::Keep => {
            record.resurface_count = record.resurface_count.saturating_add(1);
            record.updated_at = now;
            store.update(&record)?;
            tracing::info!(%note_id, resurface_count = record.resurface_count, "kept note");
            Ok(ActionOutcome::Kept {
                resurface_count: record.resurface_count,
                next: planner.plan(&record),
            })
        }
        ReminderAction::Archive => {
            record.status = RecordStatus::Archived;
            record.updated_at = now;
            let cancelled = planner.cancel_for(note_id);
            store.update(&record)?;
            tracing::info!(%note_id, "archived note from reminder");
            Ok(ActionOutcome::Archived { cancelled })
        }
        ReminderAction::Snooze => {
            planner.cancel_for(note_id);
            let fire_at = now + Duration::days(SNOOZE_DAYS);
            let scheduled = planner.snooze(note_id, fire_at);
            record.updated_at = now;
            store.update(&record)?;
            Ok(ActionOutcome::Snoozed { fire_at, scheduled })
        }
    }
}

/// Change a note's status and bring its reminders in line: leaving the
/// eligible set cancels them, entering it plans the next one.
pub fn set_status<S, D, Tz>(
    store: &S,
    planner: &ReminderPlanner<D, Tz>,
    note_id: Uuid,
    status: RecordStatus,
    now: DateTime<Utc>,
) -> Result<CanonicalRecord, StoreError>
where
    S: CanonicalStore + ?Sized,
    D: DeliveryService,
    Tz: TimeZone,
{
    modify(store, planner, note_id, now, |r| r.status = status)
}

/// Mark a note triaged (or back to untriaged), with the same reminder handling
/// as [`set_status`].
pub fn mark_triaged<S, D, Tz>(
    store: &S,
    planner: &ReminderPlanner<D, Tz>,
    note_id: Uuid,
    triaged: bool,
    now: DateTime<Utc>,
) -> Result<CanonicalRecord, StoreError>
where
    S: CanonicalStore + ?Sized,
    D: DeliveryService,
    Tz: TimeZone,
{
    modify(store, planner, note_id, now, |r| r.is_triaged = triaged)
}

fn modify<S, D, Tz>(
    store: &S,
    planner: &ReminderPlanner<D, Tz>,
    note_id: Uuid,
    now: DateTime<Utc>,
    change: impl FnOnce(&mut CanonicalRecord),
) -> Result<CanonicalRecord, StoreError>
where
    S: CanonicalStore + ?Sized,
    D: DeliveryService,
    Tz: TimeZone,
{
    let mut record = store.get(note_id)?.ok_or(StoreError::NotFound(note_id))?;
    let schedule = planner.schedule();
    let was_eligible = ResurfacingPolicy::should_resurface(&record, schedule);
    change(&mut record);
    record.updated_at = now;
    store.update(&record)?;

    let eligible = ResurfacingPolicy::should_resurface(&record, schedule);
    if was_eligible && !eligible {
        planner.cancel_for(note_id);
    } else if !was_eligible && eligible {
        planner.plan(&record);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDelivery;
    use flashnote_core::reminder::{reminder_id, snooze_reminder_id};
    use flashnote_core::{CaptureEntry, MemoryStore, ResurfacingSchedule, SourceTag};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap()
    }

    fn seeded() -> (MemoryStore, CanonicalRecord) {
        let store = MemoryStore::new();
        let record = CanonicalRecord::from_entry(&CaptureEntry::with_timestamp(
            "call the dentist",
            SourceTag::Voice,
            None,
            at(1, 10),
        ));
        store.commit_batch(&[record.clone()]).unwrap();
        (store, record)
    }

    fn planner(delivery: &MemoryDelivery) -> ReminderPlanner<&MemoryDelivery, Utc> {
        ReminderPlanner::new(ResurfacingSchedule::default(), delivery, Utc)
    }

    #[test]
    fn action_identifiers_parse_case_insensitively() {
        assert_eq!(ReminderAction::from_identifier("KEEP"), Some(ReminderAction::Keep));
        assert_eq!("archive".parse::<ReminderAction>(), Ok(ReminderAction::Archive));
        assert_eq!(ReminderAction::Snooze.to_string(), "SNOOZE");
        assert!("OPEN_TRIAGE".parse::<ReminderAction>().is_err());
    }

    #[test]
    fn keep_advances_count_and_plans_next_interval() {
        let (store, record) = seeded();
        let delivery = MemoryDelivery::new();
        let p = planner(&delivery);
        p.plan(&record);

        let outcome = handle_action(&store, &p, record.id, ReminderAction::Keep, at(2, 10)).unwrap();
        let ActionOutcome::Kept { resurface_count, next } = &outcome else {
            panic!("expected Kept, got {outcome:?}");
        };
        assert_eq!(*resurface_count, 1);
        // Second interval is 3 days from creation.
        assert_eq!(next.scheduled().unwrap().fire_at, at(4, 10));
        assert!(delivery.get(&reminder_id(record.id, 1)).is_some());

        let stored = store.get(record.id).unwrap().unwrap();
        assert_eq!(stored.resurface_count, 1);
        assert_eq!(stored.updated_at, at(2, 10));
    }

    #[test]
    fn keep_past_the_last_interval_schedules_nothing() {
        let (store, mut record) = seeded();
        record.resurface_count = 4;
        store.update(&record).unwrap();
        let delivery = MemoryDelivery::new();
        let outcome =
            handle_action(&store, &planner(&delivery), record.id, ReminderAction::Keep, at(2, 10)).unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Kept {
                resurface_count: 5,
                next: PlanOutcome::Ineligible
            }
        );
        assert!(delivery.all().is_empty());
    }

    #[test]
    fn keep_at_the_count_ceiling_does_not_overflow() {
        let (store, mut record) = seeded();
        record.resurface_count = i64::MAX;
        store.update(&record).unwrap();
        let delivery = MemoryDelivery::new();
        let outcome =
            handle_action(&store, &planner(&delivery), record.id, ReminderAction::Keep, at(2, 10)).unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Kept {
                resurface_count: i64::MAX,
                next: PlanOutcome::Ineligible
            }
        );
        assert_eq!(store.get(record.id).unwrap().unwrap().resurface_count, i64::MAX);
    }

    #[test]
    fn archive_cancels_everything_for_the_note() {
        let (store, record) = seeded();
        let delivery = MemoryDelivery::new();
        let p = planner(&delivery);
        p.plan(&record);
        p.snooze(record.id, at(20, 9));

        let outcome = handle_action(&store, &p, record.id, ReminderAction::Archive, at(2, 10)).unwrap();
        assert_eq!(outcome, ActionOutcome::Archived { cancelled: 2 });
        assert!(delivery.all().is_empty());
        assert_eq!(
            store.get(record.id).unwrap().unwrap().status,
            RecordStatus::Archived
        );
    }

    #[test]
    fn snooze_replaces_pending_with_one_reminder_two_days_out() {
        let (store, record) = seeded();
        let delivery = MemoryDelivery::new();
        let p = planner(&delivery);
        p.plan(&record);

        let now = at(2, 23);
        let outcome = handle_action(&store, &p, record.id, ReminderAction::Snooze, now).unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Snoozed {
                fire_at: at(4, 23),
                scheduled: true
            }
        );
        let all = delivery.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reminder_id, snooze_reminder_id(record.id));
        assert_eq!(all[0].payload.title, "Snoozed thought");
        assert_eq!(store.get(record.id).unwrap().unwrap().resurface_count, 0);
    }

    #[test]
    fn unknown_note_is_a_no_op() {
        let store = MemoryStore::new();
        let delivery = MemoryDelivery::new();
        let outcome = handle_action(
            &store,
            &planner(&delivery),
            Uuid::new_v4(),
            ReminderAction::Keep,
            at(2, 10),
        )
        .unwrap();
        assert_eq!(outcome, ActionOutcome::UnknownNote);
    }

    #[test]
    fn leaving_and_reentering_active_tracks_reminders() {
        let (store, record) = seeded();
        let delivery = MemoryDelivery::new();
        let p = planner(&delivery);
        p.plan(&record);

        let task = set_status(&store, &p, record.id, RecordStatus::Task, at(1, 12)).unwrap();
        assert_eq!(task.status, RecordStatus::Task);
        assert!(delivery.all().is_empty());

        set_status(&store, &p, record.id, RecordStatus::Active, at(1, 13)).unwrap();
        assert_eq!(delivery.all().len(), 1);
    }

    #[test]
    fn triaging_cancels_reminders() {
        let (store, record) = seeded();
        let delivery = MemoryDelivery::new();
        let p = planner(&delivery);
        p.plan(&record);

        let triaged = mark_triaged(&store, &p, record.id, true, at(1, 12)).unwrap();
        assert!(triaged.is_triaged);
        assert!(delivery.all().is_empty());
        assert!(matches!(
            mark_triaged(&store, &p, Uuid::new_v4(), true, at(1, 12)),
            Err(StoreError::NotFound(_))
        ));
    }
}
