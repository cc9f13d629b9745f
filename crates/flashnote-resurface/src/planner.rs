use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use flashnote_core::reminder::{note_reminder_prefix, snooze_reminder_id};
use flashnote_core::{CanonicalRecord, ResurfacingSchedule, ScheduledReminder};
use flashnote_store::FlashConfig;
use uuid::Uuid;

use crate::daily_cap::DailyCapGate;
use crate::delivery::{DayWindow, DeliveryService, ReminderPayload};
use crate::policy::ResurfacingPolicy;
use crate::quiet_hours::QuietHoursAdjuster;
use crate::settings::schedule_or_default;

/// Result of one planning pass for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Scheduled(ScheduledReminder),
    /// Archived, deleted, task, triaged, or out of resurfaces.
    Ineligible,
    /// No interval is defined for the note's resurface ordinal.
    NoInterval,
    /// The target day is full. Not retried until the note changes again.
    CapReached { day: NaiveDate },
    /// The delivery service failed; already logged.
    DeliveryFailed,
}

impl PlanOutcome {
    pub fn scheduled(&self) -> Option<&ScheduledReminder> {
        match self {
            PlanOutcome::Scheduled(r) => Some(r),
            _ => None,
        }
    }
}

/// Runs policy, quiet hours, and the daily cap for a note, then hands the
/// surviving reminder to the delivery service.
pub struct ReminderPlanner<D, Tz: TimeZone> {
    schedule: ResurfacingSchedule,
    quiet_hours: Option<QuietHoursAdjuster>,
    cap: DailyCapGate,
    delivery: D,
    tz: Tz,
}

impl<D: DeliveryService, Tz: TimeZone> ReminderPlanner<D, Tz> {
    /// Planner with quiet hours enforced, evaluating calendar days in `tz`.
    pub fn new(schedule: ResurfacingSchedule, delivery: D, tz: Tz) -> Self {
        Self {
            quiet_hours: Some(QuietHoursAdjuster::from_schedule(&schedule)),
            cap: DailyCapGate::from_schedule(&schedule),
            schedule,
            delivery,
            tz,
        }
    }

    pub fn from_config(config: &FlashConfig, delivery: D, tz: Tz) -> Self {
        let planner = Self::new(schedule_or_default(config), delivery, tz);
        if config.quiet_hours_enabled {
            planner
        } else {
            planner.without_quiet_hours()
        }
    }

    pub fn without_quiet_hours(mut self) -> Self {
        self.quiet_hours = None;
        self
    }

    pub fn schedule(&self) -> &ResurfacingSchedule {
        &self.schedule
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// Plan the next reminder for `record`.
    pub fn plan(&self, record: &CanonicalRecord) -> PlanOutcome {
        if !ResurfacingPolicy::should_resurface(record, &self.schedule) {
            return PlanOutcome::Ineligible;
        }
        let Some(nominal) = ResurfacingPolicy::next_nominal_time(record, &self.schedule) else {
            return PlanOutcome::NoInterval;
        };
        let fire_at = match &self.quiet_hours {
            Some(quiet) => quiet.apply(nominal, &self.tz),
            None => nominal,
        };
        let reminder = ScheduledReminder::new(record.id, record.resurface_count, fire_at);

        let day = DayWindow::containing(fire_at, &self.tz);
        let pending = match self.delivery.list_pending(&day) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(note_id = %record.id, day = %day.date, error = %e, "cannot list pending reminders");
                return PlanOutcome::DeliveryFailed;
            }
        };
        let already = DailyCapGate::count_against(&pending, &reminder.reminder_id);
        if !self.cap.admit(already) {
            tracing::info!(
                note_id = %record.id,
                day = %day.date,
                cap = self.cap.max_per_day(),
                "daily reminder cap reached, skipping"
            );
            return PlanOutcome::CapReached { day: day.date };
        }

        let days_ago = self
            .schedule
            .interval_for(record.resurface_count)
            .map(|d| d.num_days())
            .unwrap_or(1);
        let payload = ReminderPayload::resurface(record.id, days_ago);
        match self
            .delivery
            .schedule(&reminder.reminder_id, reminder.fire_at, &payload)
        {
            Ok(()) => {
                tracing::info!(
                    note_id = %record.id,
                    ordinal = record.resurface_count,
                    fire_at = %reminder.fire_at,
                    "scheduled resurfacing reminder"
                );
                PlanOutcome::Scheduled(reminder)
            }
            Err(e) => {
                tracing::error!(note_id = %record.id, error = %e, "failed to schedule reminder");
                PlanOutcome::DeliveryFailed
            }
        }
    }

    /// Cancel every reminder ever scheduled for `note_id`. Failures are logged
    /// and reported as zero cancelled.
    pub fn cancel_for(&self, note_id: Uuid) -> usize {
        match self.delivery.cancel(&note_reminder_prefix(note_id)) {
            Ok(n) => {
                tracing::debug!(%note_id, cancelled = n, "cancelled reminders");
                n
            }
            Err(e) => {
                tracing::warn!(%note_id, error = %e, "failed to cancel reminders");
                0
            }
        }
    }

    /// Schedule the one-off snooze reminder. Quiet hours and the cap do not apply.
    pub fn snooze(&self, note_id: Uuid, fire_at: DateTime<Utc>) -> bool {
        let id = snooze_reminder_id(note_id);
        match self
            .delivery
            .schedule(&id, fire_at, &ReminderPayload::snoozed(note_id))
        {
            Ok(()) => {
                tracing::info!(%note_id, %fire_at, "snoozed note");
                true
            }
            Err(e) => {
                tracing::error!(%note_id, error = %e, "failed to snooze note");
                false
            }
        }
    }
}
