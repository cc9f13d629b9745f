//! The morning nudge to triage yesterday's captures.
//!
//! Unlike resurfacing reminders it is not tied to a note and never counts
//! toward the daily cap. The delivery contract has no repeat rule, so the
//! reminder is re-armed for the next morning whenever the app runs.

use chrono::{DateTime, TimeZone, Utc};

use crate::delivery::{DeliveryService, ReminderPayload};
use crate::planner::ReminderPlanner;
use crate::quiet_hours::local_hour_to_utc;

pub const DAILY_REFLECTION_ID: &str = "flashnote-daily-reflection";
pub const DAILY_REFLECTION_CATEGORY: &str = "FLASHNOTE_DAILY_REFLECTION";
/// Local hour the reflection fires.
pub const DAILY_REFLECTION_HOUR: u32 = 8;

impl ReminderPayload {
    pub fn daily_reflection() -> Self {
        Self {
            note_id: None,
            title: "Yesterday's thoughts".to_string(),
            body: "Tap to review and triage your captures".to_string(),
            category: DAILY_REFLECTION_CATEGORY.to_string(),
        }
    }
}

/// The first local 08:00 in `tz` strictly after `now`.
pub fn next_reflection_time<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Option<DateTime<Utc>> {
    let today = now.with_timezone(tz).date_naive();
    match local_hour_to_utc(tz, today, DAILY_REFLECTION_HOUR) {
        Some(t) if t > now => Some(t),
        _ => today
            .succ_opt()
            .and_then(|tomorrow| local_hour_to_utc(tz, tomorrow, DAILY_REFLECTION_HOUR)),
    }
}

impl<D: DeliveryService, Tz: TimeZone> ReminderPlanner<D, Tz> {
    /// Schedule the daily reflection for the next morning, replacing any
    /// pending one. Returns the fire time, or `None` if delivery failed.
    pub fn arm_daily_reflection(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let fire_at = next_reflection_time(now, self.timezone())?;
        match self
            .delivery()
            .schedule(DAILY_REFLECTION_ID, fire_at, &ReminderPayload::daily_reflection())
        {
            Ok(()) => {
                tracing::debug!(%fire_at, "armed daily reflection");
                Some(fire_at)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to schedule daily reflection");
                None
            }
        }
    }

    /// Remove the pending daily reflection, if any.
    pub fn cancel_daily_reflection(&self) -> bool {
        match self.delivery().cancel(DAILY_REFLECTION_ID) {
            Ok(n) => n > 0,
            Err(e) => {
                tracing::warn!(error = %e, "failed to cancel daily reflection");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDelivery;
    use crate::planner::PlanOutcome;
    use chrono::{Duration, FixedOffset};
    use flashnote_core::{CanonicalRecord, CaptureEntry, ResurfacingSchedule, SourceTag};

    fn utc(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, day, hour, min, 0).unwrap()
    }

    #[test]
    fn next_time_is_this_morning_or_tomorrow() {
        assert_eq!(next_reflection_time(utc(3, 6, 0), &Utc), Some(utc(3, 8, 0)));
        assert_eq!(next_reflection_time(utc(3, 8, 0), &Utc), Some(utc(4, 8, 0)));
        assert_eq!(next_reflection_time(utc(3, 21, 30), &Utc), Some(utc(4, 8, 0)));
    }

    #[test]
    fn next_time_uses_local_morning() {
        // UTC+9: 08:00 local is 23:00 UTC the day before.
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(next_reflection_time(utc(3, 0, 0), &tz), Some(utc(3, 23, 0)));
        assert_eq!(next_reflection_time(utc(3, 23, 30), &tz), Some(utc(4, 23, 0)));
    }

    #[test]
    fn arming_twice_keeps_one_reminder() {
        let delivery = MemoryDelivery::new();
        let p = ReminderPlanner::new(ResurfacingSchedule::default(), &delivery, Utc);
        assert_eq!(p.arm_daily_reflection(utc(3, 6, 0)), Some(utc(3, 8, 0)));
        assert_eq!(p.arm_daily_reflection(utc(3, 9, 0)), Some(utc(4, 8, 0)));

        let all = delivery.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reminder_id, DAILY_REFLECTION_ID);
        assert_eq!(all[0].fire_at, utc(4, 8, 0));
        assert_eq!(all[0].payload, ReminderPayload::daily_reflection());
        assert_eq!(all[0].payload.note_id, None);

        assert!(p.cancel_daily_reflection());
        assert!(!p.cancel_daily_reflection());
        assert!(delivery.all().is_empty());
    }

    #[test]
    fn reflection_does_not_use_up_the_daily_cap() {
        let delivery = MemoryDelivery::new();
        let schedule = ResurfacingSchedule::new(vec![Duration::days(1)], 5, 1, 22, 8);
        let p = ReminderPlanner::new(schedule, &delivery, Utc);
        p.arm_daily_reflection(utc(2, 7, 0));

        let record = CanonicalRecord::from_entry(&CaptureEntry::with_timestamp(
            "plan the trip",
            SourceTag::Typed,
            None,
            utc(1, 9, 0),
        ));
        assert!(matches!(p.plan(&record), PlanOutcome::Scheduled(_)));
        assert_eq!(delivery.all().len(), 2);
    }

    #[test]
    fn rejected_delivery_reports_nothing_armed() {
        let delivery = MemoryDelivery::new();
        delivery.set_rejecting(true);
        let p = ReminderPlanner::new(ResurfacingSchedule::default(), &delivery, Utc);
        assert_eq!(p.arm_daily_reflection(utc(3, 6, 0)), None);
    }
}
