use flashnote_core::reminder::is_resurface_id;
use flashnote_core::ResurfacingSchedule;

use crate::delivery::PendingReminder;

/// Limits how many resurfacing reminders fire on one local calendar day.
///
/// Best effort only: the pending-list query and the following schedule call
/// are not atomic, so two planners racing near the cap can both pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCapGate {
    max_per_day: u32,
}

impl DailyCapGate {
    pub fn new(max_per_day: u32) -> Self {
        Self { max_per_day }
    }

    pub fn from_schedule(schedule: &ResurfacingSchedule) -> Self {
        Self::new(schedule.max_daily_notifications())
    }

    pub fn max_per_day(&self) -> u32 {
        self.max_per_day
    }

    /// Whether one more reminder fits on a day that already has
    /// `already_scheduled` of them.
    pub fn admit(&self, already_scheduled: usize) -> bool {
        already_scheduled < self.max_per_day as usize
    }

    /// How many of `pending` count toward the cap. Only resurfacing reminders
    /// count, and a pending reminder with `replacing` as its id does not,
    /// since scheduling it again replaces rather than adds.
    pub fn count_against(pending: &[PendingReminder], replacing: &str) -> usize {
        pending
            .iter()
            .filter(|p| is_resurface_id(&p.reminder_id) && p.reminder_id != replacing)
            .count()
    }
}
