use chrono::{DateTime, Utc};
use flashnote_core::{CanonicalRecord, RecordStatus, ResurfacingSchedule};

/// Decides whether a note is due another reminder and when, ignoring quiet
/// hours and the daily cap.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResurfacingPolicy;

impl ResurfacingPolicy {
    /// Only active, untriaged notes below the resurface limit are eligible.
    pub fn should_resurface(record: &CanonicalRecord, schedule: &ResurfacingSchedule) -> bool {
        record.status == RecordStatus::Active
            && !record.is_triaged
            && record.resurface_count < i64::from(schedule.max_resurface_count())
    }

    /// `created_at + intervals[resurface_count]`. Intervals are anchored at
    /// creation, so a late reminder does not push later ones back.
    pub fn next_nominal_time(
        record: &CanonicalRecord,
        schedule: &ResurfacingSchedule,
    ) -> Option<DateTime<Utc>> {
        let interval = schedule.interval_for(record.resurface_count)?;
        record.created_at.checked_add_signed(interval)
    }
}
