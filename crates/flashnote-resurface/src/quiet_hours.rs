use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use flashnote_core::ResurfacingSchedule;

/// Where an hour of day falls relative to the quiet window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Inside the window, before midnight: wait for `end` tomorrow.
    Late,
    /// Inside the window, after midnight (or a same-day window): wait for `end` today.
    Early,
    Outside,
}

/// Moves reminder times out of the half-open quiet window `[start, end)`,
/// measured in hours of the local day and wrapping midnight when
/// `start > end`. `start == end` means no quiet window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHoursAdjuster {
    start: u32,
    end: u32,
}

impl QuietHoursAdjuster {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start % 24,
            end: end % 24,
        }
    }

    pub fn from_schedule(schedule: &ResurfacingSchedule) -> Self {
        Self::new(schedule.quiet_hours_start(), schedule.quiet_hours_end())
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        self.placement(hour) != Placement::Outside
    }

    fn placement(&self, hour: u32) -> Placement {
        use std::cmp::Ordering::*;
        match self.start.cmp(&self.end) {
            Equal => Placement::Outside,
            Greater if hour >= self.start => Placement::Late,
            Greater if hour < self.end => Placement::Early,
            Less if hour >= self.start && hour < self.end => Placement::Early,
            _ => Placement::Outside,
        }
    }

    /// Shift `nominal` to the end of the quiet window it falls in, as seen in
    /// `tz`. The result is never earlier than `nominal`.
    pub fn apply<Tz: TimeZone>(&self, nominal: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
        let local = nominal.with_timezone(tz);
        let date = local.date_naive();
        let target_date = match self.placement(local.hour()) {
            Placement::Outside => return nominal,
            Placement::Late => date.succ_opt(),
            Placement::Early => Some(date),
        };
        match target_date.and_then(|d| local_hour_to_utc(tz, d, self.end)) {
            Some(adjusted) => adjusted.max(nominal),
            None => nominal,
        }
    }
}

/// `hour:00:00` on `date` in `tz`. Ambiguous times (DST fall-back) take the
/// earlier instant; skipped times (spring-forward) take the first valid hour after.
pub(crate) fn local_hour_to_utc<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    hour: u32,
) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
}
