use chrono::Duration;

/// Why a set of resurfacing parameters was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("intervals must not be empty")]
    EmptyIntervals,
    #[error("interval #{0} must be positive")]
    NonPositiveInterval(usize),
    #[error("max_resurface_count must be positive")]
    ZeroResurfaceCount,
    #[error("max_daily_notifications must be positive")]
    ZeroDailyNotifications,
    #[error("quiet hours {field} must be 0-23, got {value}")]
    HourOutOfRange { field: &'static str, value: u32 },
}

/// Immutable parameters of the spaced resurfacing policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResurfacingSchedule {
    intervals: Vec<Duration>,
    max_resurface_count: u32,
    max_daily_notifications: u32,
    quiet_hours_start: u32,
    quiet_hours_end: u32,
}

impl ResurfacingSchedule {
    /// Build a schedule from compile-time known values.
    ///
    /// # Panics
    /// Panics when any bound is violated; use [`ResurfacingSchedule::try_new`]
    /// for values read from configuration.
    pub fn new(
        intervals: Vec<Duration>,
        max_resurface_count: u32,
        max_daily_notifications: u32,
        quiet_hours_start: u32,
        quiet_hours_end: u32,
    ) -> Self {
        match Self::try_new(
            intervals,
            max_resurface_count,
            max_daily_notifications,
            quiet_hours_start,
            quiet_hours_end,
        ) {
            Ok(schedule) => schedule,
            Err(e) => panic!("invalid resurfacing schedule: {e}"),
        }
    }

    pub fn try_new(
        intervals: Vec<Duration>,
        max_resurface_count: u32,
        max_daily_notifications: u32,
        quiet_hours_start: u32,
        quiet_hours_end: u32,
    ) -> Result<Self, ScheduleError> {
        if intervals.is_empty() {
            return Err(ScheduleError::EmptyIntervals);
        }
        if let Some(pos) = intervals.iter().position(|d| *d <= Duration::zero()) {
            return Err(ScheduleError::NonPositiveInterval(pos));
        }
        if max_resurface_count == 0 {
            return Err(ScheduleError::ZeroResurfaceCount);
        }
        if max_daily_notifications == 0 {
            return Err(ScheduleError::ZeroDailyNotifications);
        }
        for (field, value) in [("start", quiet_hours_start), ("end", quiet_hours_end)] {
            if value > 23 {
                return Err(ScheduleError::HourOutOfRange { field, value });
            }
        }
        Ok(Self {
            intervals,
            max_resurface_count,
            max_daily_notifications,
            quiet_hours_start,
            quiet_hours_end,
        })
    }

    pub fn intervals(&self) -> &[Duration] {
        &self.intervals
    }

    pub fn max_resurface_count(&self) -> u32 {
        self.max_resurface_count
    }

    pub fn max_daily_notifications(&self) -> u32 {
        self.max_daily_notifications
    }

    pub fn quiet_hours_start(&self) -> u32 {
        self.quiet_hours_start
    }

    pub fn quiet_hours_end(&self) -> u32 {
        self.quiet_hours_end
    }

    /// Wait before the reminder with ordinal `resurface_count`, measured from
    /// the note's creation. `None` for negative or out-of-range ordinals.
    pub fn interval_for(&self, resurface_count: i64) -> Option<Duration> {
        let idx = usize::try_from(resurface_count).ok()?;
        self.intervals.get(idx).copied()
    }
}

impl Default for ResurfacingSchedule {
    /// 1, 3, 7, 14, 30 days; five reminders; three per day; quiet 22:00-08:00.
    fn default() -> Self {
        Self::new(
            [1, 3, 7, 14, 30].into_iter().map(Duration::days).collect(),
            5,
            3,
            22,
            8,
        )
    }
}
