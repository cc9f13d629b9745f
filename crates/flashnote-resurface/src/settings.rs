use chrono::Duration;
use flashnote_core::{ResurfacingSchedule, ScheduleError};
use flashnote_store::FlashConfig;

/// Build the schedule described by user configuration.
pub fn schedule_from_config(config: &FlashConfig) -> Result<ResurfacingSchedule, ScheduleError> {
    let intervals = config
        .interval_days
        .iter()
        .map(|d| Duration::try_days(*d).unwrap_or_else(Duration::zero))
        .collect();
    ResurfacingSchedule::try_new(
        intervals,
        config.max_resurface_count,
        config.max_daily_notifications,
        config.quiet_hours_start,
        config.quiet_hours_end,
    )
}

/// Like [`schedule_from_config`], falling back to the default schedule when
/// the configuration is invalid.
pub fn schedule_or_default(config: &FlashConfig) -> ResurfacingSchedule {
    schedule_from_config(config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid resurfacing settings, using defaults");
        ResurfacingSchedule::default()
    })
}
