//! Spaced resurfacing of captured notes.
//!
//! [`ResurfacingPolicy`] decides whether and when a note is due, the
//! [`QuietHoursAdjuster`] and [`DailyCapGate`] bend that time to the user's
//! day, and [`ReminderPlanner`] hands the result to a [`DeliveryService`].

pub mod actions;
pub mod daily_cap;
pub mod delivery;
pub mod memory;
pub mod planner;
pub mod policy;
pub mod queue;
pub mod quiet_hours;
pub mod reflection;
pub mod settings;

pub use actions::{handle_action, mark_triaged, set_status, ActionOutcome, ReminderAction};
pub use daily_cap::DailyCapGate;
pub use delivery::{
    DayWindow, DeliveryError, DeliveryService, PendingReminder, QueuedReminder, ReminderPayload,
};
pub use memory::MemoryDelivery;
pub use planner::{PlanOutcome, ReminderPlanner};
pub use policy::ResurfacingPolicy;
pub use queue::FileDeliveryQueue;
pub use quiet_hours::QuietHoursAdjuster;
pub use reflection::{next_reflection_time, DAILY_REFLECTION_ID};
pub use settings::{schedule_from_config, schedule_or_default};
