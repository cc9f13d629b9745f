pub mod reminder;
pub mod schedule;
pub mod store;
pub mod types;

pub use reminder::ScheduledReminder;
pub use schedule::{ResurfacingSchedule, ScheduleError};
pub use store::{CanonicalStore, MemoryStore, RecordFilter, StoreError};
pub use types::*;
