pub mod entry_log;
pub mod marker;

pub use entry_log::{EntryLog, LogError};
pub use marker::FlushedIdSet;
