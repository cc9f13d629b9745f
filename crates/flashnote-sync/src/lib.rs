//! Moving captured thoughts from the hot buffer into the note store.

pub mod flush;
pub mod sqlite_store;

pub use flush::{FlushCoordinator, FlushError, FlushReport};
pub use sqlite_store::SqliteStore;
