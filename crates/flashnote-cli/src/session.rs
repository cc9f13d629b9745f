use chrono::{DateTime, Local, Utc};
use flashnote_resurface::{FileDeliveryQueue, ReminderPlanner};
use flashnote_store::{FlashConfig, StorePaths};
use flashnote_sync::SqliteStore;
use std::path::Path;

/// Everything a command needs to touch notes and reminders under one root.
pub struct Session {
    pub paths: StorePaths,
    pub store: SqliteStore,
    pub planner: ReminderPlanner<FileDeliveryQueue, Local>,
    pub config: FlashConfig,
}

impl Session {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let paths = StorePaths::discover(root);
        paths.ensure_layout()?;
        let store = SqliteStore::open_or_create(&paths.notes_db)?;
        let config = FlashConfig::load(&paths);
        let planner = ReminderPlanner::from_config(&config, FileDeliveryQueue::open(&paths), Local);
        Ok(Self {
            paths,
            store,
            planner,
            config,
        })
    }

    /// Arm tomorrow's reflection if it is enabled, otherwise make sure none
    /// is pending. Safe to call on every run.
    pub fn sync_daily_reflection(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.config.daily_reflection_enabled {
            self.planner.arm_daily_reflection(now)
        } else {
            self.planner.cancel_daily_reflection();
            None
        }
    }
}
