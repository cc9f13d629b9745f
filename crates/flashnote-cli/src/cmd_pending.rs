use chrono::{Local, Utc};
use flashnote_resurface::FileDeliveryQueue;
use flashnote_store::StorePaths;
use std::path::Path;

/// `flashnote pending`: reminders waiting in the local delivery queue.
pub fn execute(root: &Path, due_only: bool, json: bool) -> anyhow::Result<()> {
    let queue = FileDeliveryQueue::open(&StorePaths::discover(root));
    let reminders = if due_only {
        queue.due(Utc::now())?
    } else {
        queue.all()?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reminders)?);
        return Ok(());
    }
    if reminders.is_empty() {
        println!("(no pending reminders)");
        return Ok(());
    }
    for r in &reminders {
        println!(
            "{}  {}  {}",
            r.fire_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            r.reminder_id,
            r.payload.title
        );
    }
    Ok(())
}
