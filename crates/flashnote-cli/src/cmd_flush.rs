use chrono::Utc;
use flashnote_resurface::PlanOutcome;
use flashnote_sync::FlushCoordinator;
use std::path::Path;

use crate::session::Session;

/// `flashnote flush`: move buffered captures into the note store, plan
/// their first reminders, and re-arm the daily reflection.
pub fn execute(root: &Path) -> anyhow::Result<()> {
    let session = Session::open(root)?;
    let flush = FlushCoordinator::open(&session.paths, &session.store);
    let (report, outcomes) = flush.flush_and_plan(&session.planner)?;
    session.sync_daily_reflection(Utc::now());

    if report.is_noop() {
        println!("Nothing to flush");
        return Ok(());
    }
    let scheduled = outcomes
        .iter()
        .filter(|o| matches!(o, PlanOutcome::Scheduled(_)))
        .count();
    println!(
        "Flushed {} note(s), {} already stored, {} reminder(s) scheduled",
        report.committed.len(),
        report.already_flushed,
        scheduled
    );
    if !report.log_cleared {
        println!("Buffer could not be cleared; it will be retried on the next flush");
    }
    Ok(())
}
