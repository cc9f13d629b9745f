use chrono::Utc;
use flashnote_core::RecordStatus;
use flashnote_resurface::{handle_action, mark_triaged, set_status, ActionOutcome, PlanOutcome, ReminderAction};
use std::path::Path;
use uuid::Uuid;

use crate::session::Session;

/// `flashnote respond <note> <keep|archive|snooze>`: what the user pressed on
/// a reminder. Unknown actions are ignored.
pub fn execute(root: &Path, note_id: Uuid, action: &str) -> anyhow::Result<()> {
    let Some(action) = ReminderAction::from_identifier(action) else {
        tracing::warn!(action, "ignoring unknown reminder action");
        println!("Unknown action '{action}', nothing done");
        return Ok(());
    };
    let session = Session::open(root)?;
    let outcome = handle_action(&session.store, &session.planner, note_id, action, Utc::now())?;
    println!("{}", describe(note_id, &outcome));
    Ok(())
}

/// `flashnote mark <note> [--status S] [--triaged | --untriaged]`
pub fn mark(
    root: &Path,
    note_id: Uuid,
    status: Option<RecordStatus>,
    triaged: Option<bool>,
) -> anyhow::Result<()> {
    if status.is_none() && triaged.is_none() {
        anyhow::bail!("nothing to change: pass --status, --triaged or --untriaged");
    }
    let session = Session::open(root)?;
    let now = Utc::now();
    let mut record = None;
    if let Some(status) = status {
        record = Some(set_status(&session.store, &session.planner, note_id, status, now)?);
    }
    if let Some(triaged) = triaged {
        record = Some(mark_triaged(&session.store, &session.planner, note_id, triaged, now)?);
    }
    if let Some(r) = record {
        let triage = if r.is_triaged { "triaged" } else { "untriaged" };
        println!("{note_id}: {}, {triage}", r.status);
    }
    Ok(())
}

fn describe(note_id: Uuid, outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Kept { resurface_count, next } => match next {
            PlanOutcome::Scheduled(r) => format!(
                "Kept {note_id} (seen {resurface_count}x), next reminder {}",
                r.fire_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            ),
            PlanOutcome::CapReached { day } => {
                format!("Kept {note_id}, but {day} already has its reminders")
            }
            _ => format!("Kept {note_id}, no further reminders"),
        },
        ActionOutcome::Archived { cancelled } => {
            format!("Archived {note_id}, cancelled {cancelled} reminder(s)")
        }
        ActionOutcome::Snoozed { fire_at, scheduled } if *scheduled => format!(
            "Snoozed {note_id} until {}",
            fire_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        ),
        ActionOutcome::Snoozed { .. } => format!("Could not snooze {note_id}"),
        ActionOutcome::UnknownNote => format!("No note {note_id}"),
    }
}
