use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::delivery::{
    pending_within, remove_prefix, upsert, DayWindow, DeliveryError, DeliveryService,
    PendingReminder, QueuedReminder, ReminderPayload,
};

/// In-process delivery queue for hosts that poll for due reminders
/// themselves, and for tests.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    queue: Mutex<Vec<QueuedReminder>>,
    reject_schedule: AtomicBool,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `schedule` calls fail, as an unavailable platform service would.
    pub fn set_rejecting(&self, reject: bool) {
        self.reject_schedule.store(reject, Ordering::SeqCst);
    }

    /// Everything pending, earliest first.
    pub fn all(&self) -> Vec<QueuedReminder> {
        self.lock().clone()
    }

    pub fn get(&self, reminder_id: &str) -> Option<QueuedReminder> {
        self.lock()
            .iter()
            .find(|q| q.reminder_id == reminder_id)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueuedReminder>> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeliveryService for MemoryDelivery {
    fn schedule(
        &self,
        reminder_id: &str,
        fire_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<(), DeliveryError> {
        if self.reject_schedule.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected(format!(
                "scheduling disabled, dropped {reminder_id}"
            )));
        }
        upsert(
            &mut self.lock(),
            QueuedReminder {
                reminder_id: reminder_id.to_string(),
                fire_at,
                payload: payload.clone(),
            },
        );
        Ok(())
    }

    fn cancel(&self, reminder_id_prefix: &str) -> Result<usize, DeliveryError> {
        Ok(remove_prefix(&mut self.lock(), reminder_id_prefix))
    }

    fn list_pending(&self, day: &DayWindow) -> Result<Vec<PendingReminder>, DeliveryError> {
        Ok(pending_within(&self.lock(), day))
    }
}
