use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::ProviderError;
use crate::reminder::{ReminderProvider, ReminderRequest};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    reminders: BTreeMap<String, ReminderRequest>,
    denied: bool,
}

/// Reminder provider that keeps everything in process memory.
///
/// Backs the CLI's `--no-calendar` mode and the test suites. Access can be
/// revoked and reminders removed behind the binder's back to exercise the
/// failure paths.
///
/// Ids are `mem-<uuid v4>`, unique across processes, so a binding written by
/// one run never names a reminder created by another. Reminders die with the
/// process; a later run sees such bindings as stale and drops them.
#[derive(Debug, Default)]
pub struct MemoryReminderProvider {
    state: Mutex<State>,
}

impl MemoryReminderProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// While denied, every call fails with [`ProviderError::PermissionDenied`].
    pub fn deny_access(&self, denied: bool) {
        self.lock().denied = denied;
    }

    /// Deletes a reminder without going through the binder, the way a user
    /// would from their calendar app.
    pub fn remove_out_of_band(&self, reminder_id: &str) -> bool {
        self.lock().reminders.remove(reminder_id).is_some()
    }

    pub fn contains(&self, reminder_id: &str) -> bool {
        self.lock().reminders.contains_key(reminder_id)
    }

    pub fn len(&self) -> usize {
        self.lock().reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of stored reminders, ordered by id.
    pub fn reminders(&self) -> Vec<(String, ReminderRequest)> {
        self.lock()
            .reminders
            .iter()
            .map(|(id, request)| (id.clone(), request.clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn checked(&self) -> Result<MutexGuard<'_, State>, ProviderError> {
        let state = self.lock();
        if state.denied {
            return Err(ProviderError::PermissionDenied);
        }
        Ok(state)
    }
}

#[async_trait]
impl ReminderProvider for MemoryReminderProvider {
    async fn create_reminder(&self, request: &ReminderRequest) -> Result<String, ProviderError> {
        let mut state = self.checked()?;
        let id = format!("mem-{}", Uuid::new_v4());
        state.reminders.insert(id.clone(), request.clone());
        Ok(id)
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), ProviderError> {
        let mut state = self.checked()?;
        state
            .reminders
            .remove(reminder_id)
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(reminder_id.to_string()))
    }

    async fn reminder_exists(&self, reminder_id: &str) -> Result<bool, ProviderError> {
        Ok(self.checked()?.reminders.contains_key(reminder_id))
    }
}
