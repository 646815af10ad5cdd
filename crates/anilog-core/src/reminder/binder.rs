use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CoreError, ProviderError};
use crate::models::{ReminderStatus, Title};
use crate::reminder::{ReminderProvider, ReminderRequest};
use crate::schedule::BroadcastCalendar;
use crate::store::BindingStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOutcome {
    pub status: ReminderStatus,
    /// Whether the binding row was created or removed.
    pub changed: bool,
}

/// Provider calls made during one unit of work that may need undoing or
/// finishing once the transaction's fate is known.
#[derive(Debug, Default)]
struct Journal {
    created: Vec<String>,
    pending_deletes: Vec<(Uuid, String)>,
}

/// Keeps a title's optional external reminder in step with its lifecycle.
///
/// Only database errors come back as `Err`. Provider failures are logged and
/// turn into "no reminder", so the relational side never depends on the
/// calendar being reachable.
///
/// One binder spans one transaction. Reminders it creates are journaled and
/// deleted again by [`ReminderBinder::rollback`]; reminders it unbinds are only
/// deleted from the provider by [`ReminderBinder::commit`].
pub struct ReminderBinder<'a> {
    provider: &'a dyn ReminderProvider,
    calendar: &'a BroadcastCalendar,
    journal: Mutex<Journal>,
}

impl<'a> ReminderBinder<'a> {
    pub fn new(provider: &'a dyn ReminderProvider, calendar: &'a BroadcastCalendar) -> Self {
        Self {
            provider,
            calendar,
            journal: Mutex::new(Journal::default()),
        }
    }

    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Creates and binds a reminder if the title wants one and has none.
    ///
    /// An existing binding is left alone. A failed create writes no row.
    pub async fn ensure_bound(
        &self,
        conn: &mut SqliteConnection,
        title: &Title,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome, CoreError> {
        if BindingStore::get(&mut *conn, title.id).await?.is_some() {
            return Ok(BindOutcome { status: ReminderStatus::Bound, changed: false });
        }
        if !self.calendar.wants_reminder(title, now) {
            return Ok(BindOutcome { status: ReminderStatus::NotNeeded, changed: false });
        }

        match self.provider.create_reminder(&ReminderRequest::from(title)).await {
            Ok(reminder_id) => {
                self.journal().created.push(reminder_id.clone());
                let changed = BindingStore::insert(&mut *conn, title.id, &reminder_id, now).await?;
                debug!(title_id = %title.id, %reminder_id, "bound reminder");
                Ok(BindOutcome { status: ReminderStatus::Bound, changed })
            }
            Err(e) => {
                warn!(title_id = %title.id, error = %e, "could not create reminder; continuing without one");
                Ok(BindOutcome { status: ReminderStatus::Failed, changed: false })
            }
        }
    }

    /// Removes the binding row and schedules the external reminder for
    /// deletion at [`ReminderBinder::commit`]. Returns whether a binding existed.
    pub async fn clear(&self, conn: &mut SqliteConnection, title_id: Uuid) -> Result<bool, CoreError> {
        let Some(binding) = BindingStore::get(&mut *conn, title_id).await? else {
            return Ok(false);
        };

        let removed = BindingStore::remove(&mut *conn, title_id).await?;
        self.journal().pending_deletes.push((title_id, binding.reminder_id));
        Ok(removed)
    }

    /// Call after the transaction committed: deletes every unbound reminder
    /// from the provider (best effort).
    pub async fn commit(&self) {
        let pending = {
            let mut journal = self.journal();
            journal.created.clear();
            std::mem::take(&mut journal.pending_deletes)
        };

        for (title_id, reminder_id) in pending {
            match self.provider.delete_reminder(&reminder_id).await {
                Ok(()) => debug!(%title_id, %reminder_id, "deleted reminder"),
                Err(ProviderError::NotFound(_)) => {
                    debug!(%title_id, %reminder_id, "reminder already gone")
                }
                Err(e) => warn!(
                    %title_id,
                    %reminder_id,
                    error = %e,
                    "could not delete reminder; the binding is dropped anyway"
                ),
            }
        }
    }

    /// Call after the transaction rolled back: deletes the reminders created
    /// during it, whose bindings no longer exist. Unbound reminders are kept
    /// since their rows were restored.
    pub async fn rollback(&self) {
        let created = {
            let mut journal = self.journal();
            journal.pending_deletes.clear();
            std::mem::take(&mut journal.created)
        };

        for reminder_id in created {
            match self.provider.delete_reminder(&reminder_id).await {
                Ok(()) | Err(ProviderError::NotFound(_)) => {
                    debug!(%reminder_id, "withdrew reminder from rolled back work")
                }
                Err(e) => warn!(
                    %reminder_id,
                    error = %e,
                    "could not withdraw reminder from rolled back work"
                ),
            }
        }
    }

    /// Whether the title has a reminder that still resolves.
    ///
    /// A binding whose reminder was deleted outside the app is removed here.
    /// When the provider cannot answer at all the row is kept and `false` is
    /// reported.
    pub async fn exists(&self, conn: &mut SqliteConnection, title_id: Uuid) -> Result<bool, CoreError> {
        let Some(binding) = BindingStore::get(&mut *conn, title_id).await? else {
            return Ok(false);
        };

        match self.provider.reminder_exists(&binding.reminder_id).await {
            Ok(true) => Ok(true),
            Ok(false) | Err(ProviderError::NotFound(_)) => {
                BindingStore::remove(&mut *conn, title_id).await?;
                info!(%title_id, reminder_id = %binding.reminder_id, "removed stale reminder binding");
                Ok(false)
            }
            Err(e) => {
                warn!(%title_id, error = %e, "could not verify reminder");
                Ok(false)
            }
        }
    }

    /// Binds or clears according to the title's current state.
    pub async fn sync(
        &self,
        conn: &mut SqliteConnection,
        title: &Title,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome, CoreError> {
        if self.calendar.wants_reminder(title, now) {
            self.ensure_bound(conn, title, now).await
        } else {
            let changed = self.clear(conn, title.id).await?;
            Ok(BindOutcome { status: ReminderStatus::NotNeeded, changed })
        }
    }
}
