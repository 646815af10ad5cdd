use crate::clock::{Clock, SystemClock};
use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    ChangeSet, DeleteOutcome, LifecycleState, RefreshReport, ReminderStatus, Title, TitleData,
    TitleOutcome, TitleSummary,
};
use crate::reminder::{ReminderBinder, ReminderProvider};
use crate::schedule::BroadcastCalendar;
use crate::store::{IndexStore, TitleStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub mod reminders;
pub mod titles;
pub mod worklists;

/// Title lifecycle operations. Every write recomputes the title's derived
/// records inside the same transaction.
#[async_trait]
pub trait TitleRepository {
    async fn add_title(&self, data: TitleData) -> Result<TitleOutcome, CoreError>;
    /// Adds every title or none of them.
    async fn add_titles(&self, batch: Vec<TitleData>) -> Result<Vec<TitleOutcome>, CoreError>;
    async fn update_title(&self, id: Uuid, data: TitleData) -> Result<TitleOutcome, CoreError>;
    async fn delete_title(&self, id: Uuid) -> Result<DeleteOutcome, CoreError>;
    async fn get_title(&self, id: Uuid) -> Result<TitleSummary, CoreError>;
    async fn find_title_by_name(&self, name: &str) -> Result<Option<Title>, CoreError>;
    async fn find_titles_by_id_prefix(&self, prefix: &str) -> Result<Vec<Title>, CoreError>;
    async fn list_titles(&self) -> Result<Vec<TitleSummary>, CoreError>;
}

/// The derived "airing now" and "upcoming" worklists.
#[async_trait]
pub trait WorklistRepository {
    async fn list_airing(&self) -> Result<Vec<TitleSummary>, CoreError>;
    async fn list_upcoming(&self) -> Result<Vec<TitleSummary>, CoreError>;
    async fn refresh_airing_worklist(&self) -> Result<RefreshReport, CoreError>;
    async fn refresh_upcoming_worklist(&self) -> Result<RefreshReport, CoreError>;
}

#[async_trait]
pub trait ReminderRepository {
    /// Whether the title has a live external reminder. Removes stale bindings.
    async fn has_reminder(&self, id: Uuid) -> Result<bool, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository: TitleRepository + WorklistRepository + ReminderRepository {}

/// Derived state of one title after reconciliation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DerivedSync {
    pub state: LifecycleState,
    pub changes: ChangeSet,
    pub reminder: ReminderStatus,
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    calendar: BroadcastCalendar,
    clock: Arc<dyn Clock>,
    reminders: Arc<dyn ReminderProvider>,
}

impl SqliteRepository {
    pub fn new(
        pool: DbPool,
        calendar: BroadcastCalendar,
        reminders: Arc<dyn ReminderProvider>,
    ) -> Self {
        Self {
            pool,
            calendar,
            clock: Arc::new(SystemClock),
            reminders,
        }
    }

    /// Replaces the wall clock, e.g. with a [`crate::clock::FixedClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn calendar(&self) -> &BroadcastCalendar {
        &self.calendar
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// A fresh binder for one unit of work. Pair it with [`settle`].
    pub(crate) fn binder(&self) -> ReminderBinder<'_> {
        ReminderBinder::new(self.reminders.as_ref(), &self.calendar)
    }

    /// Brings the worklists and the reminder in line with the title's state at
    /// `now`. The one place those rules are applied; every write path ends here.
    pub(crate) async fn sync_derived_state(
        &self,
        conn: &mut SqliteConnection,
        binder: &ReminderBinder<'_>,
        title: &Title,
        now: DateTime<Utc>,
    ) -> Result<DerivedSync, CoreError> {
        let state = title.state_at(now);
        let bounds = self.calendar.week_bounds(now);

        let mut changes = IndexStore::reconcile(&mut *conn, title, state, &bounds, now).await?;
        let bound = binder.sync(&mut *conn, title, now).await?;
        changes.reminder_changed |= bound.changed;

        Ok(DerivedSync {
            state,
            changes,
            reminder: bound.status,
        })
    }

    /// Moves a title's progress up to what has aired and reconciles it.
    /// Returns `None` if the title vanished mid-sweep.
    pub(crate) async fn refresh_title(
        &self,
        conn: &mut SqliteConnection,
        binder: &ReminderBinder<'_>,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<(bool, DerivedSync)>, CoreError> {
        let Some(mut title) = TitleStore::get_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };

        let aired = self
            .calendar
            .current_episode_for_airing(title.first_episode_at, title.total_episodes, now);
        let advanced = aired > title.current_episode;
        if advanced {
            TitleStore::set_current_episode(&mut *conn, id, aired).await?;
            debug!(title_id = %id, from = title.current_episode, to = aired, "advanced episode");
            title.current_episode = aired;
        }

        let sync = self.sync_derived_state(&mut *conn, binder, &title, now).await?;
        Ok(Some((advanced, sync)))
    }

    pub(crate) fn summarize(&self, titles: Vec<Title>, now: DateTime<Utc>) -> Vec<TitleSummary> {
        titles
            .into_iter()
            .map(|title| self.calendar.summarize(title, now))
            .collect()
    }
}

impl Repository for SqliteRepository {}

/// Ends a unit of work. On success the transaction commits and reminders
/// unbound during it are deleted from the provider. On any error, including a
/// failed commit, the transaction rolls back and reminders created during it
/// are withdrawn.
pub(crate) async fn settle<T>(
    tx: Transaction<'_, Sqlite>,
    binder: &ReminderBinder<'_>,
    result: Result<T, CoreError>,
) -> Result<T, CoreError> {
    let committed = match result {
        Ok(value) => tx.commit().await.map(|()| value).map_err(CoreError::from),
        Err(e) => {
            drop(tx);
            Err(e)
        }
    };

    match committed {
        Ok(value) => {
            binder.commit().await;
            Ok(value)
        }
        Err(e) => {
            binder.rollback().await;
            Err(e)
        }
    }
}
