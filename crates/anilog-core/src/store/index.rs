use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{ChangeSet, LifecycleState, Title};
use crate::schedule::WeekBounds;

/// The two derived marker tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Worklist {
    Airing,
    Upcoming,
}

impl Worklist {
    pub(crate) fn table(self) -> &'static str {
        match self {
            Worklist::Airing => "airing_entries",
            Worklist::Upcoming => "upcoming_entries",
        }
    }
}

/// Which worklists a title belongs in. Never both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub airing: bool,
    pub upcoming: bool,
}

impl Placement {
    pub fn for_state(title: &Title, state: LifecycleState, this_week: &WeekBounds) -> Self {
        let airing_only = Placement { airing: true, upcoming: false };
        match state {
            // Premieres this week: it already belongs on the worklist
            LifecycleState::Upcoming if this_week.contains(title.first_episode_at) => airing_only,
            LifecycleState::Upcoming => Placement { airing: false, upcoming: true },
            LifecycleState::Airing => airing_only,
            // Finale aired this week: keep it visible until the week is over
            LifecycleState::Completed if this_week.contains(title.last_episode_at()) => airing_only,
            LifecycleState::Completed => Placement::default(),
        }
    }
}

/// Maintains `airing_entries` and `upcoming_entries`. Every write is idempotent.
pub struct IndexStore;

impl IndexStore {
    /// Returns `true` if a row was added.
    pub async fn insert(
        conn: &mut SqliteConnection,
        worklist: Worklist,
        title_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let sql = format!(
            "INSERT INTO {} (title_id, added_at) VALUES ($1, $2) ON CONFLICT(title_id) DO NOTHING",
            worklist.table()
        );
        let result = sqlx::query(&sql)
            .bind(title_id)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a row was removed.
    pub async fn remove(
        conn: &mut SqliteConnection,
        worklist: Worklist,
        title_id: Uuid,
    ) -> Result<bool, CoreError> {
        let sql = format!("DELETE FROM {} WHERE title_id = $1", worklist.table());
        let result = sqlx::query(&sql).bind(title_id).execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn contains(
        conn: &mut SqliteConnection,
        worklist: Worklist,
        title_id: Uuid,
    ) -> Result<bool, CoreError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE title_id = $1", worklist.table());
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(title_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn title_ids(
        conn: &mut SqliteConnection,
        worklist: Worklist,
    ) -> Result<Vec<Uuid>, CoreError> {
        let sql = format!("SELECT title_id FROM {} ORDER BY added_at", worklist.table());
        let ids = sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?;
        Ok(ids)
    }

    /// Brings both worklists in line with `state`. Safe to call unconditionally:
    /// a second call with the same inputs reports no change.
    pub async fn reconcile(
        conn: &mut SqliteConnection,
        title: &Title,
        state: LifecycleState,
        this_week: &WeekBounds,
        now: DateTime<Utc>,
    ) -> Result<ChangeSet, CoreError> {
        let target = Placement::for_state(title, state, this_week);
        let airing_changed =
            Self::apply(&mut *conn, Worklist::Airing, title.id, target.airing, now).await?;
        let upcoming_changed =
            Self::apply(&mut *conn, Worklist::Upcoming, title.id, target.upcoming, now).await?;

        if airing_changed || upcoming_changed {
            debug!(
                title_id = %title.id,
                %state,
                airing = target.airing,
                upcoming = target.upcoming,
                "reconciled worklists"
            );
        }

        Ok(ChangeSet {
            airing_changed,
            upcoming_changed,
            reminder_changed: false,
        })
    }

    /// Removes the title from both worklists.
    pub async fn clear(conn: &mut SqliteConnection, title_id: Uuid) -> Result<ChangeSet, CoreError> {
        Ok(ChangeSet {
            airing_changed: Self::remove(&mut *conn, Worklist::Airing, title_id).await?,
            upcoming_changed: Self::remove(&mut *conn, Worklist::Upcoming, title_id).await?,
            reminder_changed: false,
        })
    }

    async fn apply(
        conn: &mut SqliteConnection,
        worklist: Worklist,
        title_id: Uuid,
        present: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        if present {
            Self::insert(conn, worklist, title_id, now).await
        } else {
            Self::remove(conn, worklist, title_id).await
        }
    }
}
