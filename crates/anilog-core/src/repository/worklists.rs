use crate::error::CoreError;
use crate::models::{RefreshReport, ReminderStatus, TitleSummary};
use crate::reminder::ReminderBinder;
use crate::repository::{settle, SqliteRepository};
use crate::store::{IndexStore, TitleStore, Worklist};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::info;

impl SqliteRepository {
    async fn list_worklist(&self, worklist: Worklist) -> Result<Vec<TitleSummary>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let titles = TitleStore::list_in(&mut conn, worklist).await?;
        Ok(self.summarize(titles, self.now()))
    }

    async fn sweep_in(
        &self,
        conn: &mut SqliteConnection,
        binder: &ReminderBinder<'_>,
        worklist: Worklist,
        now: DateTime<Utc>,
    ) -> Result<RefreshReport, CoreError> {
        let ids = IndexStore::title_ids(&mut *conn, worklist).await?;

        let mut report = RefreshReport {
            examined: ids.len(),
            ..Default::default()
        };
        for id in ids {
            let Some((advanced, sync)) = self.refresh_title(&mut *conn, binder, id, now).await? else {
                continue;
            };
            if advanced {
                report.advanced += 1;
            }
            if sync.reminder == ReminderStatus::Failed {
                report.reminder_failures += 1;
            }
            report.changes |= sync.changes;
        }
        Ok(report)
    }

    /// Re-derives every title currently in `worklist` in one transaction.
    async fn sweep(&self, worklist: Worklist) -> Result<RefreshReport, CoreError> {
        let now = self.now();
        let binder = self.binder();
        let mut tx = self.pool().begin().await?;
        let result = self.sweep_in(&mut tx, &binder, worklist, now).await;
        let report = settle(tx, &binder, result).await?;

        info!(
            worklist = worklist.table(),
            examined = report.examined,
            advanced = report.advanced,
            reminder_failures = report.reminder_failures,
            "refreshed worklist"
        );
        Ok(report)
    }
}

#[async_trait]
impl super::WorklistRepository for SqliteRepository {
    async fn list_airing(&self) -> Result<Vec<TitleSummary>, CoreError> {
        self.list_worklist(Worklist::Airing).await
    }

    async fn list_upcoming(&self) -> Result<Vec<TitleSummary>, CoreError> {
        self.list_worklist(Worklist::Upcoming).await
    }

    async fn refresh_airing_worklist(&self) -> Result<RefreshReport, CoreError> {
        self.sweep(Worklist::Airing).await
    }

    async fn refresh_upcoming_worklist(&self) -> Result<RefreshReport, CoreError> {
        self.sweep(Worklist::Upcoming).await
    }
}
