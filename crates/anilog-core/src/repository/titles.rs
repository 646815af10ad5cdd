use crate::error::CoreError;
use crate::models::{DeleteOutcome, Title, TitleData, TitleOutcome, TitleSummary};
use crate::reminder::ReminderBinder;
use crate::repository::{settle, SqliteRepository};
use crate::store::{DerivedSnapshot, IndexStore, TitleStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

impl SqliteRepository {
    async fn insert_title(
        &self,
        conn: &mut SqliteConnection,
        binder: &ReminderBinder<'_>,
        data: TitleData,
        now: DateTime<Utc>,
    ) -> Result<TitleOutcome, CoreError> {
        let data = data.validated()?;
        let title = TitleStore::create(&mut *conn, &data, now).await?;
        let sync = self.sync_derived_state(&mut *conn, binder, &title, now).await?;

        Ok(TitleOutcome {
            title,
            state: sync.state,
            changes: sync.changes,
            reminder: sync.reminder,
        })
    }

    async fn insert_batch(
        &self,
        conn: &mut SqliteConnection,
        binder: &ReminderBinder<'_>,
        batch: Vec<TitleData>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TitleOutcome>, CoreError> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for data in batch {
            outcomes.push(self.insert_title(&mut *conn, binder, data, now).await?);
        }
        Ok(outcomes)
    }

    async fn replace_title(
        &self,
        conn: &mut SqliteConnection,
        binder: &ReminderBinder<'_>,
        id: Uuid,
        data: TitleData,
        now: DateTime<Utc>,
    ) -> Result<TitleOutcome, CoreError> {
        if TitleStore::get_by_id(&mut *conn, id).await?.is_none() {
            return Err(CoreError::NotFound(id.to_string()));
        }
        let before = DerivedSnapshot::load(&mut *conn, id).await?;

        let title = TitleStore::update(&mut *conn, id, &data).await?;

        // Derived rows are rebuilt from scratch.
        IndexStore::clear(&mut *conn, id).await?;
        binder.clear(&mut *conn, id).await?;
        let sync = self.sync_derived_state(&mut *conn, binder, &title, now).await?;

        let after = DerivedSnapshot::load(&mut *conn, id).await?;
        Ok(TitleOutcome {
            title,
            state: sync.state,
            changes: before.diff(&after),
            reminder: sync.reminder,
        })
    }

    async fn remove_title(
        &self,
        conn: &mut SqliteConnection,
        binder: &ReminderBinder<'_>,
        id: Uuid,
    ) -> Result<DeleteOutcome, CoreError> {
        let mut changes = IndexStore::clear(&mut *conn, id).await?;
        changes.reminder_changed = binder.clear(&mut *conn, id).await?;
        let removed = TitleStore::delete(&mut *conn, id).await?;
        Ok(DeleteOutcome { removed, changes })
    }
}

#[async_trait]
impl super::TitleRepository for SqliteRepository {
    async fn add_title(&self, data: TitleData) -> Result<TitleOutcome, CoreError> {
        let now = self.now();
        let binder = self.binder();
        let mut tx = self.pool().begin().await?;
        let result = self.insert_title(&mut tx, &binder, data, now).await;
        let outcome = settle(tx, &binder, result).await?;

        info!(
            title_id = %outcome.title.id,
            name = %outcome.title.name,
            state = %outcome.state,
            "added title"
        );
        Ok(outcome)
    }

    async fn add_titles(&self, batch: Vec<TitleData>) -> Result<Vec<TitleOutcome>, CoreError> {
        let now = self.now();
        let binder = self.binder();
        let mut tx = self.pool().begin().await?;
        let result = self.insert_batch(&mut tx, &binder, batch, now).await;
        let outcomes = settle(tx, &binder, result).await?;

        info!(count = outcomes.len(), "added titles");
        Ok(outcomes)
    }

    async fn update_title(&self, id: Uuid, data: TitleData) -> Result<TitleOutcome, CoreError> {
        let data = data.validated()?;
        let now = self.now();
        let binder = self.binder();
        let mut tx = self.pool().begin().await?;
        let result = self.replace_title(&mut tx, &binder, id, data, now).await;
        let outcome = settle(tx, &binder, result).await?;

        info!(title_id = %id, state = %outcome.state, "updated title");
        Ok(outcome)
    }

    async fn delete_title(&self, id: Uuid) -> Result<DeleteOutcome, CoreError> {
        let binder = self.binder();
        let mut tx = self.pool().begin().await?;
        let result = self.remove_title(&mut tx, &binder, id).await;
        let outcome = settle(tx, &binder, result).await?;

        if outcome.removed {
            info!(title_id = %id, "deleted title");
        }
        Ok(outcome)
    }

    async fn get_title(&self, id: Uuid) -> Result<TitleSummary, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let title = TitleStore::get_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        Ok(self.calendar().summarize(title, self.now()))
    }

    async fn find_title_by_name(&self, name: &str) -> Result<Option<Title>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        TitleStore::get_by_name(&mut conn, name.trim()).await
    }

    async fn find_titles_by_id_prefix(&self, prefix: &str) -> Result<Vec<Title>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        TitleStore::find_by_id_prefix(&mut conn, prefix).await
    }

    async fn list_titles(&self) -> Result<Vec<TitleSummary>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let titles = TitleStore::list(&mut conn).await?;
        Ok(self.summarize(titles, self.now()))
    }
}
