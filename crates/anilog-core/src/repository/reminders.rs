use crate::error::CoreError;
use crate::reminder::ReminderBinder;
use crate::repository::{settle, SqliteRepository};
use crate::store::TitleStore;
use async_trait::async_trait;
use sqlx::SqliteConnection;
use uuid::Uuid;

impl SqliteRepository {
    async fn check_reminder(
        &self,
        conn: &mut SqliteConnection,
        binder: &ReminderBinder<'_>,
        id: Uuid,
    ) -> Result<bool, CoreError> {
        if TitleStore::get_by_id(&mut *conn, id).await?.is_none() {
            return Err(CoreError::NotFound(id.to_string()));
        }
        binder.exists(&mut *conn, id).await
    }
}

#[async_trait]
impl super::ReminderRepository for SqliteRepository {
    async fn has_reminder(&self, id: Uuid) -> Result<bool, CoreError> {
        let binder = self.binder();
        let mut tx = self.pool().begin().await?;
        let result = self.check_reminder(&mut tx, &binder, id).await;
        settle(tx, &binder, result).await
    }
}
