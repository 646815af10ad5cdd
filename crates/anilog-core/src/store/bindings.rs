use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::ReminderBinding;

/// Rows of `reminder_bindings`. Knows nothing about the external calendar; see
/// [`crate::reminder::ReminderBinder`] for the part that does.
pub struct BindingStore;

impl BindingStore {
    pub async fn get(
        conn: &mut SqliteConnection,
        title_id: Uuid,
    ) -> Result<Option<ReminderBinding>, CoreError> {
        let binding = sqlx::query_as("SELECT * FROM reminder_bindings WHERE title_id = $1")
            .bind(title_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(binding)
    }

    /// Stores a binding unless one already exists. Returns `true` if written.
    pub async fn insert(
        conn: &mut SqliteConnection,
        title_id: Uuid,
        reminder_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"INSERT INTO reminder_bindings (title_id, reminder_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(title_id) DO NOTHING"#,
        )
        .bind(title_id)
        .bind(reminder_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a row was removed.
    pub async fn remove(conn: &mut SqliteConnection, title_id: Uuid) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM reminder_bindings WHERE title_id = $1")
            .bind(title_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
