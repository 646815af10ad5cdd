use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{Title, TitleData};
use crate::store::Worklist;

/// CRUD over the `titles` table. A thin store: callers validate input and
/// decide what a write means for the derived tables.
pub struct TitleStore;

impl TitleStore {
    /// Inserts a new title with a fresh id.
    ///
    /// Fails with [`CoreError::DuplicateName`] if the display name is taken.
    pub async fn create(
        conn: &mut SqliteConnection,
        data: &TitleData,
        created_at: DateTime<Utc>,
    ) -> Result<Title, CoreError> {
        if Self::get_by_name(&mut *conn, &data.name).await?.is_some() {
            return Err(CoreError::DuplicateName(data.name.clone()));
        }

        let title: Title = sqlx::query_as(
            r#"INSERT INTO titles (id, name, cover, total_episodes, current_episode, first_episode_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *"#,
        )
        .bind(Uuid::now_v7())
        .bind(&data.name)
        .bind(&data.cover)
        .bind(data.total_episodes)
        .bind(data.current_episode)
        .bind(data.first_episode_at)
        .bind(created_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CoreError::from_insert(e, &data.name))?;

        debug!(title_id = %title.id, name = %title.name, "inserted title");
        Ok(title)
    }

    pub async fn get_by_id(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Title>, CoreError> {
        let title = sqlx::query_as("SELECT * FROM titles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(title)
    }

    pub async fn get_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Title>, CoreError> {
        let title = sqlx::query_as("SELECT * FROM titles WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(title)
    }

    /// Replaces every editable field of an existing title.
    ///
    /// A full replace keeps `first_episode_at` and `total_episodes` from ever
    /// being written apart. Fails with [`CoreError::NotFound`] for unknown ids
    /// and [`CoreError::DuplicateName`] when renaming onto another title.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: Uuid,
        data: &TitleData,
    ) -> Result<Title, CoreError> {
        if let Some(other) = Self::get_by_name(&mut *conn, &data.name).await? {
            if other.id != id {
                return Err(CoreError::DuplicateName(data.name.clone()));
            }
        }

        let title: Option<Title> = sqlx::query_as(
            r#"UPDATE titles
            SET name = $1, cover = $2, total_episodes = $3, current_episode = $4, first_episode_at = $5
            WHERE id = $6
            RETURNING *"#,
        )
        .bind(&data.name)
        .bind(&data.cover)
        .bind(data.total_episodes)
        .bind(data.current_episode)
        .bind(data.first_episode_at)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| CoreError::from_insert(e, &data.name))?;

        let title = title.ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        debug!(title_id = %title.id, "replaced title record");
        Ok(title)
    }

    /// Narrow write used by the worklist sweeps to move progress forward.
    pub async fn set_current_episode(
        conn: &mut SqliteConnection,
        id: Uuid,
        episode: i64,
    ) -> Result<(), CoreError> {
        let result = sqlx::query("UPDATE titles SET current_episode = $1 WHERE id = $2")
            .bind(episode)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Removes a title. Returns whether a row existed; absence is not an error.
    pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Titles whose id starts with `prefix`, in hyphenated or plain hex form.
    /// Anything that is not hex matches nothing.
    pub async fn find_by_id_prefix(
        conn: &mut SqliteConnection,
        prefix: &str,
    ) -> Result<Vec<Title>, CoreError> {
        let hex: String = prefix.chars().filter(|c| *c != '-').collect();
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Vec::new());
        }

        let mut pattern = String::with_capacity(hex.len() + 1);
        pattern.push_str(&hex.to_ascii_uppercase());
        pattern.push('%');

        let titles = sqlx::query_as("SELECT * FROM titles WHERE hex(id) LIKE $1 ORDER BY name")
            .bind(pattern)
            .fetch_all(&mut *conn)
            .await?;
        Ok(titles)
    }

    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Title>, CoreError> {
        let titles = sqlx::query_as("SELECT * FROM titles ORDER BY first_episode_at, name")
            .fetch_all(&mut *conn)
            .await?;
        Ok(titles)
    }

    /// Titles currently present in one of the derived worklists.
    pub async fn list_in(
        conn: &mut SqliteConnection,
        worklist: Worklist,
    ) -> Result<Vec<Title>, CoreError> {
        let sql = format!(
            "SELECT t.* FROM titles t INNER JOIN {} w ON w.title_id = t.id ORDER BY t.first_episode_at, t.name",
            worklist.table()
        );
        let titles = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
        Ok(titles)
    }
}
