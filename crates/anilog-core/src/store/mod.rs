//! Table access scoped to a caller-supplied connection.
//!
//! Every function takes `&mut SqliteConnection`, so the orchestrator can pass
//! `&mut *tx` and run a whole unit of work inside one transaction.

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::ChangeSet;

pub mod bindings;
pub mod index;
pub mod titles;

pub use bindings::BindingStore;
pub use index::{IndexStore, Placement, Worklist};
pub use titles::TitleStore;

/// Presence of every derived record for one title at a point in a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedSnapshot {
    pub airing: bool,
    pub upcoming: bool,
    pub reminder_id: Option<String>,
}

impl DerivedSnapshot {
    pub async fn load(conn: &mut SqliteConnection, title_id: Uuid) -> Result<Self, CoreError> {
        Ok(Self {
            airing: IndexStore::contains(&mut *conn, Worklist::Airing, title_id).await?,
            upcoming: IndexStore::contains(&mut *conn, Worklist::Upcoming, title_id).await?,
            reminder_id: BindingStore::get(&mut *conn, title_id)
                .await?
                .map(|binding| binding.reminder_id),
        })
    }

    /// Net difference between two snapshots of the same title.
    pub fn diff(&self, after: &DerivedSnapshot) -> ChangeSet {
        ChangeSet {
            airing_changed: self.airing != after.airing,
            upcoming_changed: self.upcoming != after.upcoming,
            reminder_changed: self.reminder_id != after.reminder_id,
        }
    }
}
