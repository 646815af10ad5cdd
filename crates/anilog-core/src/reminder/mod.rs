//! External calendar reminders.
//!
//! A [`ReminderProvider`] is the calendar on the other side of the boundary. The
//! [`ReminderBinder`] keeps one reminder per title in step with the title's
//! lifecycle and absorbs every provider failure.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::ProviderError;
use crate::models::Title;
use crate::schedule::WEEK_SECONDS;

pub mod binder;
pub mod ics;
pub mod memory;

pub use binder::{BindOutcome, ReminderBinder};
pub use ics::IcsCalendarProvider;
pub use memory::MemoryReminderProvider;

/// Snapshot of a title handed to the provider when a reminder is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub title_id: Uuid,
    pub name: String,
    pub first_episode_at: DateTime<Utc>,
    pub current_episode: i64,
    pub total_episodes: i64,
}

impl ReminderRequest {
    /// Broadcast instant of the first episode not yet watched.
    pub fn next_episode_at(&self) -> DateTime<Utc> {
        let index = self.current_episode.clamp(0, self.total_episodes - 1);
        self.first_episode_at + Duration::seconds(index * WEEK_SECONDS)
    }

    /// Weekly occurrences the reminder should cover, at least one.
    pub fn remaining_episodes(&self) -> i64 {
        (self.total_episodes - self.current_episode).max(1)
    }
}

impl From<&Title> for ReminderRequest {
    fn from(title: &Title) -> Self {
        Self {
            title_id: title.id,
            name: title.name.clone(),
            first_episode_at: title.first_episode_at,
            current_episode: title.current_episode,
            total_episodes: title.total_episodes,
        }
    }
}

/// A calendar that can hold reminders addressed by opaque ids.
#[async_trait]
pub trait ReminderProvider: Send + Sync {
    async fn create_reminder(&self, request: &ReminderRequest) -> Result<String, ProviderError>;
    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), ProviderError>;
    async fn reminder_exists(&self, reminder_id: &str) -> Result<bool, ProviderError>;
}
