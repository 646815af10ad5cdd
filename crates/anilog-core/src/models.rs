use chrono::{DateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::ops::BitOrAssign;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;
use crate::schedule;

/// Broadcast lifecycle of a title. Always derived from the title's instants and
/// the current time; never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Upcoming,
    Airing,
    Completed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Upcoming => write!(f, "upcoming"),
            LifecycleState::Airing => write!(f, "airing"),
            LifecycleState::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid lifecycle state: {0}")]
pub struct ParseLifecycleStateError(String);

impl FromStr for LifecycleState {
    type Err = ParseLifecycleStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upcoming" => Ok(LifecycleState::Upcoming),
            "airing" => Ok(LifecycleState::Airing),
            "completed" => Ok(LifecycleState::Completed),
            _ => Err(ParseLifecycleStateError(s.to_string())),
        }
    }
}

/// A followed work. The canonical record every derived table is rebuilt from.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Title {
    pub id: Uuid,
    pub name: String,
    pub cover: String,
    pub total_episodes: i64,
    pub current_episode: i64,
    pub first_episode_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Title {
    /// Broadcast instant of the final episode, one week per episode after the first.
    pub fn last_episode_at(&self) -> DateTime<Utc> {
        schedule::last_episode_at(self.first_episode_at, self.total_episodes)
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> LifecycleState {
        schedule::lifecycle_state(self.first_episode_at, self.last_episode_at(), now)
    }
}

/// Full set of user-editable fields. Used for both creation and replacement;
/// there is no partial patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleData {
    pub name: String,
    pub cover: String,
    pub total_episodes: i64,
    pub current_episode: i64,
    pub first_episode_at: DateTime<Utc>,
}

impl TitleData {
    /// Checks field ranges and normalizes the record: the name is trimmed and the
    /// first-episode instant is truncated to whole seconds.
    pub fn validated(mut self) -> Result<Self, CoreError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(CoreError::Validation("Title name cannot be empty".to_string()));
        }
        if self.total_episodes < 1 {
            return Err(CoreError::Validation(format!(
                "Total episodes must be at least 1, got {}",
                self.total_episodes
            )));
        }
        if self.current_episode < 0 || self.current_episode > self.total_episodes {
            return Err(CoreError::Validation(format!(
                "Current episode must be between 0 and {}, got {}",
                self.total_episodes, self.current_episode
            )));
        }
        if self.first_episode_at.timestamp() < 0 {
            return Err(CoreError::Validation(
                "First episode cannot be before 1970-01-01".to_string(),
            ));
        }
        self.first_episode_at = self
            .first_episode_at
            .with_nanosecond(0)
            .unwrap_or(self.first_episode_at);
        Ok(self)
    }
}

impl From<&Title> for TitleData {
    fn from(title: &Title) -> Self {
        Self {
            name: title.name.clone(),
            cover: title.cover.clone(),
            total_episodes: title.total_episodes,
            current_episode: title.current_episode,
            first_episode_at: title.first_episode_at,
        }
    }
}

/// Row linking a title to an external calendar reminder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ReminderBinding {
    pub title_id: Uuid,
    pub reminder_id: String,
    pub created_at: DateTime<Utc>,
}

/// Which derived collections an operation touched. Callers use it to decide
/// what to refresh.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ChangeSet {
    pub airing_changed: bool,
    pub upcoming_changed: bool,
    pub reminder_changed: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        !(self.airing_changed || self.upcoming_changed || self.reminder_changed)
    }
}

impl BitOrAssign for ChangeSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.airing_changed |= rhs.airing_changed;
        self.upcoming_changed |= rhs.upcoming_changed;
        self.reminder_changed |= rhs.reminder_changed;
    }
}

/// Reminder situation of a title after a write.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    /// The title's state does not call for a reminder.
    NotNeeded,
    /// A binding exists.
    Bound,
    /// A reminder was wanted but the provider could not create one.
    Failed,
}

#[derive(Debug, Clone)]
pub struct TitleOutcome {
    pub title: Title,
    pub state: LifecycleState,
    pub changes: ChangeSet,
    pub reminder: ReminderStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Whether a title row existed and was removed.
    pub removed: bool,
    pub changes: ChangeSet,
}

/// Result of sweeping one of the worklists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Titles found in the swept index.
    pub examined: usize,
    /// Titles whose current episode moved forward.
    pub advanced: usize,
    /// Titles whose reminder was wanted but could not be created.
    pub reminder_failures: usize,
    pub changes: ChangeSet,
}

/// Read projection of a title decorated with everything derived from time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TitleSummary {
    #[serde(flatten)]
    pub title: Title,
    pub state: LifecycleState,
    pub last_episode_at: DateTime<Utc>,
    /// Broadcast weekday in the configured timezone.
    pub weekday: Weekday,
    /// Local broadcast time of day in the configured timezone.
    pub slot_time: NaiveTime,
}
