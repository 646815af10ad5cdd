//! Time/status calculation.
//!
//! Everything here is pure given `now`. Instants are UTC; weekdays, times of day
//! and week boundaries are read in the [`BroadcastCalendar`]'s timezone because
//! broadcast slots are local wall-clock times.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;
use crate::models::{LifecycleState, Title, TitleSummary};
use crate::timezone::{local_to_utc, parse_timezone};

/// Seconds between two consecutive episodes.
pub const WEEK_SECONDS: i64 = 604_800;

/// Broadcast instant of the last episode of a weekly series.
pub fn last_episode_at(first_episode_at: DateTime<Utc>, total_episodes: i64) -> DateTime<Utc> {
    first_episode_at + Duration::seconds((total_episodes.max(1) - 1) * WEEK_SECONDS)
}

/// `Airing` is inclusive at both ends.
pub fn lifecycle_state(
    first_episode_at: DateTime<Utc>,
    last_episode_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> LifecycleState {
    if now < first_episode_at {
        LifecycleState::Upcoming
    } else if now <= last_episode_at {
        LifecycleState::Airing
    } else {
        LifecycleState::Completed
    }
}

/// Monday 00:00:00 through Sunday 23:59:59 of one local week, as UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekBounds {
    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Weekly broadcast arithmetic evaluated in one timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastCalendar {
    timezone: Tz,
}

impl Default for BroadcastCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl BroadcastCalendar {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    pub fn from_name(timezone: &str) -> Result<Self, CoreError> {
        parse_timezone(timezone).map(Self::new)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn local_monday(&self, instant: DateTime<Utc>) -> NaiveDate {
        let local = instant.with_timezone(&self.timezone).date_naive();
        local - Duration::days(local.weekday().num_days_from_monday() as i64)
    }

    /// Bounds of the ISO week containing `now`.
    pub fn week_bounds(&self, now: DateTime<Utc>) -> WeekBounds {
        let monday = self.local_monday(now);
        let next_monday = monday + Duration::days(7);
        WeekBounds {
            start: local_to_utc(&self.timezone, monday.and_time(NaiveTime::MIN)),
            end: local_to_utc(&self.timezone, next_monday.and_time(NaiveTime::MIN))
                - Duration::seconds(1),
        }
    }

    /// Whether this week's occurrence of the weekly slot has already come.
    ///
    /// Compares `(weekday, hour, minute)` of `now` against the slot's; equal counts
    /// as passed.
    pub fn is_weekly_slot_passed(&self, slot: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let key = |instant: DateTime<Utc>| {
            let local = instant.with_timezone(&self.timezone);
            (local.weekday().number_from_monday(), local.hour(), local.minute())
        };
        key(now) >= key(slot)
    }

    /// Weekly slots due by the end of `now`'s week, counting the first episode's
    /// week as 1. Not clamped to the series length.
    pub fn episodes_due_by(&self, first_episode_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let weeks = (self.local_monday(now) - self.local_monday(first_episode_at))
            .num_days()
            .div_euclid(7);
        weeks.max(0) + 1
    }

    /// Episodes that have aired by `now`, clamped to the series.
    pub fn current_episode_for_airing(
        &self,
        first_episode_at: DateTime<Utc>,
        total_episodes: i64,
        now: DateTime<Utc>,
    ) -> i64 {
        let last = last_episode_at(first_episode_at, total_episodes);
        match lifecycle_state(first_episode_at, last, now) {
            LifecycleState::Upcoming => 0,
            LifecycleState::Completed => total_episodes,
            LifecycleState::Airing => {
                let due = self.episodes_due_by(first_episode_at, now);
                let aired = if self.is_weekly_slot_passed(first_episode_at, now) {
                    due
                } else {
                    due - 1
                };
                aired.min(total_episodes).max(1)
            }
        }
    }

    pub fn starts_this_week(&self, first_episode_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.week_bounds(now).contains(first_episode_at)
    }

    pub fn finale_this_week(&self, last_episode_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.week_bounds(now).contains(last_episode_at)
    }

    /// A reminder is kept while a title airs, or once its premiere falls in the current week.
    pub fn wants_reminder(&self, title: &Title, now: DateTime<Utc>) -> bool {
        match title.state_at(now) {
            LifecycleState::Airing => true,
            LifecycleState::Upcoming => self.starts_this_week(title.first_episode_at, now),
            LifecycleState::Completed => false,
        }
    }

    pub fn summarize(&self, title: Title, now: DateTime<Utc>) -> TitleSummary {
        let local_first = title.first_episode_at.with_timezone(&self.timezone);
        TitleSummary {
            state: title.state_at(now),
            last_episode_at: title.last_episode_at(),
            weekday: local_first.weekday(),
            slot_time: local_first.time(),
            title,
        }
    }
}
