use crate::cli::{ListCommand, ListScope};
use crate::views::table::display_titles;
use anilog_core::repository::Repository;
use anilog_core::schedule::BroadcastCalendar;
use anyhow::Result;
use chrono::Utc;

pub async fn list_titles(
    repo: &impl Repository,
    calendar: &BroadcastCalendar,
    command: ListCommand,
) -> Result<()> {
    let mut titles = match command.scope {
        ListScope::All => repo.list_titles().await?,
        ListScope::Airing => repo.list_airing().await?,
        ListScope::Upcoming => repo.list_upcoming().await?,
    };

    if let Some(weekday) = command.weekday {
        titles.retain(|summary| summary.weekday == weekday);
    }

    display_titles(&titles, calendar, Utc::now());
    Ok(())
}
