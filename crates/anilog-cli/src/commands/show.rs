use crate::util::resolve_title;
use crate::views::table::display_title_details;
use anilog_core::repository::Repository;
use anilog_core::schedule::BroadcastCalendar;
use anyhow::Result;
use chrono::Utc;

pub async fn show_title(repo: &impl Repository, calendar: &BroadcastCalendar, reference: &str) -> Result<()> {
    let title = resolve_title(repo, reference).await?;
    let summary = repo.get_title(title.id).await?;
    let has_reminder = repo.has_reminder(title.id).await?;
    display_title_details(&summary, has_reminder, calendar, Utc::now());
    Ok(())
}
