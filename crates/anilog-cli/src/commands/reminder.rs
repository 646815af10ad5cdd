use crate::util::resolve_title;
use anilog_core::repository::Repository;
use anyhow::Result;
use owo_colors::OwoColorize;

pub async fn check_reminder(repo: &impl Repository, reference: &str) -> Result<()> {
    let title = resolve_title(repo, reference).await?;
    if repo.has_reminder(title.id).await? {
        println!("{} {} has a calendar reminder.", "✓".green().bold(), title.name);
    } else {
        println!("{} {} has no calendar reminder.", "✗".bright_black(), title.name);
    }
    Ok(())
}
