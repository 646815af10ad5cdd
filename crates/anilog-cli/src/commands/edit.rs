use crate::cli::EditCommand;
use crate::commands::{print_changes, warn_reminder};
use crate::parser::parse_broadcast_time;
use crate::util::resolve_title;
use anilog_core::models::TitleData;
use anilog_core::repository::Repository;
use anilog_core::schedule::BroadcastCalendar;
use anyhow::{bail, Result};
use chrono::Utc;
use owo_colors::{OwoColorize, Style};

pub async fn edit_title(
    repo: &impl Repository,
    calendar: &BroadcastCalendar,
    command: EditCommand,
) -> Result<()> {
    let title = resolve_title(repo, &command.title).await?;

    let mut data = TitleData::from(&title);
    let mut touched = false;
    if let Some(name) = command.name {
        data.name = name;
        touched = true;
    }
    if let Some(total) = command.total {
        data.total_episodes = total;
        touched = true;
    }
    if let Some(first) = command.first {
        data.first_episode_at = parse_broadcast_time(&first, &calendar.timezone(), Utc::now())?;
        touched = true;
    }
    if let Some(current) = command.current {
        data.current_episode = current;
        touched = true;
    }
    if let Some(cover) = command.cover {
        data.cover = cover;
        touched = true;
    }
    if !touched {
        bail!("Nothing to change. Pass at least one of --name, --total, --first, --current or --cover.");
    }

    let outcome = repo.update_title(title.id, data).await?;

    println!(
        "{} Updated title: {}",
        "✓".style(Style::new().green().bold()),
        outcome.title.name.bright_white().bold()
    );
    println!("  {} State: {}", "→".blue(), outcome.state.cyan());
    print_changes(&outcome.changes);
    warn_reminder(outcome.reminder);

    Ok(())
}
