use crate::cli::AddCommand;
use crate::commands::{print_changes, warn_reminder};
use crate::parser::parse_broadcast_time;
use anilog_core::models::{ReminderStatus, TitleData};
use anilog_core::repository::Repository;
use anilog_core::schedule::BroadcastCalendar;
use anyhow::Result;
use chrono::Utc;
use owo_colors::{OwoColorize, Style};

pub async fn add_title(
    repo: &impl Repository,
    calendar: &BroadcastCalendar,
    command: AddCommand,
) -> Result<()> {
    let first_episode_at = parse_broadcast_time(&command.first, &calendar.timezone(), Utc::now())?;

    let outcome = repo
        .add_title(TitleData {
            name: command.name,
            cover: command.cover,
            total_episodes: command.total,
            current_episode: command.current,
            first_episode_at,
        })
        .await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    println!(
        "{} Added title: {}",
        "✓".style(success_style),
        outcome.title.name.bright_white().bold()
    );
    println!("  {} ID: {}", "→".style(info_style), outcome.title.id);
    println!("  {} State: {}", "→".style(info_style), outcome.state.cyan());
    if outcome.reminder == ReminderStatus::Bound {
        println!("  {} Calendar reminder created", "→".style(info_style));
    }
    print_changes(&outcome.changes);
    warn_reminder(outcome.reminder);

    Ok(())
}
