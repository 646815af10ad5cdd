use crate::cli::RefreshCommand;
use crate::commands::print_changes;
use anilog_core::models::RefreshReport;
use anilog_core::repository::Repository;
use anyhow::Result;
use owo_colors::{OwoColorize, Style};

fn print_report(label: &str, report: &RefreshReport) {
    println!(
        "{} Refreshed {}: {} examined, {} advanced",
        "✓".style(Style::new().green().bold()),
        label,
        report.examined,
        report.advanced
    );
    print_changes(&report.changes);
    if report.reminder_failures > 0 {
        eprintln!(
            "{} {} reminder(s) could not be created.",
            "Warning:".yellow().bold(),
            report.reminder_failures
        );
    }
}

pub async fn refresh(repo: &impl Repository, command: RefreshCommand) -> Result<()> {
    let (airing, upcoming) = command.sweeps();

    // Upcoming first so titles premiering this week are swept as airing too
    if upcoming {
        let report = repo.refresh_upcoming_worklist().await?;
        print_report("upcoming", &report);
    }
    if airing {
        let report = repo.refresh_airing_worklist().await?;
        print_report("airing", &report);
    }
    Ok(())
}
