use anilog_core::models::{ChangeSet, ReminderStatus};
use owo_colors::{OwoColorize, Style};

pub mod add;
pub mod delete;
pub mod edit;
pub mod list;
pub mod refresh;
pub mod reminder;
pub mod show;

/// Non-blocking notice for a reminder the calendar refused to create.
pub(crate) fn warn_reminder(status: ReminderStatus) {
    if status == ReminderStatus::Failed {
        eprintln!(
            "{} Reminder could not be created; the title was saved without one.",
            "Warning:".yellow().bold()
        );
    }
}

/// One line naming the derived collections a command touched.
pub(crate) fn print_changes(changes: &ChangeSet) {
    if changes.is_empty() {
        return;
    }
    let subtle = Style::new().bright_black();
    let mut touched = Vec::new();
    if changes.airing_changed {
        touched.push("airing");
    }
    if changes.upcoming_changed {
        touched.push("upcoming");
    }
    if changes.reminder_changed {
        touched.push("reminder");
    }
    println!("  {} Updated: {}", "→".style(subtle), touched.join(", ").style(subtle));
}
