use anilog_core::models::{LifecycleState, TitleSummary};
use anilog_core::schedule::{BroadcastCalendar, WEEK_SECONDS};
use anilog_core::timezone::format_in_timezone;
use chrono::{DateTime, Duration, Utc};
use chrono_humanize::HumanTime;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use owo_colors::OwoColorize;

/// Broadcast instant of the next episode that has not aired yet.
pub fn next_episode_at(
    summary: &TitleSummary,
    calendar: &BroadcastCalendar,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let title = &summary.title;
    let aired =
        calendar.current_episode_for_airing(title.first_episode_at, title.total_episodes, now);
    (aired < title.total_episodes)
        .then(|| title.first_episode_at + Duration::seconds(aired * WEEK_SECONDS))
}

fn state_cell(state: LifecycleState) -> Cell {
    let cell = Cell::new(state.to_string());
    match state {
        LifecycleState::Airing => cell.fg(Color::Green).add_attribute(Attribute::Bold),
        LifecycleState::Upcoming => cell.fg(Color::Cyan),
        LifecycleState::Completed => cell.fg(Color::DarkGrey),
    }
}

pub fn display_titles(titles: &[TitleSummary], calendar: &BroadcastCalendar, now: DateTime<Utc>) {
    if titles.is_empty() {
        println!("No titles found.");
        return;
    }

    let tz = calendar.timezone();
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "State", "Progress", "Slot", "Next Episode"]);

    for summary in titles {
        let title = &summary.title;
        let mut row = Row::new();
        row.add_cell(Cell::new(&title.id.to_string()[..8]));

        let mut name_cell = Cell::new(&title.name);
        if summary.state == LifecycleState::Completed {
            name_cell = name_cell.fg(Color::DarkGrey);
        }
        row.add_cell(name_cell);
        row.add_cell(state_cell(summary.state));

        let progress = format!("{}/{}", title.current_episode, title.total_episodes);
        let behind = calendar.current_episode_for_airing(title.first_episode_at, title.total_episodes, now)
            > title.current_episode;
        row.add_cell(if behind {
            Cell::new(progress).fg(Color::Yellow)
        } else {
            Cell::new(progress)
        });

        row.add_cell(Cell::new(format_in_timezone(title.first_episode_at, &tz, "%a %H:%M")));

        let next_cell = match next_episode_at(summary, calendar, now) {
            Some(next) => Cell::new(HumanTime::from(next - now).to_string()),
            None => Cell::new("-").fg(Color::DarkGrey),
        };
        row.add_cell(next_cell);
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_title_details(
    summary: &TitleSummary,
    has_reminder: bool,
    calendar: &BroadcastCalendar,
    now: DateTime<Utc>,
) {
    let tz = calendar.timezone();
    let title = &summary.title;
    let format = "%Y-%m-%d %H:%M %Z";

    println!("{}", title.name.bright_white().bold());
    println!("  ID:            {}", title.id);
    println!("  State:         {}", summary.state);
    println!("  Progress:      {}/{}", title.current_episode, title.total_episodes);
    println!(
        "  Slot:          {} {}",
        summary.weekday,
        summary.slot_time.format("%H:%M")
    );
    println!("  First episode: {}", format_in_timezone(title.first_episode_at, &tz, format));
    println!("  Last episode:  {}", format_in_timezone(summary.last_episode_at, &tz, format));
    if let Some(next) = next_episode_at(summary, calendar, now) {
        println!(
            "  Next episode:  {} ({})",
            format_in_timezone(next, &tz, format),
            HumanTime::from(next - now)
        );
    }
    if !title.cover.is_empty() {
        println!("  Cover:         {}", title.cover);
    }
    println!("  Reminder:      {}", if has_reminder { "yes" } else { "no" });
}
