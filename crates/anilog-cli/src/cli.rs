use chrono::Weekday;
use clap::{Parser, Subcommand, ValueEnum};

/// Follow airing anime and keep your watchlists and calendar reminders in sync
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Keep reminders in memory instead of writing calendar files.
    /// They last only for this run; later runs drop their bindings as stale.
    #[arg(long, global = true)]
    pub no_calendar: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Follow a new title
    Add(AddCommand),
    /// Edit a title
    Edit(EditCommand),
    /// Stop following a title
    Delete(DeleteCommand),
    /// Show one title in detail
    Show(ShowCommand),
    /// List titles
    List(ListCommand),
    /// Bring episode progress, worklists and reminders up to date
    Refresh(RefreshCommand),
    /// Check whether a title has a live calendar reminder
    Reminder(ReminderCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The name of the title
    pub name: String,
    /// Number of episodes in the season
    #[clap(short, long)]
    pub total: i64,
    /// When the first episode airs (e.g. "2024-04-06 23:00", "next saturday 23:00")
    #[clap(short, long)]
    pub first: String,
    /// Episodes already watched
    #[clap(short, long, default_value_t = 0)]
    pub current: i64,
    /// Cover image URL
    #[clap(long, default_value = "")]
    pub cover: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// Name or ID prefix of the title to edit
    pub title: String,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New total number of episodes
    #[arg(long)]
    pub total: Option<i64>,
    /// New first-episode broadcast time (same formats as `add --first`)
    #[arg(long)]
    pub first: Option<String>,
    /// Episodes already watched
    #[arg(long)]
    pub current: Option<i64>,
    /// New cover image URL (empty to clear)
    #[arg(long)]
    pub cover: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// Name or ID prefix of the title to delete
    pub title: String,
    /// Force deletion without confirmation
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// Name or ID prefix of the title
    pub title: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Which titles to list
    #[clap(value_enum, default_value_t = ListScope::All)]
    pub scope: ListScope,
    /// Only titles broadcast on this weekday (mon..sun)
    #[clap(short, long, value_parser = parse_weekday)]
    pub weekday: Option<Weekday>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Every followed title
    All,
    /// The "airing now" worklist
    Airing,
    /// The "upcoming" watchlist
    Upcoming,
}

#[derive(Parser, Debug, Clone)]
pub struct RefreshCommand {
    /// Sweep only the airing worklist
    #[clap(long)]
    pub airing: bool,
    /// Sweep only the upcoming watchlist
    #[clap(long)]
    pub upcoming: bool,
}

impl RefreshCommand {
    /// Neither flag means both sweeps.
    pub fn sweeps(&self) -> (bool, bool) {
        if !self.airing && !self.upcoming {
            (true, true)
        } else {
            (self.airing, self.upcoming)
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ReminderCommand {
    /// Name or ID prefix of the title
    pub title: String,
}

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    value
        .parse::<Weekday>()
        .map_err(|_| format!("'{}' is not a weekday (use mon, tue, ... sun)", value))
}
