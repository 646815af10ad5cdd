use anilog_core::db;
use anilog_core::error::CoreError;
use anilog_core::reminder::{IcsCalendarProvider, MemoryReminderProvider, ReminderProvider};
use anilog_core::repository::SqliteRepository;
use anilog_core::schedule::BroadcastCalendar;
use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use util::resolve_title;

mod cli;
mod commands;
mod config;
mod parser;
mod timezone;
mod util;
mod views;

const DEFAULT_LOG_FILTER: &str = "anilog=warn,anilog_core=warn";

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = cli::Cli::parse();
    if let Err(e) = run(cli).await {
        handle_error(e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: cli::Cli) -> Result<()> {
    let config = config::Config::new().context("Failed to load configuration")?;
    let calendar = BroadcastCalendar::from_name(&config.timezone)?;
    let db_pool = db::establish_connection(&config.database_path).await?;

    // In-memory reminders end with the process. Their bindings are dropped as
    // stale the next time a run checks them.
    let reminders: Arc<dyn ReminderProvider> = if cli.no_calendar || config.no_calendar {
        Arc::new(MemoryReminderProvider::new())
    } else {
        Arc::new(IcsCalendarProvider::new(
            &config.calendar_dir,
            config.reminder_lead_minutes,
        ))
    };
    debug!(
        database = %config.database_path,
        timezone = %config.timezone,
        calendar_dir = %config.calendar_dir.display(),
        "configuration loaded"
    );

    let repository = SqliteRepository::new(db_pool, calendar, reminders);

    match cli.command {
        cli::Commands::Add(command) => {
            commands::add::add_title(&repository, &calendar, command).await
        }
        cli::Commands::Edit(command) => {
            commands::edit::edit_title(&repository, &calendar, command).await
        }
        cli::Commands::Delete(command) => {
            let title = resolve_title(&repository, &command.title).await?;

            if !command.force {
                let confirmation = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to stop following '{}'?",
                        title.name
                    ))
                    .default(false)
                    .interact()
                    .unwrap_or(false);

                if !confirmation {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }
            commands::delete::delete_title(&repository, title).await
        }
        cli::Commands::Show(command) => {
            commands::show::show_title(&repository, &calendar, &command.title).await
        }
        cli::Commands::List(command) => {
            commands::list::list_titles(&repository, &calendar, command).await
        }
        cli::Commands::Refresh(command) => commands::refresh::refresh(&repository, command).await,
        cli::Commands::Reminder(command) => {
            commands::reminder::check_reminder(&repository, &command.title).await
        }
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::DuplicateName(name) => {
                eprintln!(
                    "{} You already follow a title named '{}'",
                    "Error:".style(error_style),
                    name.yellow()
                );
            }
            CoreError::AmbiguousId(titles) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, name) in titles {
                    eprintln!("  {} ({})", id.yellow(), name);
                }
            }
            CoreError::Validation(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
                let suggestions = timezone::suggest_timezone(s.trim_start_matches("Invalid timezone: "));
                if !suggestions.is_empty() {
                    eprintln!("Did you mean: {}?", suggestions.join(", "));
                }
            }
            _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
