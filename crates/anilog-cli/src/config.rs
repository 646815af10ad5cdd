use crate::timezone::detect_system_timezone;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_FILE: &str = "anilog.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// IANA timezone broadcast slots and weeks are evaluated in
    #[serde(default = "detect_system_timezone")]
    pub timezone: String,
    /// Directory the `.ics` reminder files are written to
    #[serde(default = "default_calendar_dir")]
    pub calendar_dir: PathBuf,
    /// Minutes before each episode the reminder alarm fires
    #[serde(default = "default_reminder_lead_minutes")]
    pub reminder_lead_minutes: u32,
    /// Keep reminders in memory only
    #[serde(default)]
    pub no_calendar: bool,
}

fn default_database_path() -> String {
    "anilog.db".to_string()
}

fn default_calendar_dir() -> PathBuf {
    PathBuf::from("anilog-calendar")
}

fn default_reminder_lead_minutes() -> u32 {
    10
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed("ANILOG_")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }
}
