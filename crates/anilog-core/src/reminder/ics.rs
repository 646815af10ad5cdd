use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::reminder::{ReminderProvider, ReminderRequest};

const PRODUCT_ID: &str = "-//anilog//anilog//EN";
const EPISODE_DURATION: &str = "PT30M";

/// Stores each reminder as a standalone `<uuid>.ics` file that calendar
/// applications can subscribe to or import.
#[derive(Debug, Clone)]
pub struct IcsCalendarProvider {
    dir: PathBuf,
    lead_minutes: u32,
}

impl IcsCalendarProvider {
    pub fn new(dir: impl Into<PathBuf>, lead_minutes: u32) -> Self {
        Self {
            dir: dir.into(),
            lead_minutes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Only ids this provider could have issued map to a path.
    fn path_for(&self, reminder_id: &str) -> Result<PathBuf, ProviderError> {
        let id = Uuid::parse_str(reminder_id)
            .map_err(|_| ProviderError::NotFound(reminder_id.to_string()))?;
        Ok(self.dir.join(format!("{}.ics", id.hyphenated())))
    }

    async fn ensure_dir(&self) -> Result<(), ProviderError> {
        match fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ProviderError::Unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&self.dir).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn render(&self, reminder_id: &str, request: &ReminderRequest, stamp: DateTime<Utc>) -> String {
        let name = escape_text(&request.name);
        let first_pending = (request.current_episode + 1).min(request.total_episodes);
        let description = escape_text(&format!(
            "Episode {} of {}",
            first_pending, request.total_episodes
        ));

        let lines = [
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{}", PRODUCT_ID),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}@anilog", reminder_id),
            format!("DTSTAMP:{}", ics_timestamp(stamp)),
            format!("DTSTART:{}", ics_timestamp(request.next_episode_at())),
            format!("DURATION:{}", EPISODE_DURATION),
            format!("RRULE:FREQ=WEEKLY;COUNT={}", request.remaining_episodes()),
            format!("SUMMARY:{}", name),
            format!("DESCRIPTION:{}", description),
            "BEGIN:VALARM".to_string(),
            "ACTION:DISPLAY".to_string(),
            format!("DESCRIPTION:{}", name),
            format!("TRIGGER:-PT{}M", self.lead_minutes),
            "END:VALARM".to_string(),
            "END:VEVENT".to_string(),
            "END:VCALENDAR".to_string(),
        ];

        let mut out = String::new();
        for line in &lines {
            out.push_str(&fold_line(line));
            out.push_str("\r\n");
        }
        out
    }
}

#[async_trait]
impl ReminderProvider for IcsCalendarProvider {
    async fn create_reminder(&self, request: &ReminderRequest) -> Result<String, ProviderError> {
        self.ensure_dir().await?;
        let reminder_id = Uuid::new_v4().to_string();
        let path = self.path_for(&reminder_id)?;
        fs::write(&path, self.render(&reminder_id, request, Utc::now())).await?;
        debug!(path = %path.display(), title_id = %request.title_id, "wrote calendar file");
        Ok(reminder_id)
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), ProviderError> {
        let path = self.path_for(reminder_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ProviderError::NotFound(reminder_id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(ProviderError::PermissionDenied),
            Err(e) => Err(e.into()),
        }
    }

    async fn reminder_exists(&self, reminder_id: &str) -> Result<bool, ProviderError> {
        if !fs::try_exists(&self.dir).await? {
            return Err(ProviderError::Unavailable(format!(
                "calendar directory {} is missing",
                self.dir.display()
            )));
        }
        let path = match self.path_for(reminder_id) {
            Ok(path) => path,
            Err(ProviderError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(fs::try_exists(&path).await?)
    }
}

fn ics_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// TEXT value escaping from RFC 5545 section 3.3.11.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Content lines longer than 75 octets continue on the next line after a
/// single leading space. Splits never land inside a UTF-8 sequence.
fn fold_line(line: &str) -> String {
    const LIMIT: usize = 75;
    let mut out = String::with_capacity(line.len() + line.len() / LIMIT * 3);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > LIMIT {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out
}
