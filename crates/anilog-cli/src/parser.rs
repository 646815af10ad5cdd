use anilog_core::timezone::local_to_utc;
use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses a user-entered broadcast time.
///
/// Accepts RFC 3339, a plain local `YYYY-MM-DD HH:MM` in `tz`, or an English
/// phrase such as "next saturday 23:00" relative to `now`.
pub fn parse_broadcast_time(input: &str, tz: &Tz, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(local_to_utc(tz, naive));
        }
    }

    parse_date_string(input, now.with_timezone(tz), Dialect::Uk)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse broadcast time '{}': {}", input, e))
}
