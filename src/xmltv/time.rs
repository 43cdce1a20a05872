//! XMLTV timestamp codec
//!
//! The wire grammar is exactly `YYYYMMDDhhmmss ±hhmm`; anything else is
//! rejected. Output is always rendered in UTC with a `+0000` suffix.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{14}) ([+-])(\d{2})(\d{2})$").unwrap());

/// Parse an XMLTV timestamp into an absolute instant.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let caps = TIMESTAMP_RE
        .captures(raw.trim())
        .ok_or_else(|| format!("invalid XMLTV timestamp: '{raw}'"))?;

    let naive = NaiveDateTime::parse_from_str(&caps[1], "%Y%m%d%H%M%S")
        .map_err(|e| format!("invalid XMLTV timestamp '{raw}': {e}"))?;

    let hours: i32 = caps[3].parse().map_err(|_| "invalid offset hours")?;
    let minutes: i32 = caps[4].parse().map_err(|_| "invalid offset minutes")?;
    let mut offset_seconds = hours * 3600 + minutes * 60;
    if &caps[2] == "-" {
        offset_seconds = -offset_seconds;
    }

    let offset = chrono::FixedOffset::east_opt(offset_seconds)
        .ok_or_else(|| format!("invalid timezone offset in '{raw}'"))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("unrepresentable local time in '{raw}'"))
}

/// Format an instant in the XMLTV grammar, always as UTC `+0000`.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    format!("{} +0000", instant.format("%Y%m%d%H%M%S"))
}
