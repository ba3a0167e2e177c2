//! Time utilities: parsing full timestamps, formatting for display and storage.

use crate::errors::{AppError, AppResult};
use chrono::{NaiveDateTime, NaiveTime};

/// Storage format for record/sanction timestamps.
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepts "YYYY-MM-DD HH:MM[:SS]" and the ISO "T" separator.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

pub fn format_time(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn parse_optional_datetime(input: Option<&String>) -> AppResult<Option<NaiveDateTime>> {
    if let Some(s) = input {
        let dt = parse_datetime(s).ok_or_else(|| AppError::InvalidDateTime(s.to_string()))?;
        Ok(Some(dt))
    } else {
        Ok(None)
    }
}

/// Current local wall-clock time, the reference for window evaluation.
pub fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
