//! Date assignment and schedule rendering.
//!
//! Pure calendar-day arithmetic: a Day-0 anchor plus each entry's offset.
//! Dates are `chrono::NaiveDate` throughout; there is no time-of-day or
//! timezone handling anywhere in the pipeline.

use anyhow::{anyhow, Result};
use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::protocol::ProtocolEntry;

/// Accepted `--day0` input formats. The dashed two-digit-year form must be
/// tried before the ISO form: `%Y` also accepts two digits, so `10-11-25`
/// would otherwise parse as year 10.
pub const DAY0_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%m-%d-%y", "%m-%d-%Y", "%Y-%m-%d"];

/// A protocol entry with its assigned calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedEntry {
    pub day: u32,
    pub description: String,
    pub date: NaiveDate,
}

/// Parse a Day-0 anchor date in any of the supported formats.
pub fn parse_day0(input: &str) -> Result<NaiveDate> {
    for format in DAY0_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Ok(date);
        }
    }
    Err(anyhow!(
        "could not parse Day 0 date '{}' (supported formats: MM/DD/YY, MM/DD/YYYY, YYYY-MM-DD)",
        input
    ))
}

/// Assign a calendar date to every entry: `day0 + entry.day` days.
pub fn assign_dates(
    entries: impl IntoIterator<Item = ProtocolEntry>,
    day0: NaiveDate,
) -> Result<Vec<DatedEntry>> {
    entries
        .into_iter()
        .map(|entry| {
            let date = day0
                .checked_add_days(Days::new(u64::from(entry.day)))
                .ok_or_else(|| anyhow!("day offset {} is beyond the calendar range", entry.day))?;
            Ok(DatedEntry { day: entry.day, description: entry.description, date })
        })
        .collect()
}

/// Render the assigned schedule for terminal output.
pub fn format_schedule(entries: &[DatedEntry], experiment_id: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n{}\n\n", "LAB PROTOCOL CALENDAR", "=".repeat(80)));
    for entry in entries {
        out.push_str(&format!("Day {:3} ({}):\n", entry.day, entry.date.format("%A, %B %d, %Y")));
        match experiment_id {
            Some(id) => out.push_str(&format!(
                "  ID: {}, Day {}: {}\n\n",
                id, entry.day, entry.description
            )),
            None => out.push_str(&format!("  {}\n\n", entry.description)),
        }
    }
    out
}

/// Render the text summary written next to the parsed document.
pub fn render_summary(
    title: Option<&str>,
    experiment_id: Option<&str>,
    day0: NaiveDate,
    entries: &[DatedEntry],
) -> String {
    let mut out = String::new();
    out.push_str("LAB PROTOCOL CALENDAR\n");
    if let Some(title) = title {
        out.push_str(&format!("Title: {title}\n"));
    }
    if let Some(id) = experiment_id {
        out.push_str(&format!("Experiment ID: {id}\n"));
    }
    out.push_str(&format!("Day 0: {}\n", day0.format("%A, %B %d, %Y")));
    out.push_str(&format!("{}\n\n", "=".repeat(80)));
    for entry in entries {
        out.push_str(&format!("Day {:3} ({}):\n", entry.day, entry.date.format("%A, %B %d, %Y")));
        match experiment_id {
            Some(id) => out.push_str(&format!(
                "  ID: {}, Day {}: {}\n\n",
                id, entry.day, entry.description
            )),
            None => out.push_str(&format!("  {}\n\n", entry.description)),
        }
    }
    out
}
