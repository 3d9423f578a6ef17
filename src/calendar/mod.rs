//! Calendar event model and sink abstraction.
//!
//! The reconciler is written against the [`CalendarSink`] trait; the two
//! implementations (Calendar.app via AppleScript, and a universal `.ics`
//! file store) are selected at the boundary by availability probing so the
//! core logic never branches on platform.

use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::schedule::DatedEntry;

mod applescript;
mod ics_file;
pub mod reconcile;

pub use applescript::AppleScriptCalendar;
pub use ics_file::FileCalendar;

/// Custom error type for calendar operations.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("calendar sink error: {0}")]
    Sink(String),
}

/// A tagged, all-day calendar event built from a dated protocol entry.
///
/// The notes always embed exactly one `[EXPERIMENT_ID:<id>]` tag so the id
/// can be recovered from any persisted event; Update's anchor recovery also
/// relies on the `Day <n>` convention in the title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolEvent {
    pub title: String,
    pub date: NaiveDate,
    pub all_day: bool,
    pub notes: String,
    pub experiment_id: String,
}

impl ProtocolEvent {
    /// Build the event for one dated entry. No I/O.
    pub fn build(experiment_id: &str, entry: &DatedEntry) -> Self {
        Self {
            title: format!("ID: {}, Day {}: {}", experiment_id, entry.day, entry.description),
            date: entry.date,
            all_day: true,
            notes: format!("{} {}", experiment_tag(experiment_id), entry.description),
            experiment_id: experiment_id.to_string(),
        }
    }
}

/// Build events for a whole schedule.
pub fn build_events(experiment_id: &str, entries: &[DatedEntry]) -> Vec<ProtocolEvent> {
    entries.iter().map(|entry| ProtocolEvent::build(experiment_id, entry)).collect()
}

/// The embedded marker associating an event with an experiment id.
pub fn experiment_tag(experiment_id: &str) -> String {
    format!("[EXPERIMENT_ID:{experiment_id}]")
}

static NOTES_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[EXPERIMENT_ID:([^\]]+)\]").unwrap());
static TITLE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ID:\s*([^,]+)").unwrap());
static TITLE_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bDay\s+(\d+)").unwrap());

/// Opaque identifier a sink hands out for later deletion of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHandle(pub String);

/// An event as returned by a sink's list operation.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub handle: EventHandle,
    pub title: String,
    pub date: NaiveDate,
    pub notes: String,
}

/// Recover the experiment id of a stored event: notes tag first, `ID: <id>,`
/// title convention as fallback.
pub fn stored_experiment_id(event: &StoredEvent) -> Option<String> {
    NOTES_TAG
        .captures(&event.notes)
        .or_else(|| TITLE_ID.captures(&event.title))
        .map(|caps| caps[1].trim().to_string())
}

/// Recover the day offset of a stored event from its `Day <n>` title.
pub fn stored_day_number(event: &StoredEvent) -> Option<u32> {
    TITLE_DAY.captures(&event.title).and_then(|caps| caps[1].parse().ok())
}

/// A calendar store the reconciler can list, create, and delete events in.
///
/// All calls are direct and blocking; the sink is the pipeline's only
/// suspension point and no retry is layered on top (a retried create could
/// duplicate events).
pub trait CalendarSink {
    fn list_events(&self, calendar: &str) -> Result<Vec<StoredEvent>, CalendarError>;
    fn create_event(&self, calendar: &str, event: &ProtocolEvent) -> Result<(), CalendarError>;
    fn delete_event(&self, calendar: &str, handle: &EventHandle) -> Result<(), CalendarError>;
}

/// Pick a sink for this machine: Calendar.app when `osascript` responds,
/// the `.ics` file store otherwise.
pub fn default_sink(config: &Config) -> Result<Box<dyn CalendarSink>> {
    if AppleScriptCalendar::available() {
        info!("Using Calendar.app sink");
        Ok(Box::new(AppleScriptCalendar::new()))
    } else {
        let dir = config.export_dir()?;
        info!("Calendar.app unavailable, using iCalendar file sink at {}", dir.display());
        Ok(Box::new(FileCalendar::new(dir)))
    }
}
