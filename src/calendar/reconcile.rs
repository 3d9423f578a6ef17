//! Reconciliation of parsed protocol schedules against a calendar sink.
//!
//! Three operations: add, remove-by-id, update-by-id. Matching between a
//! user-supplied experiment id and stored events is case-insensitive
//! substring containment, so a query for `enc` also hits `ENC2` and
//! `encore`; false positives are part of the contract. Zero matches is a
//! success with count zero, never an error.

use chrono::{Days, NaiveDate};
use log::{debug, info, warn};

use super::{
    build_events, stored_day_number, stored_experiment_id, CalendarError, CalendarSink,
    ProtocolEvent, StoredEvent,
};
use crate::protocol::ProtocolEntry;
use crate::schedule;

/// Counts reported by an update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: usize,
    pub removed: usize,
    pub created: usize,
    pub day0: NaiveDate,
}

/// Reject ids that cannot tag or match anything.
pub fn validate_experiment_id(experiment_id: &str) -> Result<(), CalendarError> {
    if experiment_id.trim().is_empty() {
        return Err(CalendarError::Configuration("experiment id must not be empty".into()));
    }
    Ok(())
}

/// Create every event in the sink. No dedup against existing events; callers
/// avoid double-adds themselves (update mode is the exception).
pub fn add_events(
    sink: &dyn CalendarSink,
    calendar: &str,
    events: &[ProtocolEvent],
) -> Result<usize, CalendarError> {
    let mut created = 0;
    for event in events {
        sink.create_event(calendar, event)?;
        created += 1;
        debug!("Created '{}' on {}", event.title, event.date);
    }
    info!("Created {created} event(s) in '{calendar}'");
    Ok(created)
}

/// Stored events whose recovered experiment id contains `experiment_id`,
/// case-insensitively.
pub fn matching_events(
    sink: &dyn CalendarSink,
    calendar: &str,
    experiment_id: &str,
) -> Result<Vec<StoredEvent>, CalendarError> {
    validate_experiment_id(experiment_id)?;
    let needle = experiment_id.to_lowercase();
    Ok(sink
        .list_events(calendar)?
        .into_iter()
        .filter(|event| {
            stored_experiment_id(event)
                .map(|id| id.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect())
}

/// Delete every event tagged with a matching experiment id, returning the
/// count removed.
pub fn remove_events(
    sink: &dyn CalendarSink,
    calendar: &str,
    experiment_id: &str,
) -> Result<usize, CalendarError> {
    let matched = matching_events(sink, calendar, experiment_id)?;
    if matched.is_empty() {
        info!("No events tagged with '{experiment_id}' in '{calendar}'");
        return Ok(0);
    }
    let mut removed = 0;
    for event in &matched {
        sink.delete_event(calendar, &event.handle)?;
        removed += 1;
        debug!("Deleted '{}' on {}", event.title, event.date);
    }
    info!("Removed {removed} event(s) tagged with '{experiment_id}' from '{calendar}'");
    Ok(removed)
}

/// Recover the Day-0 anchor from stored events: a literal Day-0 event wins,
/// otherwise the earliest-day event minus its own offset.
pub fn recover_day0(events: &[StoredEvent]) -> Option<NaiveDate> {
    let mut earliest: Option<(u32, NaiveDate)> = None;
    for event in events {
        let Some(day) = stored_day_number(event) else { continue };
        if day == 0 {
            return Some(event.date);
        }
        match earliest {
            Some((best, _)) if best <= day => {}
            _ => earliest = Some((day, event.date)),
        }
    }
    earliest.and_then(|(day, date)| date.checked_sub_days(Days::new(u64::from(day))))
}

/// Replace the stored schedule for an experiment id with a freshly parsed
/// one.
///
/// With zero existing matches this degrades to a plain add and the anchor
/// must be supplied. Once the old events are deleted, a failure while adding
/// leaves the calendar without events for the id; that at-most-once window
/// is reported, not hidden.
pub fn update_events(
    sink: &dyn CalendarSink,
    calendar: &str,
    experiment_id: &str,
    entries: &[ProtocolEntry],
    supplied_day0: Option<NaiveDate>,
) -> Result<UpdateOutcome, CalendarError> {
    let matched = matching_events(sink, calendar, experiment_id)?;

    if matched.is_empty() {
        let Some(day0) = supplied_day0 else {
            return Err(CalendarError::Configuration(format!(
                "no existing events match '{experiment_id}'; supply an explicit Day 0 date to schedule this protocol"
            )));
        };
        info!("No existing events match '{experiment_id}'; adding fresh schedule");
        let created = add_events(sink, calendar, &rebuild(experiment_id, entries, day0)?)?;
        return Ok(UpdateOutcome { matched: 0, removed: 0, created, day0 });
    }

    let day0 = match supplied_day0.or_else(|| recover_day0(&matched)) {
        Some(day0) => day0,
        None => {
            return Err(CalendarError::Configuration(format!(
                "could not recover a Day 0 date from the {} event(s) matching '{experiment_id}'; supply one explicitly",
                matched.len()
            )))
        }
    };
    debug!("Update anchor for '{experiment_id}': Day 0 = {day0}");

    let events = rebuild(experiment_id, entries, day0)?;

    let mut removed = 0;
    for event in &matched {
        sink.delete_event(calendar, &event.handle)?;
        removed += 1;
    }

    let created = match add_events(sink, calendar, &events) {
        Ok(created) => created,
        Err(e) => {
            warn!("Update add phase failed after deleting old events: {e}");
            return Err(CalendarError::Sink(format!(
                "update failed while re-adding events: {e}. The {removed} previous event(s) for \
                 '{experiment_id}' were already removed; re-run a plain add once the calendar recovers"
            )));
        }
    };

    info!(
        "Updated '{experiment_id}' in '{calendar}': removed {removed}, created {created} (Day 0: {day0})"
    );
    Ok(UpdateOutcome { matched: matched.len(), removed, created, day0 })
}

fn rebuild(
    experiment_id: &str,
    entries: &[ProtocolEntry],
    day0: NaiveDate,
) -> Result<Vec<ProtocolEvent>, CalendarError> {
    let dated = schedule::assign_dates(entries.iter().cloned(), day0)
        .map_err(|e| CalendarError::Configuration(e.to_string()))?;
    Ok(build_events(experiment_id, &dated))
}
