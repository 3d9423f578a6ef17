//! End-to-end pipeline tests against the iCalendar file sink:
//! extract entries, assign dates, build events, reconcile.

use anyhow::Result;
use chrono::NaiveDate;
use labcal::calendar::{self, reconcile, CalendarError, CalendarSink, FileCalendar};
use labcal::{protocol, schedule};
use pretty_assertions::assert_eq;

const PROTOCOL: &str = "Endothelial Cell Differentiation\n\
                        Day 0: EB Formation. Day 3: media replacement. Day 5: transfer.";

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[test]
fn parse_add_list_remove_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sink = FileCalendar::new(dir.path());

    let entries = protocol::parse_entries(PROTOCOL);
    let dated = schedule::assign_dates(entries, date("2025-11-05"))?;
    let events = calendar::build_events("ENC", &dated);
    let created = reconcile::add_events(&sink, "Lab Protocols", &events)?;
    assert_eq!(created, 3);

    let listed = sink.list_events("Lab Protocols")?;
    let dates: Vec<NaiveDate> = listed.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![date("2025-11-05"), date("2025-11-08"), date("2025-11-10")]);
    assert!(listed.iter().all(|e| e.notes.contains("[EXPERIMENT_ID:ENC]")));

    let removed = reconcile::remove_events(&sink, "Lab Protocols", "ENC")?;
    assert_eq!(removed, created);
    assert!(reconcile::matching_events(&sink, "Lab Protocols", "ENC")?.is_empty());

    Ok(())
}

#[test]
fn update_recovers_the_anchor_from_stored_events() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sink = FileCalendar::new(dir.path());

    let dated = schedule::assign_dates(protocol::parse_entries(PROTOCOL), date("2025-11-05"))?;
    reconcile::add_events(&sink, "Lab Protocols", &calendar::build_events("ENC", &dated))?;

    // A revised protocol, no anchor supplied: Day 0 comes from the store.
    let revised = protocol::parse_entries("Day 0: EB Formation. Day 7: imaging.");
    let outcome = reconcile::update_events(&sink, "Lab Protocols", "ENC", &revised, None)?;

    assert_eq!(outcome.day0, date("2025-11-05"));
    assert_eq!(outcome.removed, 3);
    assert_eq!(outcome.created, 2);

    let listed = sink.list_events("Lab Protocols")?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].date, date("2025-11-12"));

    Ok(())
}

#[test]
fn update_on_an_empty_store_requires_an_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileCalendar::new(dir.path());
    let entries = protocol::parse_entries(PROTOCOL);

    let err = reconcile::update_events(&sink, "Lab Protocols", "ENC", &entries, None).unwrap_err();
    assert!(matches!(err, CalendarError::Configuration(_)));

    // With an anchor the same call degrades to a plain add.
    let outcome =
        reconcile::update_events(&sink, "Lab Protocols", "ENC", &entries, Some(date("2025-11-05")))
            .unwrap();
    assert_eq!(outcome.created, 3);
    assert_eq!(outcome.removed, 0);
}

#[test]
fn partial_ids_match_across_experiments() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sink = FileCalendar::new(dir.path());

    for id in ["enc1", "ENC2", "encore"] {
        let dated = schedule::assign_dates(protocol::parse_entries("Day 0: seed."), date("2025-11-05"))?;
        reconcile::add_events(&sink, "Lab Protocols", &calendar::build_events(id, &dated))?;
    }

    let matched = reconcile::matching_events(&sink, "Lab Protocols", "enc")?;
    assert_eq!(matched.len(), 3);

    let removed = reconcile::remove_events(&sink, "Lab Protocols", "ENC")?;
    assert_eq!(removed, 3);

    Ok(())
}

#[test]
fn removing_an_unknown_id_is_a_zero_count_success() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sink = FileCalendar::new(dir.path());
    assert_eq!(reconcile::remove_events(&sink, "Lab Protocols", "zzz")?, 0);
    Ok(())
}
