//! Universal iCalendar file sink.
//!
//! Keeps one master `.ics` file per calendar name under an export directory.
//! Create appends a `VEVENT`, list parses the file back, delete rewrites the
//! file without the matching event block. The file itself is the universal
//! export: it imports into Google Calendar, Outlook, or any other calendar
//! application.

use chrono::NaiveDate;
use log::debug;
use std::fs;
use std::io::BufReader;
use std::path::PathBuf;
use uuid::Uuid;

use super::{CalendarError, CalendarSink, EventHandle, ProtocolEvent, StoredEvent};

const ICS_HEADER: &str = "BEGIN:VCALENDAR\n\
                          VERSION:2.0\n\
                          PRODID:-//labcal//Lab Protocol Calendar//EN\n\
                          CALSCALE:GREGORIAN\n\
                          METHOD:PUBLISH\n";
const ICS_FOOTER: &str = "END:VCALENDAR\n";

pub struct FileCalendar {
    dir: PathBuf,
}

impl FileCalendar {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the master file backing one calendar name.
    pub fn calendar_path(&self, calendar: &str) -> PathBuf {
        let slug: String =
            calendar.chars().map(|c| if c.is_alphanumeric() { c } else { '_' }).collect();
        self.dir.join(format!("{slug}.ics"))
    }

    fn read_calendar(&self, calendar: &str) -> Result<Option<String>, CalendarError> {
        let path = self.calendar_path(calendar);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| CalendarError::Sink(format!("failed to read {}: {e}", path.display())))
    }

    fn write_calendar(&self, calendar: &str, content: &str) -> Result<(), CalendarError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| CalendarError::Sink(format!("failed to create {}: {e}", self.dir.display())))?;
        let path = self.calendar_path(calendar);
        fs::write(&path, content)
            .map_err(|e| CalendarError::Sink(format!("failed to write {}: {e}", path.display())))
    }
}

/// Escape text for an ICS property value.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
}

/// Reverse of [`escape_text`], applied to parsed property values.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}

fn event_block(event: &ProtocolEvent) -> String {
    let date = event.date.format("%Y%m%d");
    // The uuid suffix keeps UIDs unique across repeated day numbers.
    let uid = format!(
        "{}-{}-{}@labcal",
        escape_text(&event.experiment_id),
        date,
        Uuid::new_v4().simple()
    );
    format!(
        "BEGIN:VEVENT\n\
         UID:{uid}\n\
         DTSTART;VALUE=DATE:{date}\n\
         DTEND;VALUE=DATE:{date}\n\
         SUMMARY:{summary}\n\
         DESCRIPTION:{description}\n\
         CATEGORIES:Lab Protocol\n\
         STATUS:CONFIRMED\n\
         SEQUENCE:0\n\
         END:VEVENT\n",
        summary = escape_text(&event.title),
        description = escape_text(&event.notes),
    )
}

impl CalendarSink for FileCalendar {
    fn list_events(&self, calendar: &str) -> Result<Vec<StoredEvent>, CalendarError> {
        let path = self.calendar_path(calendar);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&path)
            .map_err(|e| CalendarError::Sink(format!("failed to open {}: {e}", path.display())))?;
        let parser = ical::IcalParser::new(BufReader::new(file));

        let mut events = Vec::new();
        for parsed in parser {
            let parsed = parsed
                .map_err(|e| CalendarError::Sink(format!("invalid ics in {}: {e}", path.display())))?;
            for item in parsed.events {
                let mut uid = None;
                let mut title = None;
                let mut date = None;
                let mut notes = String::new();
                for prop in &item.properties {
                    let Some(value) = prop.value.as_deref() else { continue };
                    match prop.name.as_str() {
                        "UID" => uid = Some(value.to_string()),
                        "SUMMARY" => title = Some(unescape_text(value)),
                        "DESCRIPTION" => notes = unescape_text(value),
                        "DTSTART" => {
                            date = NaiveDate::parse_from_str(value, "%Y%m%d").ok();
                        }
                        _ => {}
                    }
                }
                match (uid, title, date) {
                    (Some(uid), Some(title), Some(date)) => {
                        events.push(StoredEvent { handle: EventHandle(uid), title, date, notes });
                    }
                    _ => debug!("Skipping incomplete VEVENT in {}", path.display()),
                }
            }
        }
        Ok(events)
    }

    fn create_event(&self, calendar: &str, event: &ProtocolEvent) -> Result<(), CalendarError> {
        let block = event_block(event);
        let content = match self.read_calendar(calendar)? {
            Some(existing) => match existing.rfind(ICS_FOOTER.trim_end()) {
                Some(pos) => {
                    let (head, tail) = existing.split_at(pos);
                    format!("{head}{block}{tail}")
                }
                None => {
                    return Err(CalendarError::Sink(format!(
                        "{} is not a valid calendar file (missing END:VCALENDAR)",
                        self.calendar_path(calendar).display()
                    )))
                }
            },
            None => format!("{ICS_HEADER}{block}{ICS_FOOTER}"),
        };
        self.write_calendar(calendar, &content)?;
        debug!("Created '{}' in {}", event.title, self.calendar_path(calendar).display());
        Ok(())
    }

    fn delete_event(&self, calendar: &str, handle: &EventHandle) -> Result<(), CalendarError> {
        let path = self.calendar_path(calendar);
        let Some(content) = self.read_calendar(calendar)? else {
            return Err(CalendarError::Sink(format!("calendar file {} does not exist", path.display())));
        };

        let uid_line = format!("UID:{}", handle.0);
        let mut kept = Vec::new();
        let mut block = Vec::new();
        let mut in_event = false;
        let mut removed = false;
        for line in content.lines() {
            if line.trim() == "BEGIN:VEVENT" {
                in_event = true;
                block.clear();
                block.push(line);
                continue;
            }
            if in_event {
                block.push(line);
                if line.trim() == "END:VEVENT" {
                    in_event = false;
                    if block.iter().any(|l| l.trim() == uid_line) {
                        removed = true;
                    } else {
                        kept.append(&mut block);
                    }
                }
                continue;
            }
            kept.push(line);
        }

        if !removed {
            return Err(CalendarError::Sink(format!(
                "no event with UID {} in {}",
                handle.0,
                path.display()
            )));
        }

        let mut rewritten = kept.join("\n");
        rewritten.push('\n');
        self.write_calendar(calendar, &rewritten)?;
        debug!("Deleted UID {} from {}", handle.0, path.display());
        Ok(())
    }
}
