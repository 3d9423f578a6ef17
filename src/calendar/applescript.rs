//! Calendar.app integration via AppleScript.
//!
//! Each sink operation shells out to `osascript` with a generated script and
//! parses its stdout. Events are deleted by `uid`, recorded at list time,
//! since titles are not unique across repeated day numbers.

use chrono::{Datelike, NaiveDate};
use log::debug;
use std::process::Command;

use super::{CalendarError, CalendarSink, EventHandle, ProtocolEvent, StoredEvent};

/// Field separator for the list script's output lines. Unlikely to appear in
/// titles or notes; lines that still split wrong are skipped.
const FIELD_SEP: &str = "|||";

pub struct AppleScriptCalendar;

impl AppleScriptCalendar {
    pub fn new() -> Self {
        Self
    }

    /// Whether this machine can drive Calendar.app at all.
    pub fn available() -> bool {
        if !cfg!(target_os = "macos") {
            return false;
        }
        Command::new("osascript")
            .arg("-e")
            .arg("return 1")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn run_script(&self, script: &str) -> Result<String, CalendarError> {
        debug!("Generated AppleScript:\n{script}");
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|e| CalendarError::Sink(format!("failed to run osascript: {e}")))?;
        if !output.status.success() {
            return Err(CalendarError::Sink(format!(
                "osascript failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn ensure_running(&self) -> Result<(), CalendarError> {
        let script = r#"tell application "Calendar"
            if it is not running then
                launch
                delay 1
            end if
            return true
        end tell"#;
        self.run_script(script).map(|_| ())
    }

    /// Create the calendar if Calendar.app does not have it yet.
    fn ensure_calendar(&self, calendar: &str) -> Result<(), CalendarError> {
        let script = format!(
            r#"tell application "Calendar"
                try
                    set calFound to false
                    repeat with cal in calendars
                        if name of cal is "{name}" then
                            set calFound to true
                            exit repeat
                        end if
                    end repeat
                    if not calFound then
                        make new calendar with properties {{name:"{name}"}}
                    end if
                    return "Success"
                on error errMsg
                    error "Failed to prepare calendar: " & errMsg
                end try
            end tell"#,
            name = escape_applescript(calendar),
        );
        self.run_script(&script).map(|_| ())
    }
}

impl Default for AppleScriptCalendar {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape a value for interpolation into a quoted AppleScript string.
fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn parse_listed_line(line: &str) -> Option<StoredEvent> {
    let mut fields = line.splitn(4, FIELD_SEP);
    let uid = fields.next()?.trim();
    let title = fields.next()?.trim();
    let date = NaiveDate::parse_from_str(fields.next()?.trim(), "%Y-%m-%d").ok()?;
    let notes = fields.next().unwrap_or("").trim();
    if uid.is_empty() {
        return None;
    }
    Some(StoredEvent {
        handle: EventHandle(uid.to_string()),
        title: title.to_string(),
        date,
        notes: notes.to_string(),
    })
}

impl CalendarSink for AppleScriptCalendar {
    fn list_events(&self, calendar: &str) -> Result<Vec<StoredEvent>, CalendarError> {
        self.ensure_running()?;
        let script = format!(
            r#"tell application "Calendar"
                try
                    set output to ""
                    repeat with cal in calendars
                        if name of cal is "{name}" then
                            repeat with ev in events of cal
                                set d to start date of ev
                                set y to year of d as string
                                set m to text -2 thru -1 of ("0" & ((month of d as integer) as string))
                                set dd to text -2 thru -1 of ("0" & (day of d as string))
                                set evNotes to ""
                                try
                                    set evNotes to description of ev
                                end try
                                set output to output & uid of ev & "{sep}" & summary of ev & "{sep}" & y & "-" & m & "-" & dd & "{sep}" & evNotes & linefeed
                            end repeat
                            exit repeat
                        end if
                    end repeat
                    return output
                on error errMsg
                    error "Failed to list events: " & errMsg
                end try
            end tell"#,
            name = escape_applescript(calendar),
            sep = FIELD_SEP,
        );
        let stdout = self.run_script(&script)?;
        let mut events = Vec::new();
        for line in stdout.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_listed_line(line) {
                Some(event) => events.push(event),
                None => debug!("Skipping unparseable event line: {line}"),
            }
        }
        Ok(events)
    }

    fn create_event(&self, calendar: &str, event: &ProtocolEvent) -> Result<(), CalendarError> {
        self.ensure_running()?;
        self.ensure_calendar(calendar)?;
        let script = format!(
            r#"tell application "Calendar"
                try
                    repeat with cal in calendars
                        if name of cal is "{name}" then
                            tell cal
                                set startDate to current date
                                set year of startDate to {year}
                                set month of startDate to {month}
                                set day of startDate to {day}
                                set hours of startDate to 0
                                set minutes of startDate to 0
                                set seconds of startDate to 0
                                set newEvent to make new event at end with properties {{summary:"{title}", start date:startDate, end date:(startDate + 1 * days), description:"{notes}"}}
                                set allday event of newEvent to true
                            end tell
                            exit repeat
                        end if
                    end repeat
                    return "Success: Event created"
                on error errMsg
                    error "Failed to create event: " & errMsg
                end try
            end tell"#,
            name = escape_applescript(calendar),
            year = event.date.year(),
            month = event.date.month(),
            day = event.date.day(),
            title = escape_applescript(&event.title),
            notes = escape_applescript(&event.notes),
        );
        let stdout = self.run_script(&script)?;
        if stdout.contains("Success") {
            debug!("Created '{}' in Calendar.app calendar '{calendar}'", event.title);
            Ok(())
        } else {
            Err(CalendarError::Sink(format!("failed to create event: {}", stdout.trim())))
        }
    }

    fn delete_event(&self, calendar: &str, handle: &EventHandle) -> Result<(), CalendarError> {
        self.ensure_running()?;
        let script = format!(
            r#"tell application "Calendar"
                try
                    set calFound to false
                    repeat with cal in calendars
                        if name of cal is "{name}" then
                            set calFound to true
                            delete (every event of cal whose uid is "{uid}")
                            exit repeat
                        end if
                    end repeat
                    if not calFound then
                        error "Calendar '{name}' not found"
                    end if
                    return "Success: Event deleted"
                on error errMsg
                    error "Failed to delete event: " & errMsg
                end try
            end tell"#,
            name = escape_applescript(calendar),
            uid = escape_applescript(&handle.0),
        );
        let stdout = self.run_script(&script)?;
        if stdout.contains("Success") {
            debug!("Deleted UID {} from Calendar.app calendar '{calendar}'", handle.0);
            Ok(())
        } else {
            Err(CalendarError::Sink(format!("failed to delete event: {}", stdout.trim())))
        }
    }
}
