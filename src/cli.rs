use clap::Parser;
use std::path::PathBuf;

/// labcal - parse lab protocol documents and schedule Day N tasks as calendar events
#[derive(Debug, Parser)]
#[command(name = "labcal")]
#[command(about = "Parse lab protocol documents and schedule Day N tasks as calendar events", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Protocol document (.pdf, .doc, .docx); not needed with --remove-from-calendar
    pub file: Option<PathBuf>,

    /// Experiment id used to tag calendar entries (e.g. EXP001, ENC)
    #[arg(long)]
    pub id: Option<String>,

    /// Day 0 anchor date (MM/DD/YY, MM/DD/YYYY or YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub day0: Option<String>,

    /// Add the parsed schedule to the calendar (requires --id)
    #[arg(long, conflicts_with_all = ["remove_from_calendar", "update"])]
    pub add_to_calendar: bool,

    /// Remove all calendar events tagged with --id
    #[arg(long, conflicts_with = "update")]
    pub remove_from_calendar: bool,

    /// Replace the stored events for --id with a freshly parsed schedule
    #[arg(long)]
    pub update: bool,

    /// Calendar to operate on (defaults to the configured calendar)
    #[arg(long)]
    pub calendar: Option<String>,

    /// Also write the schedule to a <document>_<id>_calendar.txt file
    #[arg(long)]
    pub summary_file: bool,
}
