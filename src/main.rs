use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::info;

use labcal::calendar::{self, reconcile};
use labcal::cli::Cli;
use labcal::config::Config;
use labcal::{extract, protocol, schedule};

fn main() -> Result<()> {
    labcal::init_logger();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let calendar_name = cli.calendar.clone().unwrap_or_else(|| config.calendar_name());

    if cli.remove_from_calendar {
        let id = require_id(&cli, "--remove-from-calendar")?;
        let sink = calendar::default_sink(&config)?;
        let removed = reconcile::remove_events(sink.as_ref(), &calendar_name, id)?;
        println!("Removed {removed} event(s) tagged with '{id}' from '{calendar_name}'");
        return Ok(());
    }

    let file = cli
        .file
        .as_deref()
        .ok_or_else(|| anyhow!("a protocol document is required (unless using --remove-from-calendar)"))?;

    info!("Reading {}", file.display());
    let text = extract::extract_text(file)?;

    let title = protocol::document_title(&text).map(str::to_string);
    if let Some(title) = &title {
        println!("Title: {title}");
    }
    if cli.id.is_none() {
        if let Some(suggestion) = title.as_deref().and_then(protocol::suggested_id) {
            println!("Suggested experiment id: {suggestion}");
        }
    }

    let entries = protocol::parse_entries(&text);
    if entries.is_empty() {
        return Err(anyhow!(
            "no Day entries found in {} (expected markers like 'Day 0:', 'Day 1:')",
            file.display()
        ));
    }
    info!("Found {} day entries", entries.len());

    let supplied_day0: Option<NaiveDate> =
        cli.day0.as_deref().map(schedule::parse_day0).transpose()?;

    if cli.update {
        let id = require_id(&cli, "--update")?;
        let sink = calendar::default_sink(&config)?;
        let outcome =
            reconcile::update_events(sink.as_ref(), &calendar_name, id, &entries, supplied_day0)?;
        println!(
            "Updated '{id}' in '{calendar_name}': removed {} event(s), created {} (Day 0: {})",
            outcome.removed,
            outcome.created,
            outcome.day0.format("%A, %B %d, %Y")
        );
        return Ok(());
    }

    let day0 = supplied_day0.unwrap_or_else(|| Local::now().date_naive());
    println!("Day 0 set to {}", day0.format("%A, %B %d, %Y"));

    let dated = schedule::assign_dates(entries, day0)?;
    println!("{}", schedule::format_schedule(&dated, cli.id.as_deref()));

    if cli.summary_file {
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("protocol");
        let name = match cli.id.as_deref() {
            Some(id) => format!("{stem}_{id}_calendar.txt"),
            None => format!("{stem}_calendar.txt"),
        };
        let summary =
            schedule::render_summary(title.as_deref(), cli.id.as_deref(), day0, &dated);
        std::fs::write(&name, summary).with_context(|| format!("failed to write {name}"))?;
        println!("Schedule written to {name}");
    }

    if cli.add_to_calendar {
        let id = require_id(&cli, "--add-to-calendar")?;
        reconcile::validate_experiment_id(id)?;
        let events = calendar::build_events(id, &dated);
        let sink = calendar::default_sink(&config)?;
        let created = reconcile::add_events(sink.as_ref(), &calendar_name, &events)?;
        println!("Added {created} event(s) to '{calendar_name}'");
    }

    Ok(())
}

fn require_id<'a>(cli: &'a Cli, flag: &str) -> Result<&'a str> {
    cli.id.as_deref().ok_or_else(|| anyhow!("--id is required with {flag}"))
}
