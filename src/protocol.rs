//! Day-entry extraction from protocol text.
//!
//! Lab protocols describe their timeline as `Day N: do something.` markers
//! scattered through otherwise free-form text. Extraction scans for those
//! markers and yields them lazily in source order; everything between markers
//! is discarded. Extraction never fails: malformed markers are skipped, and
//! repeated or out-of-order day numbers pass through untouched.

use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};
use serde::Serialize;

/// One `Day N:` task from a protocol document.
///
/// `day` is the offset from the Day-0 anchor, not a calendar date. Duplicates
/// are allowed and source order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolEntry {
    pub day: u32,
    pub description: String,
}

// Matches `Day 5:` and ranges like `Day 5-6:` (the first number wins); the
// description runs to the first period.
static DAY_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDay\s*(\d+)(?:\s*-\s*\d+)?\s*:\s*([^.]*)\.").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lazy iterator over the `Day N:` entries of a protocol text.
///
/// Restartable by calling [`entries`] again on the same text.
pub struct DayEntries<'t> {
    matches: CaptureMatches<'static, 't>,
}

impl<'t> Iterator for DayEntries<'t> {
    type Item = ProtocolEntry;

    fn next(&mut self) -> Option<ProtocolEntry> {
        for caps in self.matches.by_ref() {
            let day = match caps[1].parse::<u32>() {
                Ok(day) => day,
                // A day number too large to represent is treated like any
                // other malformed marker and skipped.
                Err(_) => continue,
            };
            let description = WHITESPACE.replace_all(caps[2].trim(), " ").into_owned();
            return Some(ProtocolEntry { day, description });
        }
        None
    }
}

/// Scan protocol text for day entries, in source order.
///
/// Empty descriptions (`Day 4: .`) are still emitted; callers that want to
/// skip them can filter.
pub fn entries(text: &str) -> DayEntries<'_> {
    DayEntries { matches: DAY_ENTRY.captures_iter(text) }
}

/// Collect all day entries of a protocol text.
pub fn parse_entries(text: &str) -> Vec<ProtocolEntry> {
    entries(text).collect()
}

/// The document title: the first non-empty line that is not itself a day
/// marker.
pub fn document_title(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty() && !line.starts_with("Day"))
}

/// Suggest an experiment id from a document title: the first three
/// alphanumeric characters, uppercased.
pub fn suggested_id(title: &str) -> Option<String> {
    let id: String = title.chars().filter(|c| c.is_alphanumeric()).take(3).collect();
    if id.is_empty() { None } else { Some(id.to_uppercase()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(day: u32, description: &str) -> ProtocolEntry {
        ProtocolEntry { day, description: description.to_string() }
    }

    #[test]
    fn extracts_entries_in_source_order() {
        let text = "Day 0: EB Formation. Day 3: media replacement. Day 5: transfer.";
        assert_eq!(
            parse_entries(text),
            vec![entry(0, "EB Formation"), entry(3, "media replacement"), entry(5, "transfer")]
        );
    }

    #[test]
    fn out_of_order_and_duplicate_days_pass_through() {
        let text = "Day 7: harvest cells. Day 2: seed plates. Day 7: second harvest.";
        assert_eq!(
            parse_entries(text),
            vec![entry(7, "harvest cells"), entry(2, "seed plates"), entry(7, "second harvest")]
        );
    }

    #[test]
    fn empty_descriptions_are_emitted() {
        let text = "Day 1: . Day 2: wash twice.";
        assert_eq!(parse_entries(text), vec![entry(1, ""), entry(2, "wash twice")]);
    }

    #[test]
    fn surrounding_prose_is_discarded() {
        let text = "Neural induction protocol\n\nPrepare media in advance.\n\
                    Day 0: plate cells.\nIncubate overnight at 37C.\nDay 1: change media.\n";
        assert_eq!(parse_entries(text), vec![entry(0, "plate cells"), entry(1, "change media")]);
    }

    #[test]
    fn malformed_day_markers_are_skipped() {
        let text = "Day x: not a number. Day 4: real entry. Day : also bad.";
        assert_eq!(parse_entries(text), vec![entry(4, "real entry")]);
    }

    #[test]
    fn oversized_day_numbers_are_skipped() {
        let text = "Day 99999999999999999999: absurd. Day 1: fine.";
        assert_eq!(parse_entries(text), vec![entry(1, "fine")]);
    }

    #[test]
    fn day_ranges_take_the_first_number() {
        let text = "Day 5-6: passage when confluent.";
        assert_eq!(parse_entries(text), vec![entry(5, "passage when confluent")]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let text = "day 2: feed. DAY 3: starve.";
        assert_eq!(parse_entries(text), vec![entry(2, "feed"), entry(3, "starve")]);
    }

    #[test]
    fn embedded_day_words_do_not_match() {
        let text = "Monday 5: staff meeting. Day 5: the real task.";
        assert_eq!(parse_entries(text), vec![entry(5, "the real task")]);
    }

    #[test]
    fn multiline_descriptions_are_collapsed() {
        let text = "Day 2: replace\n  half the\tmedia.";
        assert_eq!(parse_entries(text), vec![entry(2, "replace half the media")]);
    }

    #[test]
    fn iteration_is_restartable() {
        let text = "Day 0: a. Day 1: b.";
        let first: Vec<_> = entries(text).collect();
        let second: Vec<_> = entries(text).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn no_entries_in_plain_prose() {
        assert!(parse_entries("Nothing to schedule here.").is_empty());
        assert!(parse_entries("").is_empty());
    }

    #[test]
    fn title_is_first_non_day_line() {
        let text = "\n  Endothelial Cell Differentiation  \nDay 0: start.";
        assert_eq!(document_title(text), Some("Endothelial Cell Differentiation"));
    }

    #[test]
    fn title_skips_day_lines() {
        let text = "Day 0: start.\nProtocol v2\n";
        assert_eq!(document_title(text), Some("Protocol v2"));
    }

    #[test]
    fn suggested_id_takes_three_alphanumerics() {
        assert_eq!(suggested_id("Endothelial Cells").as_deref(), Some("END"));
        assert_eq!(suggested_id("3-D culture").as_deref(), Some("3DC"));
        assert_eq!(suggested_id("--"), None);
    }
}
