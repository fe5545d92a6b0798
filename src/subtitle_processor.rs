use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: SRT parsing into timed captions

// @const: Single SRT timestamp, HH:MM:SS,mmm
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2}),(\d{3})$").unwrap()
});

// @const: Blank lines between blocks, including lines of only spaces or tabs
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n(?:[ \t]*\n)+").unwrap()
});

/// Separator between the two timestamps of a timing line
pub const TIMING_ARROW: &str = " --> ";

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    // @field: Index line as written in the track
    pub index: String,

    // @field: Cue start (time of day)
    pub start: NaiveTime,

    // @field: Cue end (time of day)
    pub end: NaiveTime,

    // @field: Text lines joined by a single space
    pub text: String,
}

impl Caption {
    /// Creates a new caption
    pub fn new(index: impl Into<String>, start: NaiveTime, end: NaiveTime, text: impl Into<String>) -> Self {
        Caption {
            index: index.into(),
            start,
            end,
            text: text.into(),
        }
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        format_timestamp(self.start)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        format_timestamp(self.end)
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{}{}{}", self.format_start_time(), TIMING_ARROW, self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`) into a time of day
pub fn parse_timestamp(timestamp: &str) -> Result<NaiveTime, String> {
    let trimmed = timestamp.trim();
    let caps = TIMESTAMP_REGEX
        .captures(trimmed)
        .ok_or_else(|| format!("'{}' is not in HH:MM:SS,mmm format", trimmed))?;

    // The regex guarantees ASCII digits, so these parses cannot fail
    let field = |i: usize| caps[i].parse::<u32>().unwrap_or_default();
    let (hours, minutes, seconds, millis) = (field(1), field(2), field(3), field(4));

    NaiveTime::from_hms_milli_opt(hours, minutes, seconds, millis)
        .ok_or_else(|| format!("'{}' is out of range for a time of day", trimmed))
}

/// Format a time of day as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_timestamp(time: NaiveTime) -> String {
    format!(
        "{:02}:{:02}:{:02},{:03}",
        time.hour(),
        time.minute(),
        time.second(),
        time.nanosecond() / 1_000_000
    )
}

/// Parse SRT content into captions, in block order.
///
/// Blocks are separated by blank lines; a line holding only spaces or tabs
/// counts as blank. A block needs an index line, a timing line and at least
/// one text line; shorter blocks are skipped.
/// A block of the right shape with a bad timing line fails the whole track.
pub fn parse_srt(content: &str) -> Result<Vec<Caption>, SubtitleError> {
    let normalized = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut captions = Vec::new();
    let mut skipped = 0;

    let blocks = BLOCK_SEPARATOR
        .split(&normalized)
        .filter(|block| !block.trim().is_empty());

    for (block_idx, block) in blocks.enumerate() {
        let block_number = block_idx + 1;
        // Only the first and last blocks can carry blank edge lines
        let lines: Vec<&str> = block.lines().filter(|line| !line.trim().is_empty()).collect();

        if lines.len() < 3 {
            skipped += 1;
            debug!("Skipping block {} with {} line(s)", block_number, lines.len());
            continue;
        }

        let (start, end) = parse_timing_line(lines[1]).map_err(|reason| SubtitleError::InvalidTimestamp {
            block: block_number,
            line: lines[1].to_string(),
            reason,
        })?;

        let text = lines[2..]
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join(" ");

        captions.push(Caption::new(lines[0], start, end, text));
    }

    if skipped > 0 {
        debug!("Parsed {} captions, skipped {} malformed block(s)", captions.len(), skipped);
    }

    Ok(captions)
}

/// Read and parse an SRT file
pub fn parse_srt_file<P: AsRef<Path>>(path: P) -> Result<Vec<Caption>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
    parse_srt(&content).with_context(|| format!("Failed to parse subtitle file: {}", path.display()))
}

fn parse_timing_line(line: &str) -> Result<(NaiveTime, NaiveTime), String> {
    let (start, end) = line
        .split_once(TIMING_ARROW)
        .ok_or_else(|| format!("missing '{}' separator", TIMING_ARROW.trim()))?;

    Ok((parse_timestamp(start)?, parse_timestamp(end)?))
}
