//! Calibration log parsing.
//!
//! The digitizer writes a free-form text log next to each run. Only three
//! lines matter: `settling time = <secs>`, `trailer time = <secs>` and,
//! optionally, `start time = <timestamp>`.

use crate::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use rbcal_core::Error as CoreError;
use std::path::Path;

/// Timing extracted from a calibration log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationLog {
    /// Seconds of settling at the start of the run.
    pub settling_secs: f64,
    /// Seconds of trailer at the end of the run.
    pub trailer_secs: f64,
    /// Start of the recording, when logged.
    pub start: Option<DateTime<Utc>>,
}

/// Find the single line containing `key` and return its text after `=`.
fn unique_value<'a>(
    context: &str,
    lines: &[&'a str],
    key: &str,
) -> rbcal_core::Result<Option<(usize, &'a str)>> {
    let mut found = None;
    for (idx, line) in lines.iter().enumerate() {
        let lower = line.to_ascii_lowercase();
        let Some(pos) = lower.find(key) else {
            continue;
        };
        if found.is_some() {
            return Err(CoreError::parse_at(
                context,
                idx + 1,
                format!("'{key}' appears more than once"),
            ));
        }
        // `key` ends with '=', and ASCII lowercasing keeps byte offsets
        found = Some((idx + 1, &line[pos + key.len()..]));
    }
    Ok(found)
}

/// First floating-point token in `text`.
fn first_float(text: &str) -> Option<f64> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .find_map(|token| {
            let trimmed = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
            trimmed.parse::<f64>().ok()
        })
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn required_secs(context: &str, lines: &[&str], key: &str) -> rbcal_core::Result<f64> {
    let (line, value) = unique_value(context, lines, key)?
        .ok_or_else(|| CoreError::parse(context, format!("missing '{key}'")))?;
    first_float(value)
        .ok_or_else(|| CoreError::parse_at(context, line, format!("no number after '{key}'")))
}

/// Parse log text. `context` names the source in error messages.
pub fn parse_log(context: &str, text: &str) -> rbcal_core::Result<CalibrationLog> {
    let lines: Vec<&str> = text.lines().collect();
    let settling_secs = required_secs(context, &lines, "settling time =")?;
    let trailer_secs = required_secs(context, &lines, "trailer time =")?;

    let start = match unique_value(context, &lines, "start time =")? {
        Some((line, value)) => Some(parse_timestamp(value).ok_or_else(|| {
            CoreError::parse_at(context, line, format!("unreadable start time '{}'", value.trim()))
        })?),
        None => None,
    };

    Ok(CalibrationLog {
        settling_secs,
        trailer_secs,
        start,
    })
}

/// Read and parse a calibration log file.
pub fn read_log<P: AsRef<Path>>(path: P) -> Result<CalibrationLog> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    Ok(parse_log(&path.display().to_string(), &text)?)
}
