//! Help output normalization
//!
//! `make help` listings often end with a free-form trailer introduced by a
//! line reading exactly `Notes`. The trailer is dropped before the listing is
//! published as tool guidance, and an optional preamble is placed in front.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a line that is exactly "Notes"
static NOTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Notes$").unwrap());

/// Whether `line` is the trailer sentinel
///
/// Lines are split on `\n` only, so `"Notes\r"` is not a sentinel.
pub fn is_notes_line(line: &str) -> bool {
    NOTES_RE.is_match(line)
}

/// Drop the sentinel line and everything after it
pub fn process_help_output(output: &str) -> String {
    output
        .split('\n')
        .take_while(|line| !is_notes_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Right-trim the preamble and end it with a blank line, or return `""`
pub fn format_help_preamble(preamble: &str) -> String {
    let trimmed = preamble.trim_end_matches([' ', '\t', '\n', '\r']);
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}\n\n", trimmed)
}

/// Preamble followed by the processed help listing
pub fn compose_description(preamble: &str, help_output: &str) -> String {
    let mut description = format_help_preamble(preamble);
    description.push_str(&process_help_output(help_output));
    description
}
