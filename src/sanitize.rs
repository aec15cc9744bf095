// Best-effort cleanup of collaborator output before it reaches the screen.

use regex::Regex;
use std::sync::LazyLock;

/// CSI sequences (`ESC [ params letter`). An unterminated sequence runs to
/// the end of the text, a bare `ESC` matches on its own.
static ANSI_ESCAPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b(?:\[[0-9;?]*[A-Za-z]|\[[^A-Za-z]*$)?")
        .expect("ANSI regex pattern is valid")
});

/// Title and progress lines printed by the network and bluetooth tools,
/// matched at the start of the line.
const BANNERS: &[&str] = &[
    "Available networks",
    "Known Networks",
    "Waiting to connect to bluetoothd",
    "Agent registered",
    "Discovery started",
    "Discovery stopped",
    "[bluetooth]#",
];

/// Column titles of iwctl tables. A line made only of these is a header.
const HEADER_COLUMNS: &[&str] = &[
    "Network name",
    "Name",
    "Security",
    "Signal",
    "Hidden",
    "Last connected",
];

/// Removes CSI escape sequences from `raw`.
pub fn clean(raw: &str) -> String {
    ANSI_ESCAPE_PATTERN.replace_all(raw, "").into_owned()
}

fn is_table_header(trimmed: &str) -> bool {
    let columns: Vec<&str> = trimmed
        .split("  ")
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .collect();

    columns.len() >= 2 && columns.iter().all(|column| HEADER_COLUMNS.contains(column))
}

/// Whether a cleaned line carries content worth showing.
pub fn keep(line: &str) -> bool {
    let trimmed = line.trim();

    if trimmed.chars().count() <= 1 {
        return false;
    }

    if trimmed.chars().all(|c| c == '-' || c == '─' || c == '=') {
        return false;
    }

    if BANNERS.iter().any(|banner| trimmed.starts_with(banner)) {
        return false;
    }

    !is_table_header(trimmed)
}

/// `clean` then `keep`, yielding the trimmed line.
pub fn filter_line(raw: &str) -> Option<String> {
    let line = clean(raw);
    keep(&line).then(|| line.trim_end().to_string())
}
