// src/parse/section.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// Filename pattern that pins a section code for the whole file:
/// an underscore, exactly three digits, then `.asc` (case-insensitive).
static FILENAME_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_(\d{3})\.asc$").unwrap());

/// Header aliases (case-insensitive) that mark a per-row section column.
pub const SECTION_COLUMN_ALIASES: &[&str] = &[
    "section",
    "sectioncode",
    "section_code",
    "code",
    "seccion",
    "seccionaduanera",
    "seccion_aduanera",
];

/// The known section codes, in the priority order used for sheet emission.
/// Codes outside this list are still processed, just flagged informationally.
pub const KNOWN_SECTION_CODES: &[&str] = &[
    "501", "502", "503", "504", "505", "506", "507", "508", "509", "510", "511", "512", "520",
    "701", "702", "551", "552", "553", "554", "555", "556", "557", "558",
];

pub fn is_known_section(code: &str) -> bool {
    KNOWN_SECTION_CODES.contains(&code)
}

/// Extract the section code from a file name like `folderA/x_501.asc`.
pub fn section_from_filename(file_name: &str) -> Option<String> {
    FILENAME_SECTION_RE
        .captures(file_name)
        .map(|c| c[1].to_string())
}

/// Resolve an ordered alias list against a set of headers: the first alias
/// with a case-insensitive header match wins, and the header is returned as
/// written in the file. Alias order, not header order, decides priority.
pub fn find_alias<'a>(headers: &[&'a str], aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|a| headers.iter().copied().find(|h| h.eq_ignore_ascii_case(a)))
}
