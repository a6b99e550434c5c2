// src/parse/mod.rs

use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::Record;

pub mod section;

use section::{is_known_section, section_from_filename, SECTION_COLUMN_ALIASES};

/// Output of parsing one flat file.
#[derive(Debug, Default)]
pub struct ParsedRows {
    /// `(section code, record)` pairs in row order.
    pub records: Vec<(String, Record)>,
    /// A filename-resolved section code for a file that parsed to zero data
    /// rows. Registered so an empty sheet still appears for that code.
    pub empty_section: Option<String>,
}

/// Parse one pipe-delimited flat file into section-tagged records.
///
/// The section code comes from the filename suffix `_<3 digits>.asc` when
/// present (applies to every row), otherwise from a per-row section column
/// matched case-insensitively against the known aliases. Returns `None` when
/// the file yields no usable data; that is logged and never fatal to the
/// batch.
#[tracing::instrument(level = "debug", skip(content))]
pub fn parse_table(file_name: &str, content: &str) -> Option<ParsedRows> {
    if content.trim().is_empty() {
        warn!(file = %file_name, "empty file, skipping");
        return None;
    }

    // Files may carry a trailing column separator with no trailing value.
    let normalized: String = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.strip_suffix('|').unwrap_or(l))
        .collect::<Vec<_>>()
        .join("\n");

    let file_section = section_from_filename(file_name);

    let mut rdr = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(Cursor::new(normalized.into_bytes()));

    let mut headers: Vec<String> = Vec::new();
    let mut section_col: Option<usize> = None;
    let mut records: Vec<(String, Record)> = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(file = %file_name, record = idx, error = %e, "unparsable file, skipping");
                return None;
            }
        };

        if idx == 0 {
            headers = row.iter().map(|h| h.trim().to_string()).collect();
            if file_section.is_none() {
                let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
                section_col = section::find_alias(&header_refs, SECTION_COLUMN_ALIASES)
                    .and_then(|hit| headers.iter().position(|h| h.as_str() == hit));
                if section_col.is_none() {
                    warn!(file = %file_name, "no section column and no filename code, skipping");
                    return None;
                }
            }
            continue;
        }

        // Ragged rows are fine: short rows simply miss trailing keys, and
        // cells beyond the header are dropped.
        let mut record = Record::new();
        for (col, value) in headers.iter().zip(row.iter()) {
            record.insert(col.clone(), value.trim().to_string());
        }

        let code = match (&file_section, section_col) {
            (Some(code), _) => code.clone(),
            (None, Some(i)) => {
                let value = row.get(i).map(str::trim).unwrap_or("");
                if value.is_empty() {
                    warn!(file = %file_name, row = idx, "row has no section value, skipping row");
                    continue;
                }
                value.to_string()
            }
            (None, None) => unreachable!("section source checked at header row"),
        };

        if !is_known_section(&code) {
            debug!(file = %file_name, row = idx, code = %code, "section code outside known list");
        }
        records.push((code, record));
    }

    if records.is_empty() {
        if let Some(code) = file_section {
            debug!(file = %file_name, code = %code, "no data rows, registering empty section");
            return Some(ParsedRows {
                records,
                empty_section: Some(code),
            });
        }
        warn!(file = %file_name, "file produced no records, skipping");
        return None;
    }

    Some(ParsedRows {
        records,
        empty_section: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_code_applies_to_every_row() {
        let content = "patente|pedimento|valor\n3456|0012345|10\n3456|0012346|20\n";
        let parsed = parse_table("main/x_501.asc", content).expect("usable");
        assert_eq!(parsed.records.len(), 2);
        assert!(parsed.records.iter().all(|(code, _)| code == "501"));
        assert_eq!(parsed.records[0].1["pedimento"], "0012345");
        assert!(parsed.empty_section.is_none());
    }

    #[test]
    fn section_column_resolves_per_row() {
        let content = "code|value\n501|10\n999|20\n";
        let parsed = parse_table("main/extract.asc", content).expect("usable");
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].0, "501");
        assert_eq!(parsed.records[1].0, "999");
        assert_eq!(parsed.records[1].1["value"], "20");
    }

    #[test]
    fn trailing_delimiter_is_dropped() {
        let content = "code|value|\n501|10|\n";
        let parsed = parse_table("main/extract.asc", content).expect("usable");
        assert_eq!(parsed.records[0].1.len(), 2);
        assert_eq!(parsed.records[0].1["value"], "10");
    }

    #[test]
    fn ragged_rows_yield_partial_records() {
        let content = "a|b|c\n1|2\n1|2|3|4\n";
        let parsed = parse_table("main/x_502.asc", content).expect("usable");
        let short = &parsed.records[0].1;
        assert_eq!(short.len(), 2);
        assert!(!short.contains_key("c"));
        let long = &parsed.records[1].1;
        assert_eq!(long.len(), 3);
    }

    #[test]
    fn values_and_headers_are_trimmed() {
        let content = " code | value \n 501 | 10 \n";
        let parsed = parse_table("main/extract.asc", content).expect("usable");
        assert_eq!(parsed.records[0].0, "501");
        assert_eq!(parsed.records[0].1["value"], "10");
    }

    #[test]
    fn empty_file_is_skipped() {
        assert!(parse_table("main/x_501.asc", "").is_none());
        assert!(parse_table("main/x_501.asc", "  \n \n").is_none());
    }

    #[test]
    fn no_section_source_is_skipped() {
        let content = "a|b\n1|2\n";
        assert!(parse_table("main/plain.asc", content).is_none());
    }

    #[test]
    fn rows_without_section_value_are_skipped() {
        let content = "code|value\n|10\n502|20\n";
        let parsed = parse_table("main/extract.asc", content).expect("usable");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].0, "502");
    }

    #[test]
    fn header_only_file_with_filename_code_registers_empty_section() {
        let content = "patente|pedimento\n";
        let parsed = parse_table("main/y_506.asc", content).expect("usable");
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.empty_section.as_deref(), Some("506"));
    }

    #[test]
    fn header_only_file_without_filename_code_is_skipped() {
        let content = "code|value\n";
        assert!(parse_table("main/extract.asc", content).is_none());
    }
}
