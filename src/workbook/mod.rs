// src/workbook/mod.rs

use chrono::Local;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::{error, info, warn};

use crate::parse::section::KNOWN_SECTION_CODES;
use crate::{Record, SectionMap};

pub mod width;

use width::estimate_column_width;

const MAX_SHEET_NAME_LEN: usize = 31;

/// Short descriptive labels for the known section codes of a pedimento
/// extract. Unknown codes fall back to `Section <code>`.
const SECTION_LABELS: &[(&str, &str)] = &[
    ("501", "Datos Generales"),
    ("502", "Transporte Mercancias"),
    ("503", "Guias"),
    ("504", "Contenedores"),
    ("505", "Facturas"),
    ("506", "Fechas Pedimento"),
    ("507", "Casos Pedimento"),
    ("508", "Cuentas Garantia Ped"),
    ("509", "Tasas Pedimento"),
    ("510", "Contribuciones Ped"),
    ("511", "Observaciones Ped"),
    ("512", "Descargos"),
    ("520", "Destinatarios"),
    ("701", "Rectificaciones"),
    ("702", "Diferencias Contrib"),
    ("551", "Partidas"),
    ("552", "Mercancias Partida"),
    ("553", "Permisos Partida"),
    ("554", "Casos Partida"),
    ("555", "Cuentas Garantia Part"),
    ("556", "Tasas Partida"),
    ("557", "Contribuciones Part"),
    ("558", "Observaciones Part"),
];

fn section_label(code: &str) -> String {
    SECTION_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| format!("{} {}", code, label))
        .unwrap_or_else(|| format!("Section {}", code))
}

/// Replace characters Excel forbids in sheet names and truncate to the
/// 31-character limit.
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '[' | ']' | '*' | '?' | '/' | '\\' | ':' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect()
}

/// Section codes in emission order: the known allow-list first, then any
/// extra codes in their encounter order. Stable across runs regardless of
/// map iteration order.
fn ordered_codes(sections: &SectionMap) -> Vec<&str> {
    let mut codes: Vec<&str> = KNOWN_SECTION_CODES
        .iter()
        .copied()
        .filter(|c| sections.contains_key(*c))
        .collect();
    codes.extend(
        sections
            .keys()
            .map(String::as_str)
            .filter(|c| !KNOWN_SECTION_CODES.contains(c)),
    );
    codes
}

fn write_section_sheet(
    sheet: &mut Worksheet,
    code: &str,
    records: &[Record],
    header_format: &Format,
) -> Result<(), XlsxError> {
    sheet.set_name(sanitize_sheet_name(&section_label(code)))?;
    if records.is_empty() {
        return Ok(());
    }

    // Column schema is fixed by the first record; later records may carry
    // different keys. Missing keys render empty, extra keys are dropped.
    let columns: Vec<&str> = records[0].keys().map(String::as_str).collect();
    if columns.is_empty() {
        return Ok(());
    }

    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, header_format)?;
    }
    for (row, record) in records.iter().enumerate() {
        for (col, name) in columns.iter().enumerate() {
            let value = record.get(*name).map(String::as_str).unwrap_or("");
            if !value.is_empty() {
                sheet.write_string((row + 1) as u32, col as u16, value)?;
            }
        }
    }

    for (col, name) in columns.iter().enumerate() {
        let cells = records
            .iter()
            .map(|r| r.get(*name).map(String::as_str).unwrap_or(""));
        sheet.set_column_width(col as u16, estimate_column_width(name, cells))?;
    }
    sheet.autofilter(0, 0, records.len() as u32, (columns.len() - 1) as u16)?;

    Ok(())
}

fn build(sections: &SectionMap) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for code in ordered_codes(sections) {
        let records = &sections[code];
        let sheet = workbook.add_worksheet();
        if let Err(e) = write_section_sheet(sheet, code, records, &header_format) {
            warn!(code = %code, error = %e, "sheet construction failed, substituting error sheet");
            if let Some(sheet) = workbook.worksheets_mut().last_mut() {
                sheet.set_name(sanitize_sheet_name(&format!("Error_{}", code)))?;
                sheet.write_string(0, 0, e.to_string())?;
            }
        }
    }

    workbook.save_to_buffer()
}

/// Serialize the aggregated sections into an XLSX blob: one worksheet per
/// section code, deterministic order, bold filterable header, sized columns.
///
/// Total function. A failing sheet is replaced by a visible `Error_<code>`
/// sheet; if serialization itself faults, a single-sheet error workbook is
/// produced instead, so the caller always gets a downloadable artifact.
#[tracing::instrument(level = "info", skip(sections), fields(sections = sections.len()))]
pub fn build_workbook(sections: &SectionMap) -> Vec<u8> {
    match build(sections) {
        Ok(bytes) => {
            info!(bytes = bytes.len(), "workbook serialized");
            bytes
        }
        Err(e) => {
            error!(error = %e, "workbook serialization failed, emitting error workbook");
            error_workbook(&e.to_string())
        }
    }
}

fn error_workbook(message: &str) -> Vec<u8> {
    let attempt = || -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Error")?;
        sheet.write_string(0, 0, message)?;
        workbook.save_to_buffer()
    };
    attempt().unwrap_or_else(|e| {
        error!(error = %e, "error workbook could not be serialized");
        Vec::new()
    })
}

/// Suggested base file name (no extension) for the finished workbook.
pub fn suggested_name() -> String {
    Local::now()
        .format("pedimentos_consolidados_%Y%m%d_%H%M%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;

    fn record(fields: &[(&str, &str)]) -> Record {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sheet_names_are_sanitized() {
        assert_eq!(sanitize_sheet_name("501 Datos Generales"), "501 Datos Generales");
        assert_eq!(sanitize_sheet_name(r"a[b]c*d?e/f\g:h"), "a_b_c_d_e_f_g_h");
        let long = "x".repeat(50);
        assert_eq!(sanitize_sheet_name(&long).chars().count(), 31);
    }

    #[test]
    fn known_labels_fit_the_sheet_name_limit() {
        for (code, _) in SECTION_LABELS {
            let name = section_label(code);
            assert!(name.chars().count() <= 31, "label too long: {}", name);
            assert!(name.starts_with(code));
        }
        assert_eq!(SECTION_LABELS.len(), 23);
    }

    #[test]
    fn unknown_code_gets_generic_label() {
        assert_eq!(section_label("999"), "Section 999");
    }

    #[test]
    fn emission_order_is_priority_then_encounter() {
        let mut sections = SectionMap::new();
        sections.insert("888".to_string(), vec![]);
        sections.insert("558".to_string(), vec![]);
        sections.insert("501".to_string(), vec![]);
        sections.insert("777".to_string(), vec![]);
        assert_eq!(ordered_codes(&sections), vec!["501", "558", "888", "777"]);
    }

    #[test]
    fn workbook_bytes_are_produced_for_typical_sections() {
        let mut sections = SectionMap::new();
        sections.insert(
            "501".to_string(),
            vec![
                record(&[("No_Pedimento", "25-4-3456-0012345"), ("patente", "3456")]),
                record(&[("No_Pedimento", ""), ("patente", "7777"), ("extra", "dropped")]),
            ],
        );
        sections.insert("506".to_string(), vec![]);
        sections.insert("999".to_string(), vec![record(&[("value", "20")])]);

        let bytes = build_workbook(&sections);
        assert!(!bytes.is_empty());
        // XLSX is a ZIP container.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_section_map_still_yields_a_workbook() {
        // The aggregator never hands over an empty map, but serialization
        // must stay total anyway.
        let sections = SectionMap::new();
        let bytes = build_workbook(&sections);
        assert!(!bytes.is_empty());
    }

    #[test]
    fn workbook_blob_survives_a_disk_round_trip() {
        let mut sections = SectionMap::new();
        sections.insert(
            "501".to_string(),
            vec![record(&[("No_Pedimento", "25-4-3456-0012345")])],
        );
        let bytes = build_workbook(&sections);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("{}.xlsx", suggested_name()));
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn suggested_name_has_fixed_prefix() {
        let name = suggested_name();
        assert!(name.starts_with("pedimentos_consolidados_"));
        assert!(!name.contains('.'));
    }
}
