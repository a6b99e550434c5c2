// src/merge/identifier.rs

use crate::parse::section::find_alias;
use crate::Record;

const DATE_ALIASES: &[&str] = &["FechaPagoReal", "fechaPagoReal", "FECHA_PAGO_REAL"];
const SECTION_ALIASES: &[&str] = &[
    "seccionAduanera",
    "seccion",
    "aduana",
    "SECCION",
    "ADUANA",
    "SECCION_ADUANERA",
    "ClaveDoc",
    "SeccionAd",
];
const PATENTE_ALIASES: &[&str] = &["patente", "PATENTE", "Patente"];
const PEDIMENTO_ALIASES: &[&str] = &[
    "pedimento",
    "PEDIMENTO",
    "Pedimento",
    "numeroPedimento",
    "pedimentoNumero",
    "Pediment",
];

fn value_by_alias<'a>(record: &'a Record, aliases: &[&str]) -> Option<&'a str> {
    let keys: Vec<&str> = record.keys().map(String::as_str).collect();
    let key = find_alias(&keys, aliases)?;
    let value = record.get(key)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Derive the hyphen-joined composite identifier from a record:
/// `[year, seccion/aduana, patente, pedimento]`, each part optional and
/// skipped if absent. The year is the 2-digit fragment at offset 2..4 of a
/// `YYYY-MM-DD HH:MM:SS`-style payment date; no further date validation.
/// Total function: a record with none of the parts yields `""`.
pub fn combined_identifier(record: &Record) -> String {
    let year = value_by_alias(record, DATE_ALIASES)
        .filter(|v| v.chars().count() >= 4)
        .map(|v| v.chars().skip(2).take(2).collect::<String>());

    let parts = [
        year,
        value_by_alias(record, SECTION_ALIASES).map(str::to_string),
        value_by_alias(record, PATENTE_ALIASES).map(str::to_string),
        value_by_alias(record, PEDIMENTO_ALIASES).map(str::to_string),
    ];

    parts
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("-")
}
