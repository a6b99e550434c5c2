// src/workbook/width.rs

const MIN_WIDTH: f64 = 8.0;
const MAX_WIDTH: f64 = 60.0;
const PADDING: f64 = 2.0;

/// Per-character width contribution, in Excel column-width units.
fn char_weight(c: char) -> f64 {
    match c {
        'á' | 'é' | 'í' | 'ó' | 'ú' | 'ñ' | 'ü' | 'Á' | 'É' | 'Í' | 'Ó' | 'Ú' | 'Ñ' | 'Ü' => 1.2,
        'W' | 'M' | 'm' | 'w' | '@' => 1.5,
        'i' | 'j' | 'l' | 't' | 'f' | 'r' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.6,
        '0'..='9' => 1.0,
        _ => 1.1,
    }
}

fn estimate_cell(value: &str) -> f64 {
    value.chars().map(char_weight).sum()
}

/// Estimate a column width from the header and every cell in the column,
/// clamped so one long value cannot blow up the sheet.
pub fn estimate_column_width<'a, I>(header: &str, cells: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    let widest = cells
        .into_iter()
        .map(estimate_cell)
        .fold(estimate_cell(header), f64::max);
    (widest + PADDING).clamp(MIN_WIDTH, MAX_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_minimum() {
        assert_eq!(estimate_column_width("a", ["b", "c"]), MIN_WIDTH);
    }

    #[test]
    fn clamps_to_maximum() {
        let long = "x".repeat(200);
        assert_eq!(estimate_column_width("h", [long.as_str()]), MAX_WIDTH);
    }

    #[test]
    fn widest_cell_wins() {
        let narrow = estimate_column_width("header", ["iiiiiiiiiiii"]);
        let wide = estimate_column_width("header", ["MMMMMMMMMMMM"]);
        assert!(wide > narrow);
    }

    #[test]
    fn header_counts_toward_width() {
        let w = estimate_column_width("a_rather_long_header_name", ["x"]);
        assert!(w > MIN_WIDTH);
    }
}
