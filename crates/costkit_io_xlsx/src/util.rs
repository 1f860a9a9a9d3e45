//! Stateless helper utilities used by the XLSX reader and writer kernels.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Normalize a cell value for its column kind.
///
/// Numeric columns parse numeric-looking text; non-finite numbers and
/// missing values become blank.
pub fn convert_cell_value(value: &EnumCellValue, if_is_numeric_col: bool) -> EnumCellValue {
    let n_value = match value {
        EnumCellValue::None => return EnumCellValue::None,
        EnumCellValue::String(s) if !if_is_numeric_col => {
            return EnumCellValue::String(s.clone());
        }
        EnumCellValue::String(s) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => return EnumCellValue::String(s.clone()),
        },
        EnumCellValue::Number(n) => *n,
    };

    if n_value.is_finite() {
        EnumCellValue::Number(n_value)
    } else {
        EnumCellValue::None
    }
}

/// Render a number the way a spreadsheet user reads it: integral values
/// without a fractional part, others in shortest round-trip form.
pub fn render_number_text(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{}", x as i64);
    }
    format!("{x}")
}

/// Count of fractional digits in [`render_number_text`] output, capped at 10.
pub fn count_decimal_places(x: f64) -> usize {
    render_number_text(x)
        .split_once('.')
        .map_or(0, |(_, c_frac)| usize::min(c_frac.len(), 10))
}

/// Sum text at `n_decimals` places, free of accumulated float noise.
pub fn render_sum_text(x: f64, n_decimals: usize) -> String {
    let n_scale = 10f64.powi(n_decimals as i32);
    render_number_text((x * n_scale).round() / n_scale)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Make header labels unique by suffixing repeats with `.1`, `.2`, ...
pub fn derive_unique_labels(labels: Vec<String>) -> Vec<String> {
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    let mut l_labels = Vec::with_capacity(labels.len());

    for c_label in labels {
        let mut c_candidate = c_label.clone();
        let mut n_suffix = 1usize;
        while set_seen.contains(&c_candidate) {
            c_candidate = format!("{c_label}.{n_suffix}");
            n_suffix += 1;
        }
        set_seen.insert(c_candidate.clone());
        l_labels.push(c_candidate);
    }

    l_labels
}

/// Resolve column names to sorted unique indices.
pub fn select_sorted_indices_from_names(
    columns: &[String],
    names: Option<&[String]>,
) -> Result<Vec<usize>, String> {
    let Some(names) = names else {
        return Ok(vec![]);
    };

    let mut set_idx = BTreeSet::new();
    for c_name_ref in names {
        let Some(n_idx) = columns.iter().position(|c_name| c_name == c_name_ref) else {
            return Err(format!("Column not found: {c_name_ref:?}"));
        };
        set_idx.insert(n_idx);
    }

    Ok(set_idx.into_iter().collect())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellReferences

/// Convert zero-based column index to its letter name (`0 -> A`, `27 -> AB`).
pub fn derive_column_letter(col_idx: usize) -> String {
    let mut n_rest = col_idx + 1;
    let mut l_chars = Vec::new();
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push((b'A' + n_rem as u8) as char);
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// Build `=SUM(<Col><first>:<Col><last>)` over 1-based inclusive rows.
pub fn derive_sum_formula(col_idx: usize, row_first_1based: usize, row_last_1based: usize) -> String {
    let c_col = derive_column_letter(col_idx);
    format!("=SUM({c_col}{row_first_1based}:{c_col}{row_last_1based})")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_column_letter() {
        assert_eq!(derive_column_letter(0), "A");
        assert_eq!(derive_column_letter(25), "Z");
        assert_eq!(derive_column_letter(26), "AA");
        assert_eq!(derive_column_letter(27), "AB");
        assert_eq!(derive_column_letter(701), "ZZ");
        assert_eq!(derive_column_letter(702), "AAA");
    }

    #[test]
    fn test_derive_sum_formula() {
        assert_eq!(derive_sum_formula(2, 2, 7), "=SUM(C2:C7)");
        assert_eq!(derive_sum_formula(27, 2, 3), "=SUM(AB2:AB3)");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Orders - A/B", "_"), "Orders - A_B");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(
            sanitize_sheet_name("Goods In - An Extremely Long Owner Name", "_")
                .chars()
                .count(),
            N_LEN_EXCEL_SHEET_NAME_MAX
        );
    }

    #[test]
    fn test_derive_unique_labels() {
        let l_labels = derive_unique_labels(vec![
            "Qty".to_string(),
            "Qty".to_string(),
            "Cost".to_string(),
            "Qty".to_string(),
        ]);
        assert_eq!(l_labels, vec!["Qty", "Qty.1", "Cost", "Qty.2"]);
    }

    #[test]
    fn test_validate_unique_columns_reports_positions() {
        let err = validate_unique_columns(&["A".to_string(), "B".to_string(), "A".to_string()])
            .unwrap_err();
        assert!(err.contains("\"A\" x2 at indices [0, 2]"));
    }

    #[test]
    fn test_render_sum_text_drops_float_noise() {
        let n_sum = 0.1 + 0.2;
        assert_eq!(render_number_text(n_sum), "0.30000000000000004");
        assert_eq!(count_decimal_places(0.1), 1);
        assert_eq!(count_decimal_places(12.0), 0);
        assert_eq!(render_sum_text(n_sum, 1), "0.3");
        assert_eq!(render_sum_text(6.75, 2), "6.75");
    }

    #[test]
    fn test_render_number_text() {
        assert_eq!(render_number_text(12.0), "12");
        assert_eq!(render_number_text(3.18), "3.18");
        assert_eq!(render_number_text(-0.5), "-0.5");
    }

    #[test]
    fn test_convert_cell_value_numeric_column() {
        assert_eq!(
            convert_cell_value(&EnumCellValue::String("2.5".to_string()), true),
            EnumCellValue::Number(2.5)
        );
        assert_eq!(
            convert_cell_value(&EnumCellValue::String("2.5".to_string()), false),
            EnumCellValue::String("2.5".to_string())
        );
        assert_eq!(
            convert_cell_value(&EnumCellValue::Number(f64::NAN), true),
            EnumCellValue::None
        );
        assert_eq!(
            convert_cell_value(&EnumCellValue::Number(f64::NEG_INFINITY), true),
            EnumCellValue::None
        );
        assert_eq!(
            convert_cell_value(&EnumCellValue::String("n/a".to_string()), true),
            EnumCellValue::String("n/a".to_string())
        );
    }
}
