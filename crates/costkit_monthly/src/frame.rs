//! Small DataFrame helpers shared by the stage transformers.

use polars::prelude::{AnyValue, BooleanChunked, Column, DataFrame, NewChunkedArray};

use costkit_io_xlsx::render_number_text;

use crate::error::{CostkitError, EnumStage, Result};

////////////////////////////////////////////////////////////////////////////////
// #region SchemaProbe

/// Exact-name column lookup.
pub fn probe_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Column> {
    df.get_column_index(name).map(|n_idx| &df.get_columns()[n_idx])
}

/// Column lookup comparing labels lowercased, optionally with spaces removed.
///
/// Returns the label as it appears in the frame.
pub fn probe_column_name_folded(df: &DataFrame, probe: &str, if_strip_spaces: bool) -> Option<String> {
    let fold = |label: &str| {
        let c_lower = label.to_lowercase();
        if if_strip_spaces {
            c_lower.replace(' ', "")
        } else {
            c_lower
        }
    };
    let c_probe = fold(probe);
    df.get_column_names_str()
        .into_iter()
        .find(|label| fold(label) == c_probe)
        .map(ToString::to_string)
}

/// Exact-name column lookup that fails with a stage-scoped `MissingColumn`.
pub fn require_column<'a>(df: &'a DataFrame, name: &str, stage: EnumStage) -> Result<&'a Column> {
    probe_column(df, name).ok_or_else(|| CostkitError::missing_column(stage, name))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ValueCoercion

/// Cell text the way a spreadsheet user reads it. Nulls stay `None`.
pub fn derive_text(value: &AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some((*s).to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        AnyValue::Boolean(b) => Some(b.to_string()),
        AnyValue::Float64(x) => Some(render_number_text(*x)),
        AnyValue::Float32(x) => Some(render_number_text(f64::from(*x))),
        AnyValue::Int64(v) => Some(v.to_string()),
        AnyValue::Int32(v) => Some(v.to_string()),
        AnyValue::UInt64(v) => Some(v.to_string()),
        AnyValue::UInt32(v) => Some(v.to_string()),
        other => Some(other.to_string()),
    }
}

/// Numeric view of a cell; numeric-looking text is parsed.
pub fn derive_f64(value: &AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => s.trim().parse::<f64>().ok(),
        AnyValue::StringOwned(s) => s.trim().parse::<f64>().ok(),
        AnyValue::Boolean(_) => None,
        other => other.extract::<f64>(),
    }
}

/// Column values as optional text, in row order.
pub fn collect_text(col: &Column) -> Result<Vec<Option<String>>> {
    (0..col.len())
        .map(|n_row| Ok(derive_text(&col.get(n_row)?)))
        .collect()
}

/// Column values as f64, in row order. Non-numeric and missing values become 0.
pub fn collect_f64_or_zero(col: &Column) -> Result<Vec<f64>> {
    let mut l_values = Vec::with_capacity(col.len());
    let mut n_coerced = 0usize;
    for n_row in 0..col.len() {
        match derive_f64(&col.get(n_row)?) {
            Some(x) if x.is_finite() => l_values.push(x),
            _ => {
                n_coerced += 1;
                l_values.push(0.0);
            }
        }
    }
    if n_coerced > 0 {
        tracing::debug!(column = %col.name(), n_coerced, "coerced non-numeric values to 0");
    }
    Ok(l_values)
}

/// Stock codes of a column, normalized. Missing codes stay `None`.
pub fn collect_stock_codes(col: &Column) -> Result<Vec<Option<String>>> {
    Ok(collect_text(col)?
        .into_iter()
        .map(|value| value.map(|code| crate::sku::normalize_stock_code(&code)))
        .collect())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FrameOps

/// Keep rows whose mask entry is `true`, in source order.
pub fn filter_rows(df: &DataFrame, l_mask: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), l_mask);
    Ok(df.filter(&mask)?)
}

/// Replace a column in place, or append it when absent.
pub fn upsert_column(df: &mut DataFrame, col: Column) -> Result<()> {
    df.with_column(col)?;
    Ok(())
}

/// Trim every column label.
pub fn trim_column_names(df: &mut DataFrame) -> Result<()> {
    let l_names: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(|label| label.trim().to_string())
        .collect();
    df.set_column_names(l_names)?;
    Ok(())
}

/// Round to 2 decimals, half away from zero.
///
/// `0.125` becomes `0.13` and `-0.125` becomes `-0.13`.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Column sum treating missing values as 0.
pub fn sum_column(col: &Column) -> Result<f64> {
    Ok(collect_f64_or_zero(col)?.into_iter().sum())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(4.77), 4.77);
        assert_eq!(round2(2.0 * 0.97), 1.94);
        assert_eq!(round2(3.0 * 0.39), 1.17);
    }

    #[test]
    fn probe_column_name_folded_ignores_case_and_spaces() {
        let df = DataFrame::new(vec![
            Column::new("Part No".into(), vec!["a"]),
            Column::new("FULL description".into(), vec!["d"]),
        ])
        .unwrap();
        assert_eq!(probe_column_name_folded(&df, "partno", true).as_deref(), Some("Part No"));
        assert_eq!(
            probe_column_name_folded(&df, "Full Description", false).as_deref(),
            Some("FULL description")
        );
        assert_eq!(probe_column_name_folded(&df, "partno", false), None);
    }

    #[test]
    fn collect_f64_or_zero_coerces_text_and_nulls() {
        let col = Column::new("Total Locations".into(), vec![Some("3"), Some("n/a"), None, Some(" 1.5 ")]);
        assert_eq!(collect_f64_or_zero(&col).unwrap(), vec![3.0, 0.0, 0.0, 1.5]);
    }

    #[test]
    fn derive_text_renders_integral_floats_without_fraction() {
        assert_eq!(derive_text(&AnyValue::Float64(1001.0)).as_deref(), Some("1001"));
        assert_eq!(derive_text(&AnyValue::Int64(7)).as_deref(), Some("7"));
        assert_eq!(derive_text(&AnyValue::Null), None);
    }

    #[test]
    fn require_column_reports_stage_and_name() {
        let df = DataFrame::new(vec![Column::new("Qty".into(), vec![1i64])]).unwrap();
        let err = require_column(&df, "Stock Code", EnumStage::Orders).unwrap_err();
        assert!(matches!(
            err,
            CostkitError::MissingColumn { stage: EnumStage::Orders, ref column } if column == "Stock Code"
        ));
    }
}
