//! Shared XLSX specification models.

use std::collections::BTreeMap;

use crate::conf::N_WIDTH_EXCEL_COLUMN_MAX;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification, overlaid field by field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    pub font_name: Option<String>,
    /// Points.
    pub font_size: Option<i64>,
    pub bold: Option<bool>,
    /// `left`, `center`, `right` or `general`.
    pub align: Option<String>,
    /// Border style for all sides; `0` none, `1` thin, `2` medium.
    pub border: Option<i64>,
    /// Top border only; wins over `border` on that side.
    pub top: Option<i64>,
    /// Excel number format code.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Overlay `other` onto `self`; set fields of `other` win.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            border: other.border.or(self.border),
            top: other.top.or(self.top),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
        }
    }

    /// Format carrying only a number format code.
    pub fn from_num_format(num_format: &str) -> SpecCellFormat {
        SpecCellFormat {
            num_format: Some(num_format.to_string()),
            ..Default::default()
        }
    }
}

/// Named cell format presets applied per column kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxFormatPresets {
    pub fmt_text: SpecCellFormat,
    pub fmt_integer: SpecCellFormat,
    /// Non-integer numeric columns.
    pub fmt_decimal: SpecCellFormat,
    pub fmt_header: SpecCellFormat,
    /// Total row label and formula cells.
    pub fmt_total: SpecCellFormat,
}

impl Default for SpecXlsxFormatPresets {
    fn default() -> Self {
        crate::conf::derive_default_format_presets()
    }
}

/// Normalized cell value during the write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Written as a blank cell.
    None,
    String(String),
    Number(f64),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReadOptions

/// Options for reading the first worksheet of a workbook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReadOptions {
    /// Zero-based sheet row holding column labels. Rows above it are ignored.
    pub row_header: usize,
    /// Keep only the first `n` columns when set.
    pub cols_limit: Option<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Column width inference over header, body and total cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    pub width_cell_min: usize,
    pub width_cell_max: usize,
    /// Added to the widest rendered value.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: 1,
            width_cell_max: N_WIDTH_EXCEL_COLUMN_MAX,
            width_cell_padding: 2,
        }
    }
}

/// Synthetic total row appended below the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxTotalRow {
    /// Text written into the first column.
    pub label: String,
    /// Columns receiving a `=SUM(..)` formula over their data range.
    pub cols_sum: Vec<String>,
}

impl SpecXlsxTotalRow {
    /// Total row labelled `Total` over `cols_sum`.
    pub fn new<I, S>(cols_sum: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: "Total".to_string(),
            cols_sum: cols_sum.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-sheet call options.
#[derive(Debug, Clone, Default)]
pub struct SpecXlsxSheetWriteOptions {
    /// Per-column format overrides by column name, laid over the kind preset.
    pub cols_fmt_overrides: BTreeMap<String, SpecCellFormat>,
    pub total_row: Option<SpecXlsxTotalRow>,
    pub policy_autofit: SpecAutofitCellsPolicy,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// One sheet emitted to the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetWritten {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Zero-based row index of the total row, when written.
    pub row_total: Option<usize>,
}

/// Everything a writer has emitted so far.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    pub sheets: Vec<SpecSheetWritten>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_left_values_unless_right_overrides() {
        let fmt_base = SpecCellFormat {
            font_name: Some("Calibri".to_string()),
            bold: Some(false),
            ..Default::default()
        };
        let fmt_merged = fmt_base.merge(&SpecCellFormat {
            bold: Some(true),
            num_format: Some("0.00".to_string()),
            ..Default::default()
        });

        assert_eq!(fmt_merged.font_name.as_deref(), Some("Calibri"));
        assert_eq!(fmt_merged.bold, Some(true));
        assert_eq!(fmt_merged.num_format.as_deref(), Some("0.00"));
    }

    #[test]
    fn total_row_defaults_label() {
        let total = SpecXlsxTotalRow::new(["Cost"]);
        assert_eq!(total.label, "Total");
        assert_eq!(total.cols_sum, vec!["Cost".to_string()]);
    }
}
