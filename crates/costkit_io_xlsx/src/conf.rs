//! XLSX limits and the default format presets.

use crate::spec::{SpecCellFormat, SpecXlsxFormatPresets};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel column width cap, in character units.
pub const N_WIDTH_EXCEL_COLUMN_MAX: usize = 255;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// MIME type of an `.xlsx` workbook.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Calibri 11 body cells, bold centered header, bold top-ruled total row.
pub fn derive_default_format_presets() -> SpecXlsxFormatPresets {
    let fmt_base = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        ..Default::default()
    };

    SpecXlsxFormatPresets {
        fmt_text: fmt_base.clone(),
        fmt_integer: fmt_base.merge(&SpecCellFormat::from_num_format("0")),
        fmt_decimal: fmt_base.merge(&SpecCellFormat::from_num_format("General")),
        fmt_header: fmt_base.merge(&SpecCellFormat {
            bold: Some(true),
            border: Some(1),
            align: Some("center".to_string()),
            ..Default::default()
        }),
        fmt_total: fmt_base.merge(&SpecCellFormat {
            bold: Some(true),
            top: Some(1),
            ..Default::default()
        }),
    }
}
