//! `costkit_io_xlsx` v1:
//! Spreadsheet I/O kernel for the monthly costs pipeline.
//!
//! - `conf`   : Excel limits and default format presets
//! - `spec`   : specs/models/options
//! - `util`   : pure helper functions
//! - `reader` : one worksheet -> typed DataFrame (calamine)
//! - `writer` : DataFrame -> formatted worksheet (rust_xlsxwriter)
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_MIME_XLSX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_WIDTH_EXCEL_COLUMN_MAX, TUP_EXCEL_ILLEGAL, derive_default_format_presets,
};
pub use reader::{C_FMT_DATETIME, read_sheet, read_sheet_from_bytes};
pub use spec::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat, SpecSheetWritten,
    SpecXlsxFormatPresets, SpecXlsxReadOptions, SpecXlsxReport, SpecXlsxSheetWriteOptions,
    SpecXlsxTotalRow,
};
pub use util::{derive_column_letter, derive_sum_formula, render_number_text, sanitize_sheet_name};
pub use writer::{EnumColumnKind, XlsxWriter, derive_cell_value_from_any_value};
