//! Worksheet reader that turns one sheet into a typed DataFrame.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, DataType, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use polars::prelude::{Column, DataFrame};

use crate::spec::SpecXlsxReadOptions;
use crate::util::{derive_unique_labels, render_number_text};

/// Timestamp layout used for spreadsheet date cells.
pub const C_FMT_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumSourceKind {
    Integer,
    Float,
    Boolean,
    Text,
}

/// Read the first worksheet of a workbook file on disk.
pub fn read_sheet(path: impl AsRef<Path>, options: &SpecXlsxReadOptions) -> Result<DataFrame, String> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| format!("Failed to open workbook {}: {err}", path.display()))?;
    let range = derive_first_sheet_range(&mut workbook)?;
    derive_dataframe_from_range(&range, options)
}

/// Read the first worksheet from in-memory workbook bytes (xlsx, xls, xlsb, ods).
pub fn read_sheet_from_bytes(bytes: &[u8], options: &SpecXlsxReadOptions) -> Result<DataFrame, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| format!("Failed to open workbook bytes: {err}"))?;
    let range = derive_first_sheet_range(&mut workbook)?;
    derive_dataframe_from_range(&range, options)
}

fn derive_first_sheet_range<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Range<Data>, String> {
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "Workbook contains no sheets.".to_string())?
        .map_err(|err| format!("Failed to read first sheet: {err}"))
}

/// Convert a used cell range into a DataFrame.
///
/// `options.row_header` is an absolute sheet row; a used range that starts
/// below row 0 is re-aligned first. Fully blank data rows are skipped.
pub fn derive_dataframe_from_range(
    range: &Range<Data>,
    options: &SpecXlsxReadOptions,
) -> Result<DataFrame, String> {
    if range.is_empty() {
        return Ok(DataFrame::empty());
    }

    let (n_row_start, n_col_start) = range.start().unwrap_or((0, 0));
    let l_rows: Vec<&[Data]> = range.rows().collect();
    let n_width = match options.cols_limit {
        Some(n_limit) => usize::min(n_limit, range.width()),
        None => range.width(),
    };

    let (l_header_cells, n_row_data_first) =
        match options.row_header.checked_sub(n_row_start as usize) {
            Some(n_row_local) if n_row_local < l_rows.len() => {
                (Some(l_rows[n_row_local]), n_row_local + 1)
            }
            Some(_) => return Ok(DataFrame::empty()),
            None => (None, 0),
        };

    let l_labels = derive_unique_labels(
        (0..n_width)
            .map(|n_idx_col| {
                let c_label = l_header_cells
                    .and_then(|row| row.get(n_idx_col))
                    .and_then(derive_cell_text)
                    .unwrap_or_default();
                if c_label.is_empty() {
                    format!("Unnamed: {}", n_col_start as usize + n_idx_col)
                } else {
                    c_label
                }
            })
            .collect(),
    );

    let l_rows_data: Vec<&[Data]> = l_rows[n_row_data_first..]
        .iter()
        .copied()
        .filter(|row| row.iter().take(n_width).any(|cell| !is_blank(cell)))
        .collect();

    let l_columns = l_labels
        .iter()
        .enumerate()
        .map(|(n_idx_col, c_label)| {
            let l_cells: Vec<&Data> = l_rows_data
                .iter()
                .map(|row| row.get(n_idx_col).unwrap_or(&Data::Empty))
                .collect();
            derive_column(c_label, &l_cells)
        })
        .collect::<Vec<_>>();

    DataFrame::new(l_columns).map_err(|err| format!("Failed to build DataFrame: {err}"))
}

fn derive_column(name: &str, cells: &[&Data]) -> Column {
    match derive_column_kind(cells) {
        EnumSourceKind::Integer => {
            let l_values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| derive_cell_number(cell).map(|n| n as i64))
                .collect();
            Column::new(name.into(), l_values)
        }
        EnumSourceKind::Float => {
            let l_values: Vec<Option<f64>> = cells.iter().map(|cell| derive_cell_number(cell)).collect();
            Column::new(name.into(), l_values)
        }
        EnumSourceKind::Boolean => {
            let l_values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(val) => Some(*val),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), l_values)
        }
        EnumSourceKind::Text => {
            let l_values: Vec<Option<String>> = cells.iter().map(|cell| derive_cell_text(cell)).collect();
            Column::new(name.into(), l_values)
        }
    }
}

fn derive_column_kind(cells: &[&Data]) -> EnumSourceKind {
    let mut if_any_number = false;
    let mut if_any_fraction = false;
    let mut if_any_bool = false;

    for cell in cells {
        match cell {
            Data::Empty | Data::Error(_) => {}
            Data::Int(_) => if_any_number = true,
            Data::Float(val) => {
                if_any_number = true;
                if val.fract() != 0.0 || !val.is_finite() || val.abs() >= 9.0e15 {
                    if_any_fraction = true;
                }
            }
            Data::Bool(_) => if_any_bool = true,
            _ => return EnumSourceKind::Text,
        }
    }

    match (if_any_number, if_any_bool) {
        (true, true) | (false, false) => EnumSourceKind::Text,
        (false, true) => EnumSourceKind::Boolean,
        (true, false) if if_any_fraction => EnumSourceKind::Float,
        (true, false) => EnumSourceKind::Integer,
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(val) => val.trim().is_empty(),
        _ => false,
    }
}

fn derive_cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(val) => Some(*val as f64),
        Data::Float(val) => Some(*val),
        _ => None,
    }
}

/// Render one cell as display text; blank and error cells yield `None`.
pub fn derive_cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(val) => Some(val.clone()),
        Data::Int(val) => Some(val.to_string()),
        Data::Float(val) => Some(render_number_text(*val)),
        Data::Bool(val) => Some(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format(C_FMT_DATETIME).to_string())
            .or_else(|| Some(cell.to_string())),
        Data::DateTimeIso(val) | Data::DurationIso(val) => Some(val.clone()),
    }
}
