//! XLSX writer kernel that converts DataFrames into workbook sheets.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{AnyValue, Column, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Formula, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat, SpecSheetWritten, SpecXlsxFormatPresets,
    SpecXlsxReport, SpecXlsxSheetWriteOptions,
};
use crate::util::{
    convert_cell_value, count_decimal_places, derive_sum_formula, render_number_text,
    render_sum_text, sanitize_sheet_name, select_sorted_indices_from_names,
    validate_unique_columns,
};

/// How a column's cells are converted and which preset formats them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumColumnKind {
    Text,
    Integer,
    Decimal,
}

impl EnumColumnKind {
    fn from_column(col: &Column) -> Self {
        let dtype = col.dtype();
        if dtype.is_integer() {
            Self::Integer
        } else if dtype.is_numeric() {
            Self::Decimal
        } else {
            Self::Text
        }
    }

    fn is_numeric(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Workbook writer buffering sheets in memory until [`Self::save_to_buffer`].
pub struct XlsxWriter {
    workbook: Workbook,
    presets: SpecXlsxFormatPresets,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecXlsxReport,
}

impl XlsxWriter {
    pub fn new(presets: SpecXlsxFormatPresets) -> Self {
        Self {
            workbook: Workbook::new(),
            presets,
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecXlsxReport::default(),
        }
    }

    /// Sheets written and warnings raised so far.
    pub fn report(&self) -> &SpecXlsxReport {
        &self.report
    }

    /// Serialize the workbook to `.xlsx` bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, String> {
        self.workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error_text)
    }

    /// Write one sheet: bold header, typed body, optional total row, autofit.
    ///
    /// The sheet name is sanitized and made unique within the workbook; a
    /// changed name is reported as a warning. A total row over an empty
    /// frame is skipped with a warning.
    pub fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<SpecSheetWritten, String> {
        validate_policy_autofit(&options.policy_autofit)?;

        let l_colnames: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames)?;

        let n_width = l_colnames.len();
        let n_height = df_data.height();
        if n_height + 2 > N_NROWS_EXCEL_MAX {
            return Err(format!(
                "Sheet {sheet_name:?} has {n_height} rows; exceeds Excel row limit."
            ));
        }
        if n_width > N_NCOLS_EXCEL_MAX {
            return Err(format!(
                "Sheet {sheet_name:?} has {n_width} columns; exceeds Excel column limit."
            ));
        }

        let l_kinds: Vec<EnumColumnKind> = df_data
            .get_columns()
            .iter()
            .map(EnumColumnKind::from_column)
            .collect();

        let mut dict_fmt_overrides = BTreeMap::new();
        for (c_name, fmt_override) in &options.cols_fmt_overrides {
            let Some(n_idx) = l_colnames.iter().position(|c| c == c_name) else {
                return Err(format!("Format override column not found: {c_name:?}"));
            };
            dict_fmt_overrides.insert(n_idx, fmt_override.clone());
        }
        let l_cols_idx_total = match &options.total_row {
            Some(total_row) => select_sorted_indices_from_names(&l_colnames, Some(&total_row.cols_sum))?,
            None => vec![],
        };

        let l_fmt_specs = plan_column_formats(&l_kinds, &dict_fmt_overrides, &self.presets);
        let l_fmt_body: Vec<Format> = l_fmt_specs.iter().map(derive_rust_xlsx_format).collect();
        let fmt_header = derive_rust_xlsx_format(&self.presets.fmt_header);

        let sheet_name_unique = self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        if sheet_name_unique != sheet_name {
            self.report.warn(format!(
                "Sheet name {sheet_name:?} written as {sheet_name_unique:?}."
            ));
        }

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&sheet_name_unique)
            .map_err(derive_xlsx_error_text)?;

        let mut l_width_by_col: Vec<usize> = l_colnames
            .iter()
            .map(|c_name| estimate_unicode_string_width(c_name))
            .collect();
        for (n_idx_col, c_name) in l_colnames.iter().enumerate() {
            worksheet
                .write_string_with_format(0, cast_col_num(n_idx_col)?, c_name, &fmt_header)
                .map_err(derive_xlsx_error_text)?;
        }

        let mut l_sum_by_col = vec![0.0f64; n_width];
        let mut l_decimals_by_col = vec![0usize; n_width];
        for (n_idx_col, col) in df_data.get_columns().iter().enumerate() {
            let kind = l_kinds[n_idx_col];
            for n_row in 0..n_height {
                let value_raw = derive_cell_value_from_any_value(
                    col.get(n_row)
                        .map_err(|err| format!("Failed to access cell value: {err}"))?,
                );
                let value = convert_cell_value(&value_raw, kind.is_numeric());
                if let EnumCellValue::Number(n) = value {
                    l_sum_by_col[n_idx_col] += n;
                    l_decimals_by_col[n_idx_col] =
                        usize::max(l_decimals_by_col[n_idx_col], count_decimal_places(n));
                }
                l_width_by_col[n_idx_col] =
                    usize::max(l_width_by_col[n_idx_col], estimate_width_len(&value, kind));
                write_cell_with_format(worksheet, 1 + n_row, n_idx_col, &value, &l_fmt_body[n_idx_col])?;
            }
        }

        let mut row_total = None;
        if let Some(total_row) = &options.total_row {
            if n_height == 0 {
                self.report.warn(format!(
                    "Sheet {sheet_name_unique:?} has no data rows; total row skipped."
                ));
            } else {
                let n_row_total = n_height + 1;
                if n_width > 0 && !l_cols_idx_total.contains(&0) {
                    worksheet
                        .write_string_with_format(
                            cast_row_num(n_row_total)?,
                            0,
                            &total_row.label,
                            &derive_rust_xlsx_format(&self.presets.fmt_total),
                        )
                        .map_err(derive_xlsx_error_text)?;
                    l_width_by_col[0] =
                        usize::max(l_width_by_col[0], estimate_unicode_string_width(&total_row.label));
                }
                for &n_idx_col in &l_cols_idx_total {
                    let c_result =
                        render_sum_text(l_sum_by_col[n_idx_col], l_decimals_by_col[n_idx_col]);
                    let formula = Formula::new(derive_sum_formula(n_idx_col, 2, n_height + 1))
                        .set_result(&c_result);
                    let fmt_total =
                        derive_rust_xlsx_format(&l_fmt_specs[n_idx_col].merge(&self.presets.fmt_total));
                    worksheet
                        .write_formula_with_format(
                            cast_row_num(n_row_total)?,
                            cast_col_num(n_idx_col)?,
                            formula,
                            &fmt_total,
                        )
                        .map_err(derive_xlsx_error_text)?;
                    l_width_by_col[n_idx_col] = usize::max(l_width_by_col[n_idx_col], c_result.len());
                }
                row_total = Some(n_row_total);
            }
        }

        apply_column_widths(worksheet, &l_width_by_col, &options.policy_autofit)?;

        debug!(sheet = %sheet_name_unique, rows = n_height, cols = n_width, "sheet written");

        let sheet_written = SpecSheetWritten {
            sheet_name: sheet_name_unique,
            row_total,
        };
        self.report.sheets.push(sheet_written.clone());
        Ok(sheet_written)
    }

    /// Suffix repeats with `__2`, `__3`, ... within the 31-char limit.
    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let base_name: String = name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX - 3).collect();
        let mut n_idx = 2usize;
        while self.set_sheet_names_existing.contains(&candidate) {
            candidate = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            n_idx += 1;
        }
        self.set_sheet_names_existing.insert(candidate.clone());
        candidate
    }
}

/// Kind preset per column, with any override laid on top.
pub fn plan_column_formats(
    kinds: &[EnumColumnKind],
    cols_fmt_overrides: &BTreeMap<usize, SpecCellFormat>,
    presets: &SpecXlsxFormatPresets,
) -> Vec<SpecCellFormat> {
    kinds
        .iter()
        .enumerate()
        .map(|(n_idx_col, kind)| {
            let fmt_base = match kind {
                EnumColumnKind::Integer => &presets.fmt_integer,
                EnumColumnKind::Decimal => &presets.fmt_decimal,
                EnumColumnKind::Text => &presets.fmt_text,
            };
            match cols_fmt_overrides.get(&n_idx_col) {
                Some(fmt_override) => fmt_base.merge(fmt_override),
                None => fmt_base.clone(),
            }
        })
        .collect()
}

/// Displayed width in character units of one normalized cell value.
pub fn estimate_width_len(value: &EnumCellValue, kind: EnumColumnKind) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) if kind == EnumColumnKind::Integer => (*n as i64).to_string().len(),
        EnumCellValue::Number(n) => render_number_text(*n).len(),
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

fn apply_column_widths(
    worksheet: &mut Worksheet,
    widths: &[usize],
    policy_autofit: &SpecAutofitCellsPolicy,
) -> Result<(), String> {
    for (n_idx_col, n_width) in widths.iter().enumerate() {
        let n_width_final = (n_width + policy_autofit.width_cell_padding)
            .clamp(policy_autofit.width_cell_min, policy_autofit.width_cell_max);
        worksheet
            .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
            .map_err(derive_xlsx_error_text)?;
    }
    Ok(())
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), String> {
    if policy_autofit.width_cell_min == 0 {
        return Err("policy_autofit.width_cell_min must be >= 1.".to_string());
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        );
    }
    Ok(())
}

/// Map a polars scalar onto the writer's cell value model.
pub fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        other => EnumCellValue::String(other.to_string()),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    let (n_row, n_col) = (cast_row_num(row_idx)?, cast_col_num(col_idx)?);
    let result = match value {
        EnumCellValue::None => worksheet.write_blank(n_row, n_col, format),
        EnumCellValue::String(val) => worksheet.write_string_with_format(n_row, n_col, val, format),
        EnumCellValue::Number(val) => worksheet.write_number_with_format(n_row, n_col, *val, format),
    };
    result.map(|_| ()).map_err(derive_xlsx_error_text)
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.as_str());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if let Some(align) = spec.align.as_deref().and_then(derive_format_align) {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn plan_column_formats_applies_override_on_top_of_kind_preset() {
        let presets = SpecXlsxFormatPresets::default();
        let mut dict_overrides = BTreeMap::new();
        dict_overrides.insert(2, SpecCellFormat::from_num_format("#,##0.00"));

        let l_fmts = plan_column_formats(
            &[EnumColumnKind::Text, EnumColumnKind::Integer, EnumColumnKind::Decimal],
            &dict_overrides,
            &presets,
        );

        assert_eq!(l_fmts[0], presets.fmt_text);
        assert_eq!(l_fmts[1].num_format.as_deref(), Some("0"));
        assert_eq!(l_fmts[2].num_format.as_deref(), Some("#,##0.00"));
        assert_eq!(l_fmts[2].font_name.as_deref(), Some("Calibri"));
    }

    #[test]
    fn estimate_width_len_counts_rendered_text() {
        assert_eq!(estimate_width_len(&EnumCellValue::Number(3.18), EnumColumnKind::Decimal), 4);
        assert_eq!(estimate_width_len(&EnumCellValue::Number(12.0), EnumColumnKind::Integer), 2);
        assert_eq!(estimate_width_len(&EnumCellValue::None, EnumColumnKind::Text), 0);
        assert_eq!(estimate_unicode_string_width("£"), 2);
    }

    #[test]
    fn unique_sheet_names_are_suffixed() {
        let mut writer = XlsxWriter::new(SpecXlsxFormatPresets::default());
        assert_eq!(writer.derive_unique_sheet_name("Orders"), "Orders");
        assert_eq!(writer.derive_unique_sheet_name("Orders"), "Orders__2");
        assert_eq!(writer.derive_unique_sheet_name("Orders"), "Orders__3");
    }
}
