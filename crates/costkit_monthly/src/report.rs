//! Report assembler: owner partitions, formatted sheets, totals and summary.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{Column, DataFrame};
use tracing::{debug, info};

use costkit_io_xlsx::{
    C_MIME_XLSX, SpecXlsxFormatPresets, SpecXlsxSheetWriteOptions, SpecXlsxTotalRow, XlsxWriter,
};

use crate::conf::{
    C_FILE_COMBINED, C_OWNER_UNKNOWN, C_TAB_GOODS_IN, C_TAB_ORDERS, C_TAB_STORAGE, C_TAB_SUMMARY,
    derive_currency_format,
};
use crate::error::{CostkitError, EnumStage, Result};
use crate::frame::{collect_text, filter_rows, require_column, round2, sum_column};
use crate::schema::{goods_in, orders, stock, summary};
use crate::spec::{EnumOwnerUniverse, EnumWorkbookLayout, SpecReportOptions};

/// One finished workbook.
#[derive(Debug, Clone)]
pub struct SpecReportWorkbook {
    pub file_name: String,
    /// Owners whose partitions this workbook holds, sorted.
    pub owners: Vec<String>,
    /// Sheet names in workbook order.
    pub sheets: Vec<String>,
    /// Serialized `.xlsx` content.
    pub bytes: Vec<u8>,
}

impl SpecReportWorkbook {
    pub fn mime(&self) -> &'static str {
        C_MIME_XLSX
    }
}

/// Assembled workbooks plus operator-facing notices.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembled {
    pub workbooks: Vec<SpecReportWorkbook>,
    /// Informational messages, e.g. an omitted Goods In tab.
    pub notices: Vec<String>,
    /// Writer warnings such as renamed sheets.
    pub warnings: Vec<String>,
}

impl ReportAssembled {
    /// Persist every workbook into `dir`, creating it when needed.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut l_paths = Vec::with_capacity(self.workbooks.len());
        for workbook in &self.workbooks {
            let path = dir.join(&workbook.file_name);
            fs::write(&path, &workbook.bytes)?;
            info!(path = %path.display(), mime = workbook.mime(), "report written");
            l_paths.push(path);
        }
        Ok(l_paths)
    }
}

/// Tables a report is built from.
#[derive(Debug, Clone, Copy)]
pub struct SpecReportTables<'a> {
    /// Attributed order lines.
    pub orders: &'a DataFrame,
    pub storage: &'a DataFrame,
    /// `None` when no goods-in export was processed.
    pub goods_in: Option<&'a DataFrame>,
}

/// One summary line: a tab and its aggregate cost.
#[derive(Debug, Clone, PartialEq)]
struct SpecSummaryLine {
    tab: &'static str,
    n_cost: f64,
}

struct SpecTabPlan {
    tab: &'static str,
    l_monetary: &'static [&'static str],
}

const L_TABS: [SpecTabPlan; 3] = [
    SpecTabPlan {
        tab: C_TAB_ORDERS,
        l_monetary: &orders::MONETARY,
    },
    SpecTabPlan {
        tab: C_TAB_STORAGE,
        l_monetary: &stock::MONETARY,
    },
    SpecTabPlan {
        tab: C_TAB_GOODS_IN,
        l_monetary: &goods_in::MONETARY,
    },
];

////////////////////////////////////////////////////////////////////////////////
// #region OwnerUniverse

fn collect_owners(df: &DataFrame) -> Result<Vec<String>> {
    let col = require_column(df, stock::RESPONSIBLE_OWNER, EnumStage::Report)?;
    Ok(collect_text(col)?
        .into_iter()
        .map(|owner| owner.unwrap_or_else(|| C_OWNER_UNKNOWN.to_string()))
        .collect())
}

/// Sorted report partitions under `policy`.
pub fn derive_owner_universe(
    tables: &SpecReportTables<'_>,
    policy: EnumOwnerUniverse,
) -> Result<Vec<String>> {
    let mut set_owners: BTreeSet<String> = collect_owners(tables.storage)?.into_iter().collect();

    let mut l_owners_other = collect_owners(tables.orders)?;
    if let Some(df_goods_in) = tables.goods_in {
        l_owners_other.extend(collect_owners(df_goods_in)?);
    }

    match policy {
        EnumOwnerUniverse::Storage => {}
        EnumOwnerUniverse::StorageAndUnknown => {
            if l_owners_other.iter().any(|owner| owner == C_OWNER_UNKNOWN) {
                set_owners.insert(C_OWNER_UNKNOWN.to_string());
            }
        }
        EnumOwnerUniverse::All => set_owners.extend(l_owners_other),
    }
    Ok(set_owners.into_iter().collect())
}

/// Rows of `df` belonging to `owner`, in source order.
pub fn partition_by_owner(df: &DataFrame, owner: &str) -> Result<DataFrame> {
    let l_mask: Vec<bool> = collect_owners(df)?
        .iter()
        .map(|value| value == owner)
        .collect();
    filter_rows(df, &l_mask)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetWriting

fn derive_sheet_options(df: &DataFrame, l_monetary: &[&str]) -> SpecXlsxSheetWriteOptions {
    let l_present: Vec<&str> = l_monetary
        .iter()
        .copied()
        .filter(|c_name| df.get_column_index(c_name).is_some())
        .collect();
    SpecXlsxSheetWriteOptions {
        cols_fmt_overrides: l_present
            .iter()
            .map(|c_name| (c_name.to_string(), derive_currency_format()))
            .collect(),
        total_row: (!l_present.is_empty()).then(|| SpecXlsxTotalRow::new(l_present.iter().copied())),
        ..Default::default()
    }
}

fn derive_sheet_name(tab: &str, owner: &str, layout: EnumWorkbookLayout) -> String {
    match layout {
        EnumWorkbookLayout::Combined => format!("{tab} - {owner}"),
        EnumWorkbookLayout::PerOwner => tab.to_string(),
    }
}

fn write_sheet(
    writer: &mut XlsxWriter,
    df: &DataFrame,
    sheet_name: &str,
    l_monetary: &[&str],
) -> Result<String> {
    let sheet = writer
        .write_sheet(df, sheet_name, &derive_sheet_options(df, l_monetary))
        .map_err(|message| CostkitError::Xlsx {
            stage: EnumStage::Report,
            message,
        })?;
    Ok(sheet.sheet_name)
}

/// Write one owner's sheets; returns the names written.
fn write_partition(
    writer: &mut XlsxWriter,
    tables: &SpecReportTables<'_>,
    owner: &str,
    options: &SpecReportOptions,
) -> Result<Vec<String>> {
    let l_frames = [Some(tables.orders), Some(tables.storage), tables.goods_in];
    let mut l_sheets = Vec::new();
    let mut l_summary = Vec::new();

    for (plan, df_source) in L_TABS.iter().zip(l_frames) {
        let Some(df_source) = df_source else {
            continue;
        };
        let df_owner = partition_by_owner(df_source, owner)?;
        if df_owner.height() == 0 {
            debug!(owner, tab = plan.tab, "no rows; tab omitted");
            continue;
        }
        let sheet_name = derive_sheet_name(plan.tab, owner, options.layout);
        l_sheets.push(write_sheet(writer, &df_owner, &sheet_name, plan.l_monetary)?);

        let mut n_cost = 0.0;
        for c_name in plan.l_monetary {
            if let Some(n_idx) = df_owner.get_column_index(c_name) {
                n_cost += sum_column(&df_owner.get_columns()[n_idx])?;
            }
        }
        l_summary.push(SpecSummaryLine {
            tab: plan.tab,
            n_cost: round2(n_cost),
        });
    }

    if options.if_include_summary && !l_summary.is_empty() {
        let df_summary = derive_summary_frame(&l_summary, options.period.as_deref())?;
        let sheet_name = derive_sheet_name(C_TAB_SUMMARY, owner, options.layout);
        l_sheets.push(write_sheet(writer, &df_summary, &sheet_name, &summary::MONETARY)?);
    }
    Ok(l_sheets)
}

fn derive_summary_frame(l_summary: &[SpecSummaryLine], period: Option<&str>) -> Result<DataFrame> {
    let l_periods: Vec<Option<&str>> = vec![period; l_summary.len()];
    let l_tabs: Vec<&str> = l_summary.iter().map(|line| line.tab).collect();
    let l_costs: Vec<f64> = l_summary.iter().map(|line| line.n_cost).collect();
    Ok(DataFrame::new(vec![
        Column::new(summary::PERIOD.into(), l_periods),
        Column::new(summary::TAB.into(), l_tabs),
        Column::new(summary::TOTAL_COST.into(), l_costs),
    ])?)
}

fn derive_new_writer() -> XlsxWriter {
    XlsxWriter::new(SpecXlsxFormatPresets::default())
}

fn finish_workbook(
    mut writer: XlsxWriter,
    file_name: String,
    owners: Vec<String>,
    sheets: Vec<String>,
    report: &mut ReportAssembled,
) -> Result<()> {
    let bytes = writer.save_to_buffer().map_err(|message| CostkitError::Xlsx {
        stage: EnumStage::Report,
        message,
    })?;
    report.warnings.extend(writer.report().warnings.iter().cloned());
    report.workbooks.push(SpecReportWorkbook {
        file_name,
        owners,
        sheets,
        bytes,
    });
    Ok(())
}

/// File name of a per-owner workbook.
pub fn derive_owner_file_name(owner: &str, period: Option<&str>) -> String {
    let c_owner: String = owner
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    match period {
        Some(period) => format!("{c_owner} - {period} Monthly Costs.xlsx"),
        None => format!("{c_owner} Monthly Costs.xlsx"),
    }
}

/// Suffix a taken file name with ` (2)`, ` (3)`, ... before `.xlsx`.
///
/// Names are compared case-insensitively so the result is safe on
/// case-insensitive filesystems.
fn derive_unique_file_name(set_taken: &mut BTreeSet<String>, file_name: &str) -> String {
    let c_stem = file_name.strip_suffix(".xlsx").unwrap_or(file_name);
    let mut candidate = file_name.to_string();
    let mut n_idx = 2usize;
    while set_taken.contains(&candidate.to_lowercase()) {
        candidate = format!("{c_stem} ({n_idx}).xlsx");
        n_idx += 1;
    }
    set_taken.insert(candidate.to_lowercase());
    candidate
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Assemble

/// Build the report workbooks for every owner partition.
///
/// Tabs without rows are left out. A missing or empty goods-in table adds a
/// notice instead of a sheet.
pub fn assemble_report(
    tables: &SpecReportTables<'_>,
    options: &SpecReportOptions,
) -> Result<ReportAssembled> {
    require_column(tables.orders, stock::RESPONSIBLE_OWNER, EnumStage::Report)?;
    let l_owners = derive_owner_universe(tables, options.owner_universe)?;
    let n_owners = l_owners.len();
    let mut report = ReportAssembled::default();

    match tables.goods_in {
        None => report
            .notices
            .push("No Goods In file was processed, so the Goods In tab was left out.".to_string()),
        Some(df) if df.height() == 0 => report.notices.push(
            "No matching SKUs found in the Goods In file, so the Goods In tab was left out."
                .to_string(),
        ),
        Some(_) => {}
    }
    if l_owners.is_empty() {
        report
            .notices
            .push("No owners found for the report; no workbook was produced.".to_string());
        return Ok(report);
    }

    match options.layout {
        EnumWorkbookLayout::Combined => {
            let mut writer = derive_new_writer();
            let mut l_sheets = Vec::new();
            for owner in &l_owners {
                l_sheets.extend(write_partition(&mut writer, tables, owner, options)?);
            }
            if l_sheets.is_empty() {
                report
                    .notices
                    .push("No rows matched any owner; no workbook was produced.".to_string());
            } else {
                finish_workbook(writer, C_FILE_COMBINED.to_string(), l_owners, l_sheets, &mut report)?;
            }
        }
        EnumWorkbookLayout::PerOwner => {
            let mut set_file_names = BTreeSet::new();
            for owner in &l_owners {
                let file_name_base = derive_owner_file_name(owner, options.period.as_deref());
                let file_name = derive_unique_file_name(&mut set_file_names, &file_name_base);
                if file_name != file_name_base {
                    report.warnings.push(format!(
                        "Workbook for owner {owner:?} written as {file_name:?}; {file_name_base:?} was already taken."
                    ));
                }
                let mut writer = derive_new_writer();
                let l_sheets = write_partition(&mut writer, tables, owner, options)?;
                if l_sheets.is_empty() {
                    report
                        .notices
                        .push(format!("No rows for owner {owner:?}; workbook skipped."));
                    continue;
                }
                finish_workbook(writer, file_name, vec![owner.clone()], l_sheets, &mut report)?;
            }
        }
    }

    for c_notice in &report.notices {
        info!(notice = %c_notice, "report notice");
    }
    info!(
        n_workbooks = report.workbooks.len(),
        n_owners,
        "report assembled"
    );
    Ok(report)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
