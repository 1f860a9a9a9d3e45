//! Input workbook readers, one per source export.

use std::path::Path;

use polars::prelude::DataFrame;
use tracing::debug;

use costkit_io_xlsx::{SpecXlsxReadOptions, read_sheet};

use crate::conf::{
    N_ROW_HEADER_GOODS_IN, N_ROW_HEADER_ORDERS, N_ROW_HEADER_PALLETS, N_ROW_HEADER_SKU_LIST,
    N_ROW_HEADER_STOCK,
};
use crate::error::{CostkitError, EnumStage, Result};

/// Read the first sheet of `path` with a zero-based header row.
pub fn read_input(
    path: &Path,
    row_header: usize,
    cols_limit: Option<usize>,
    stage: EnumStage,
) -> Result<DataFrame> {
    let options = SpecXlsxReadOptions {
        row_header,
        cols_limit,
        ..Default::default()
    };
    let df = read_sheet(path, &options).map_err(|message| CostkitError::Xlsx { stage, message })?;
    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "input read");
    Ok(df)
}

/// SKU allow-list: header on the first row, first column only.
pub fn read_sku_list(path: &Path) -> Result<DataFrame> {
    read_input(path, N_ROW_HEADER_SKU_LIST, Some(1), EnumStage::SkuFilter)
}

/// Stock report used as the SKU source.
pub fn read_sku_stock_report(path: &Path) -> Result<DataFrame> {
    read_input(path, N_ROW_HEADER_STOCK, None, EnumStage::SkuFilter)
}

pub fn read_orders(path: &Path) -> Result<DataFrame> {
    read_input(path, N_ROW_HEADER_ORDERS, None, EnumStage::Orders)
}

pub fn read_stock_report(path: &Path) -> Result<DataFrame> {
    read_input(path, N_ROW_HEADER_STOCK, None, EnumStage::Storage)
}

pub fn read_pallet_report(path: &Path) -> Result<DataFrame> {
    read_input(path, N_ROW_HEADER_PALLETS, None, EnumStage::Storage)
}

pub fn read_goods_in(path: &Path) -> Result<DataFrame> {
    read_input(path, N_ROW_HEADER_GOODS_IN, None, EnumStage::GoodsIn)
}
