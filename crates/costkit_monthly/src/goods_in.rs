//! Goods-in transformer.

use polars::prelude::{Column, DataFrame};
use tracing::info;

use crate::conf::N_RATE_CONTAINER;
use crate::error::{CostkitError, EnumStage, Result};
use crate::frame::{
    collect_f64_or_zero, collect_stock_codes, filter_rows, probe_column_name_folded,
    require_column, round2,
};
use crate::schema::goods_in;
use crate::sku::SpecValidSkus;
use crate::storage::SpecOwnerMap;

#[derive(Debug, Clone)]
pub struct SpecGoodsInOutput {
    /// Columns: Stock Code, Part Description, Qty, No of Containers, Cost,
    /// Responsible Owner. May have zero rows.
    pub df: DataFrame,
    /// Receipt lines before the SKU filter.
    pub n_rows_total: usize,
}

impl SpecGoodsInOutput {
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}

/// Filter goods-in receipts to valid SKUs, derive container cost and owner.
pub fn transform_goods_in(
    df_raw: &DataFrame,
    skus: &SpecValidSkus,
    owner_map: &SpecOwnerMap,
) -> Result<SpecGoodsInOutput> {
    let c_part_col = probe_column_name_folded(df_raw, goods_in::PART_NO_PROBE, true)
        .ok_or_else(|| CostkitError::missing_column(EnumStage::GoodsIn, goods_in::PART_NO_PROBE))?;
    let l_codes = collect_stock_codes(require_column(df_raw, &c_part_col, EnumStage::GoodsIn)?)?;
    for c_required in [
        goods_in::PART_DESCRIPTION,
        goods_in::QTY,
        goods_in::NO_OF_CONTAINERS_SRC,
    ] {
        require_column(df_raw, c_required, EnumStage::GoodsIn)?;
    }

    let l_mask: Vec<bool> = l_codes
        .iter()
        .map(|code| skus.contains_opt(code.as_deref()))
        .collect();
    let df_kept = filter_rows(df_raw, &l_mask)?;
    let l_codes_kept: Vec<Option<String>> = l_codes
        .into_iter()
        .zip(&l_mask)
        .filter_map(|(code, if_kept)| if_kept.then_some(code))
        .collect();

    let col_containers = require_column(&df_kept, goods_in::NO_OF_CONTAINERS_SRC, EnumStage::GoodsIn)?
        .clone()
        .with_name(goods_in::NO_OF_CONTAINERS.into());
    let l_cost: Vec<f64> = collect_f64_or_zero(&col_containers)?
        .into_iter()
        .map(|x| round2(x * N_RATE_CONTAINER))
        .collect();
    let l_owners: Vec<String> = l_codes_kept
        .iter()
        .map(|code| owner_map.resolve(code.as_deref()))
        .collect();

    let df = DataFrame::new(vec![
        Column::new(goods_in::STOCK_CODE.into(), l_codes_kept),
        require_column(&df_kept, goods_in::PART_DESCRIPTION, EnumStage::GoodsIn)?.clone(),
        require_column(&df_kept, goods_in::QTY, EnumStage::GoodsIn)?.clone(),
        col_containers,
        Column::new(goods_in::COST.into(), l_cost),
        Column::new(goods_in::RESPONSIBLE_OWNER.into(), l_owners),
    ])?;

    info!(
        n_rows_total = df_raw.height(),
        n_rows_valid = df.height(),
        "goods in transformed"
    );
    Ok(SpecGoodsInOutput {
        df,
        n_rows_total: df_raw.height(),
    })
}
