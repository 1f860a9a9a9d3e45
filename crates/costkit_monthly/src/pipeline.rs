//! Immutable pipeline context threaded through the stages of one run.
//!
//! Every stage method borrows the current context and returns a new one, so
//! a failed stage leaves the accepted upstream state untouched and reusable.

use std::sync::Arc;

use polars::prelude::DataFrame;
use tracing::debug;

use crate::attribution::apply_owner_attribution;
use crate::error::{CostkitError, EnumStage, Result};
use crate::goods_in::{SpecGoodsInOutput, transform_goods_in};
use crate::orders::{SpecOrdersOutput, transform_orders};
use crate::report::{ReportAssembled, SpecReportTables, assemble_report};
use crate::sku::{SpecValidSkus, derive_valid_skus_from_event, derive_valid_skus_from_list};
use crate::spec::SpecReportOptions;
use crate::storage::{SpecStorageOutput, compute_storage};

/// Counters shown to the operator after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportRun {
    pub n_skus: usize,
    pub n_orders_total: usize,
    pub n_orders_valid: usize,
    pub n_orders_removed: usize,
    pub n_storage_rows: usize,
    /// `None` until goods in has been processed.
    pub n_goods_in_rows: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct SpecPipelineContext {
    skus: Option<Arc<SpecValidSkus>>,
    orders: Option<SpecOrdersOutput>,
    storage: Option<SpecStorageOutput>,
    goods_in: Option<SpecGoodsInOutput>,
}

impl SpecPipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skus(&self) -> Option<&SpecValidSkus> {
        self.skus.as_deref()
    }

    pub fn orders(&self) -> Option<&SpecOrdersOutput> {
        self.orders.as_ref()
    }

    pub fn storage(&self) -> Option<&SpecStorageOutput> {
        self.storage.as_ref()
    }

    pub fn goods_in(&self) -> Option<&SpecGoodsInOutput> {
        self.goods_in.as_ref()
    }

    fn require_skus(&self, stage: EnumStage) -> Result<&SpecValidSkus> {
        self.skus().ok_or(CostkitError::StageNotReady {
            stage,
            requires: EnumStage::SkuFilter,
        })
    }

    fn require_storage(&self, stage: EnumStage) -> Result<&SpecStorageOutput> {
        self.storage().ok_or(CostkitError::StageNotReady {
            stage,
            requires: EnumStage::Storage,
        })
    }

    // #region Stages

    /// Start over from a valid-SKU set; every downstream output is dropped.
    pub fn with_skus(&self, skus: SpecValidSkus) -> Self {
        debug!(n_skus = skus.len(), "valid SKU set replaced");
        Self {
            skus: Some(Arc::new(skus)),
            ..Self::default()
        }
    }

    pub fn run_sku_list(&self, df_list: &DataFrame) -> Result<Self> {
        Ok(self.with_skus(derive_valid_skus_from_list(df_list)?))
    }

    pub fn run_sku_event(&self, df_stock: &DataFrame, event: &str) -> Result<Self> {
        Ok(self.with_skus(derive_valid_skus_from_event(df_stock, event)?))
    }

    /// Transform order lines; attributed right away when storage is known.
    pub fn run_orders(&self, df_raw: &DataFrame) -> Result<Self> {
        let skus = self.require_skus(EnumStage::Orders)?;
        let mut orders = transform_orders(df_raw, skus)?;
        if let Some(storage) = self.storage() {
            orders.df = apply_owner_attribution(
                &orders.df,
                &storage.owner_map,
                storage.description_map.as_ref(),
            )?;
        }
        Ok(Self {
            orders: Some(orders),
            ..self.clone()
        })
    }

    /// Compute storage costs and attribute any existing order lines.
    ///
    /// Goods in depends on the owner map, so a previous goods-in result is
    /// dropped and must be re-run.
    pub fn run_storage(&self, df_stock: &DataFrame, df_pallets: &DataFrame) -> Result<Self> {
        let skus = self.require_skus(EnumStage::Storage)?;
        let storage = compute_storage(df_stock, df_pallets, skus)?;
        let orders = match self.orders() {
            Some(orders) => Some(SpecOrdersOutput {
                df: apply_owner_attribution(
                    &orders.df,
                    &storage.owner_map,
                    storage.description_map.as_ref(),
                )?,
                ..orders.clone()
            }),
            None => None,
        };
        Ok(Self {
            skus: self.skus.clone(),
            orders,
            storage: Some(storage),
            goods_in: None,
        })
    }

    pub fn run_goods_in(&self, df_raw: &DataFrame) -> Result<Self> {
        let skus = self.require_skus(EnumStage::GoodsIn)?;
        let storage = self.require_storage(EnumStage::GoodsIn)?;
        let goods_in = transform_goods_in(df_raw, skus, &storage.owner_map)?;
        Ok(Self {
            goods_in: Some(goods_in),
            ..self.clone()
        })
    }

    /// Build report workbooks from the orders, storage and optional goods-in outputs.
    pub fn assemble_report(&self, options: &SpecReportOptions) -> Result<ReportAssembled> {
        let orders = self.orders().ok_or(CostkitError::StageNotReady {
            stage: EnumStage::Report,
            requires: EnumStage::Orders,
        })?;
        let storage = self.require_storage(EnumStage::Report)?;
        let tables = SpecReportTables {
            orders: &orders.df,
            storage: &storage.df,
            goods_in: self.goods_in().map(|goods_in| &goods_in.df),
        };
        assemble_report(&tables, options)
    }

    // #endregion

    pub fn summary(&self) -> ReportRun {
        ReportRun {
            n_skus: self.skus().map_or(0, SpecValidSkus::len),
            n_orders_total: self.orders().map_or(0, |orders| orders.n_rows_total),
            n_orders_valid: self.orders().map_or(0, |orders| orders.n_rows_valid),
            n_orders_removed: self.orders().map_or(0, SpecOrdersOutput::n_rows_removed),
            n_storage_rows: self.storage().map_or(0, |storage| storage.df.height()),
            n_goods_in_rows: self.goods_in().map(|goods_in| goods_in.df.height()),
        }
    }
}
