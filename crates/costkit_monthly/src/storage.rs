//! Storage cost calculator and owner/description lookups.

use std::collections::{BTreeSet, HashMap};

use polars::prelude::{Column, DataFrame};
use tracing::info;

use crate::conf::{C_OWNER_UNKNOWN, N_RATE_PALLET};
use crate::error::{EnumStage, Result};
use crate::frame::{
    collect_f64_or_zero, collect_stock_codes, collect_text, filter_rows, probe_column_name_folded,
    require_column, round2, upsert_column,
};
use crate::schema::{pallets, stock};
use crate::sku::SpecValidSkus;

/// Stock code -> responsible owner, read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecOwnerMap {
    dict_owner: HashMap<String, String>,
}

impl SpecOwnerMap {
    /// Build from `(code, owner)` pairs; a later pair for the same code wins.
    pub fn new<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            dict_owner: pairs.into_iter().collect(),
        }
    }

    /// Owner for a normalized code, if mapped.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.dict_owner.get(code).map(String::as_str)
    }

    /// Owner for an optional code, falling back to `Unknown`.
    pub fn resolve(&self, code: Option<&str>) -> String {
        code.and_then(|code| self.get(code))
            .unwrap_or(C_OWNER_UNKNOWN)
            .to_string()
    }

    /// Distinct owners, sorted.
    pub fn owners(&self) -> BTreeSet<String> {
        self.dict_owner.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.dict_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict_owner.is_empty()
    }
}

/// Stock code -> full description.
pub type SpecDescriptionMap = HashMap<String, String>;

/// Storage table plus the lookups derived from it.
#[derive(Debug, Clone)]
pub struct SpecStorageOutput {
    pub df: DataFrame,
    pub owner_map: SpecOwnerMap,
    /// Present only when the stock report carries a `Full Description` column.
    pub description_map: Option<SpecDescriptionMap>,
}

/// Pallet count per normalized part number; later rows win.
pub fn derive_pallet_lookup(df_pallets: &DataFrame) -> Result<HashMap<String, f64>> {
    let l_parts = collect_stock_codes(require_column(df_pallets, pallets::PART_NUMBER, EnumStage::Storage)?)?;
    let l_periods = collect_f64_or_zero(require_column(df_pallets, pallets::PERIOD, EnumStage::Storage)?)?;
    Ok(l_parts
        .into_iter()
        .zip(l_periods)
        .filter_map(|(part, n_period)| part.map(|part| (part, n_period)))
        .collect())
}

/// Filter the stock report to valid SKUs, attach pallets and storage cost.
pub fn compute_storage(
    df_stock_raw: &DataFrame,
    df_pallets: &DataFrame,
    skus: &SpecValidSkus,
) -> Result<SpecStorageOutput> {
    let l_codes = collect_stock_codes(require_column(df_stock_raw, stock::STOCK_CODE, EnumStage::Storage)?)?;
    let l_owners: Vec<String> =
        collect_text(require_column(df_stock_raw, stock::RESPONSIBLE_OWNER, EnumStage::Storage)?)?
            .into_iter()
            .map(|owner| owner.unwrap_or_else(|| C_OWNER_UNKNOWN.to_string()))
            .collect();
    let dict_pallets = derive_pallet_lookup(df_pallets)?;

    let mut df = df_stock_raw.clone();
    upsert_column(&mut df, Column::new(stock::STOCK_CODE.into(), l_codes.clone()))?;
    upsert_column(&mut df, Column::new(stock::RESPONSIBLE_OWNER.into(), l_owners))?;

    let l_mask: Vec<bool> = l_codes
        .iter()
        .map(|code| skus.contains_opt(code.as_deref()))
        .collect();
    let mut df = filter_rows(&df, &l_mask)?;

    let l_codes_kept: Vec<Option<String>> = l_codes
        .into_iter()
        .zip(&l_mask)
        .filter_map(|(code, if_kept)| if_kept.then_some(code))
        .collect();
    let l_pallets: Vec<f64> = l_codes_kept
        .iter()
        .map(|code| {
            code.as_deref()
                .and_then(|code| dict_pallets.get(code).copied())
                .unwrap_or(0.0)
        })
        .collect();
    let l_cost: Vec<f64> = l_pallets.iter().map(|x| round2(x * N_RATE_PALLET)).collect();
    upsert_column(&mut df, Column::new(stock::PALLETS.into(), l_pallets))?;
    upsert_column(&mut df, Column::new(stock::COST.into(), l_cost))?;

    let l_owners_kept = collect_text(require_column(&df, stock::RESPONSIBLE_OWNER, EnumStage::Storage)?)?;
    let owner_map = SpecOwnerMap::new(
        l_codes_kept
            .iter()
            .zip(l_owners_kept)
            .filter_map(|(code, owner)| Some((code.clone()?, owner?))),
    );

    let description_map = match probe_column_name_folded(&df, stock::FULL_DESCRIPTION, false) {
        Some(c_label) => {
            let l_descriptions = collect_text(require_column(&df, &c_label, EnumStage::Storage)?)?;
            Some(
                l_codes_kept
                    .iter()
                    .zip(l_descriptions)
                    .filter_map(|(code, description)| Some((code.clone()?, description?)))
                    .collect::<SpecDescriptionMap>(),
            )
        }
        None => None,
    };

    info!(
        n_rows = df.height(),
        n_owners = owner_map.owners().len(),
        if_has_descriptions = description_map.is_some(),
        "storage costs computed"
    );
    Ok(SpecStorageOutput {
        df,
        owner_map,
        description_map,
    })
}
