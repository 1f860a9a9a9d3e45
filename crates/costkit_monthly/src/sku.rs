//! Valid-SKU set construction.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use tracing::info;

use crate::error::{CostkitError, EnumStage, Result};
use crate::frame::{collect_stock_codes, collect_text, require_column};
use crate::schema::stock;

/// Canonical stock-code form: surrounding whitespace trimmed, uppercased.
pub fn normalize_stock_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Immutable set of normalized stock codes that every stage filters on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecValidSkus {
    set_codes: BTreeSet<String>,
}

impl SpecValidSkus {
    /// Build from raw codes; each one is normalized and blanks are skipped.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set_codes = codes
            .into_iter()
            .map(|code| normalize_stock_code(code.as_ref()))
            .filter(|code| !code.is_empty())
            .collect();
        Self { set_codes }
    }

    /// Membership test for an already-normalized code.
    pub fn contains(&self, code: &str) -> bool {
        self.set_codes.contains(code)
    }

    /// Membership test for an optional code; missing codes never match.
    pub fn contains_opt(&self, code: Option<&str>) -> bool {
        code.is_some_and(|code| self.contains(code))
    }

    pub fn len(&self) -> usize {
        self.set_codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set_codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.set_codes.iter().map(String::as_str)
    }
}

/// Valid SKUs from an allow-list; only the first column is read.
pub fn derive_valid_skus_from_list(df: &DataFrame) -> Result<SpecValidSkus> {
    let col = df
        .get_columns()
        .first()
        .ok_or_else(|| CostkitError::missing_column(EnumStage::SkuFilter, "first column"))?;
    let l_codes = collect_stock_codes(col)?;
    let skus = SpecValidSkus::new(l_codes.into_iter().flatten());
    info!(n_skus = skus.len(), "valid SKUs loaded from allow-list");
    Ok(skus)
}

/// Valid SKUs from a stock report: rows whose `Event` equals `event` exactly.
pub fn derive_valid_skus_from_event(df: &DataFrame, event: &str) -> Result<SpecValidSkus> {
    let l_events = collect_text(require_column(df, stock::EVENT, EnumStage::SkuFilter)?)?;
    let l_codes = collect_stock_codes(require_column(df, stock::STOCK_CODE, EnumStage::SkuFilter)?)?;

    let skus = SpecValidSkus::new(
        l_events
            .iter()
            .zip(l_codes)
            .filter(|(value_event, _)| value_event.as_deref() == Some(event))
            .filter_map(|(_, code)| code),
    );
    info!(n_skus = skus.len(), event, "valid SKUs selected by event");
    Ok(skus)
}
