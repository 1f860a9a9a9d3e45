//! Owner attribution for order lines.

use polars::prelude::{Column, DataFrame};

use crate::error::{EnumStage, Result};
use crate::frame::{collect_stock_codes, require_column, upsert_column};
use crate::schema::{orders, stock};
use crate::storage::{SpecDescriptionMap, SpecOwnerMap};

/// Attach `Responsible Owner` (and `Full Description` when a description map
/// is given) to every order line. No rows are removed.
///
/// `Full Description` lands right after `Stock Title` when that column
/// exists, otherwise at the end. Re-applying replaces both columns in place.
pub fn apply_owner_attribution(
    df_orders: &DataFrame,
    owner_map: &SpecOwnerMap,
    description_map: Option<&SpecDescriptionMap>,
) -> Result<DataFrame> {
    let l_codes = collect_stock_codes(require_column(df_orders, orders::STOCK_CODE, EnumStage::Orders)?)?;
    let mut df = df_orders.clone();

    let l_owners: Vec<String> = l_codes
        .iter()
        .map(|code| owner_map.resolve(code.as_deref()))
        .collect();
    upsert_column(&mut df, Column::new(stock::RESPONSIBLE_OWNER.into(), l_owners))?;

    let Some(dict_descriptions) = description_map else {
        return Ok(df);
    };
    let l_descriptions: Vec<Option<String>> = l_codes
        .iter()
        .map(|code| {
            code.as_deref()
                .and_then(|code| dict_descriptions.get(code))
                .cloned()
        })
        .collect();
    let col_description = Column::new(stock::FULL_DESCRIPTION.into(), l_descriptions);

    if df.get_column_index(stock::FULL_DESCRIPTION).is_some() {
        upsert_column(&mut df, col_description)?;
    } else if let Some(n_idx_title) = df.get_column_index(orders::STOCK_TITLE) {
        df.insert_column(n_idx_title + 1, col_description)?;
    } else {
        upsert_column(&mut df, col_description)?;
    }
    Ok(df)
}
