//! Order-line transformer: filtering, packaging eligibility and line charges.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use polars::prelude::{AnyValue, Column, DataFrame};
use tracing::{info, warn};

use costkit_io_xlsx::C_FMT_DATETIME;

use crate::conf::{N_PACKAGING_INTERVAL, N_RATE_LABEL, N_RATE_PACKAGING, N_RATE_PICK};
use crate::error::{EnumStage, Result};
use crate::frame::{
    collect_f64_or_zero, collect_stock_codes, collect_text, filter_rows, probe_column,
    require_column, round2, trim_column_names, upsert_column,
};
use crate::schema::orders;
use crate::sku::SpecValidSkus;

const L_FMT_DATETIME_ACCEPTED: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];
const L_FMT_DATE_ACCEPTED: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Transformed order lines plus row counts for reporting.
#[derive(Debug, Clone)]
pub struct SpecOrdersOutput {
    pub df: DataFrame,
    /// Rows in the export before the SKU filter.
    pub n_rows_total: usize,
    /// Rows kept by the SKU filter.
    pub n_rows_valid: usize,
}

impl SpecOrdersOutput {
    pub fn n_rows_removed(&self) -> usize {
        self.n_rows_total - self.n_rows_valid
    }
}

/// Packaging eligibility per line, in row order.
///
/// The N-th line (1-based) seen for an order number is eligible iff
/// `(N - 1) % 10 == 0`. Lines without an order number are never eligible.
pub fn derive_packaging_flags(l_order_numbers: &[Option<String>]) -> Vec<bool> {
    let mut dict_seen: HashMap<&str, usize> = HashMap::new();
    l_order_numbers
        .iter()
        .map(|order| match order.as_deref() {
            Some(order) => {
                let n_pos = dict_seen.entry(order).or_insert(0);
                *n_pos += 1;
                (*n_pos - 1) % N_PACKAGING_INTERVAL == 0
            }
            None => false,
        })
        .collect()
}

/// Normalize one `Date Ordered` cell to `YYYY-MM-DD HH:MM:SS`.
///
/// Text is tried against ISO layouts first, then month-first, then
/// day-first. Bare numbers are read as spreadsheet serial dates.
pub fn normalize_date_ordered(value: &AnyValue<'_>) -> Option<String> {
    let dt = match value {
        AnyValue::Null => return None,
        AnyValue::String(s) => parse_datetime_text(s),
        AnyValue::StringOwned(s) => parse_datetime_text(s),
        other => other.extract::<f64>().and_then(derive_datetime_from_serial),
    }?;
    Some(dt.format(C_FMT_DATETIME).to_string())
}

fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    L_FMT_DATETIME_ACCEPTED
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            L_FMT_DATE_ACCEPTED
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn derive_datetime_from_serial(x: f64) -> Option<NaiveDateTime> {
    if !x.is_finite() || x < 0.0 {
        return None;
    }
    let dt_epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let n_ms = (x * 86_400_000.0).round() as i64;
    dt_epoch.checked_add_signed(TimeDelta::try_milliseconds(n_ms)?)
}

/// Filter order lines to valid SKUs and derive per-line charges.
pub fn transform_orders(df_raw: &DataFrame, skus: &SpecValidSkus) -> Result<SpecOrdersOutput> {
    let mut df = df_raw.clone();
    trim_column_names(&mut df)?;

    let l_codes = collect_stock_codes(require_column(&df, orders::STOCK_CODE, EnumStage::Orders)?)?;
    let l_locations =
        collect_f64_or_zero(require_column(&df, orders::TOTAL_LOCATIONS, EnumStage::Orders)?)?;
    require_column(&df, orders::ORDER_NUMBER, EnumStage::Orders)?;

    upsert_column(&mut df, Column::new(orders::STOCK_CODE.into(), l_codes.clone()))?;
    upsert_column(&mut df, Column::new(orders::TOTAL_LOCATIONS.into(), l_locations))?;

    if let Some(col) = probe_column(&df, orders::DATE_ORDERED) {
        let mut n_unparsed = 0usize;
        let mut l_dates = Vec::with_capacity(col.len());
        for n_row in 0..col.len() {
            let value = col.get(n_row)?;
            let date = normalize_date_ordered(&value);
            if date.is_none() && !value.is_null() {
                n_unparsed += 1;
            }
            l_dates.push(date);
        }
        if n_unparsed > 0 {
            warn!(n_unparsed, "unparseable Date Ordered values left blank");
        }
        upsert_column(&mut df, Column::new(orders::DATE_ORDERED.into(), l_dates))?;
    }
    if let Some(col) = probe_column(&df, orders::LOCATION_CODE) {
        let l_locations_code = collect_text(col)?;
        upsert_column(&mut df, Column::new(orders::LOCATION_CODE.into(), l_locations_code))?;
    }

    let n_rows_total = df.height();
    let l_mask: Vec<bool> = l_codes
        .iter()
        .map(|code| skus.contains_opt(code.as_deref()))
        .collect();
    let mut df = filter_rows(&df, &l_mask)?;

    for c_dropped in orders::DROPPED {
        if df.get_column_index(c_dropped).is_some() {
            df = df.drop(c_dropped)?;
        }
    }

    let l_locations = collect_f64_or_zero(require_column(&df, orders::TOTAL_LOCATIONS, EnumStage::Orders)?)?;
    let l_order_numbers = collect_text(require_column(&df, orders::ORDER_NUMBER, EnumStage::Orders)?)?;
    let l_flags = derive_packaging_flags(&l_order_numbers);

    let l_pick: Vec<f64> = l_locations.iter().map(|x| round2(x * N_RATE_PICK)).collect();
    let l_packaging: Vec<f64> = l_locations
        .iter()
        .zip(&l_flags)
        .map(|(x, if_eligible)| if *if_eligible { *x } else { 0.0 })
        .collect();
    let l_packaging_charge: Vec<f64> = l_packaging
        .iter()
        .map(|x| round2(x * N_RATE_PACKAGING))
        .collect();
    let l_label_charge: Vec<f64> = l_packaging.iter().map(|x| round2(x * N_RATE_LABEL)).collect();

    upsert_column(&mut df, Column::new(orders::PICK_CHARGE.into(), l_pick))?;
    upsert_column(&mut df, Column::new(orders::PACKAGING.into(), l_packaging))?;
    upsert_column(&mut df, Column::new(orders::PACKAGING_CHARGE.into(), l_packaging_charge))?;
    upsert_column(&mut df, Column::new(orders::LABEL_CHARGE.into(), l_label_charge))?;

    let output = SpecOrdersOutput {
        n_rows_valid: df.height(),
        df,
        n_rows_total,
    };
    info!(
        n_rows_total = output.n_rows_total,
        n_rows_valid = output.n_rows_valid,
        n_rows_removed = output.n_rows_removed(),
        "orders transformed"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn derive_eligible_positions(n_lines: usize) -> Vec<usize> {
        let l_orders = vec![Some("O1".to_string()); n_lines];
        derive_packaging_flags(&l_orders)
            .into_iter()
            .enumerate()
            .filter(|(_, if_eligible)| *if_eligible)
            .map(|(n_idx, _)| n_idx + 1)
            .collect()
    }

    fn derive_f64_column(df: &DataFrame, name: &str) -> Vec<f64> {
        collect_f64_or_zero(df.column(name).unwrap()).unwrap()
    }

    #[test]
    fn packaging_positions_repeat_every_ten_lines() {
        assert_eq!(derive_eligible_positions(25), vec![1, 11, 21]);
        assert_eq!(derive_eligible_positions(10), vec![1]);
    }

    #[test]
    fn packaging_positions_are_counted_per_order_in_row_order() {
        let l_orders: Vec<Option<String>> = ["O1", "O2", "O1", "O2", "O3"]
            .iter()
            .map(|order| Some(order.to_string()))
            .chain([None])
            .collect();
        assert_eq!(
            derive_packaging_flags(&l_orders),
            vec![true, true, false, false, true, false]
        );
    }

    #[test]
    fn charges_follow_unit_rates() {
        let df = DataFrame::new(vec![
            Column::new("Stock Code".into(), vec!["A1"]),
            Column::new("Order Number".into(), vec!["O1"]),
            Column::new("Total Locations".into(), vec![3i64]),
        ])
        .unwrap();
        let output = transform_orders(&df, &SpecValidSkus::new(["A1"])).unwrap();
        assert_eq!(derive_f64_column(&output.df, "Pick Charge"), vec![4.77]);
        assert_eq!(derive_f64_column(&output.df, "Packaging"), vec![3.0]);
        assert_eq!(derive_f64_column(&output.df, "Packaging Charge"), vec![2.91]);
        assert_eq!(derive_f64_column(&output.df, "Label Charge"), vec![1.17]);
    }

    #[test]
    fn allow_list_scenario_filters_and_charges() {
        let df = DataFrame::new(vec![
            Column::new(" Stock Code ".into(), vec!["a1 ", "A1", "C3"]),
            Column::new("Total Locations".into(), vec![2i64, 2, 5]),
            Column::new("Order Number".into(), vec!["O1", "O1", "O1"]),
            Column::new("Sell Price".into(), vec![9.99, 9.99, 9.99]),
        ])
        .unwrap();
        let output = transform_orders(&df, &SpecValidSkus::new(["A1", "B2"])).unwrap();

        assert_eq!(output.n_rows_total, 3);
        assert_eq!(output.n_rows_valid, 2);
        assert_eq!(output.n_rows_removed(), 1);
        assert!(output.df.get_column_index("Sell Price").is_none());
        assert_eq!(
            collect_text(output.df.column("Stock Code").unwrap()).unwrap(),
            vec![Some("A1".to_string()), Some("A1".to_string())]
        );
        assert_eq!(derive_f64_column(&output.df, "Pick Charge"), vec![3.18, 3.18]);
        assert_eq!(derive_f64_column(&output.df, "Packaging"), vec![2.0, 0.0]);
        assert_eq!(derive_f64_column(&output.df, "Packaging Charge"), vec![1.94, 0.0]);
        assert_eq!(derive_f64_column(&output.df, "Label Charge"), vec![0.78, 0.0]);
    }

    #[test]
    fn optional_columns_are_normalized_when_present() {
        let df = DataFrame::new(vec![
            Column::new("Stock Code".into(), vec!["A1", "A1", "A1"]),
            Column::new("Total Locations".into(), vec![Some("1"), Some("x"), None]),
            Column::new("Order Number".into(), vec![1i64, 1, 2]),
            Column::new(
                "Date Ordered".into(),
                vec![Some("2024-03-05"), Some("03/15/2024 08:00"), Some("not a date")],
            ),
            Column::new("Location Code".into(), vec![101i64, 102, 103]),
        ])
        .unwrap();
        let output = transform_orders(&df, &SpecValidSkus::new(["A1"])).unwrap();

        assert_eq!(derive_f64_column(&output.df, "Total Locations"), vec![1.0, 0.0, 0.0]);
        assert_eq!(
            collect_text(output.df.column("Date Ordered").unwrap()).unwrap(),
            vec![
                Some("2024-03-05 00:00:00".to_string()),
                Some("2024-03-15 08:00:00".to_string()),
                None
            ]
        );
        assert_eq!(
            output.df.column("Location Code").unwrap().get(0).unwrap(),
            AnyValue::String("101")
        );
    }

    #[test]
    fn serial_dates_convert_to_timestamps() {
        assert_eq!(
            normalize_date_ordered(&AnyValue::Float64(45356.5)).as_deref(),
            Some("2024-03-05 12:00:00")
        );
    }

    #[test]
    fn missing_order_number_is_reported() {
        let df = DataFrame::new(vec![
            Column::new("Stock Code".into(), vec!["A1"]),
            Column::new("Total Locations".into(), vec![1i64]),
        ])
        .unwrap();
        let err = transform_orders(&df, &SpecValidSkus::new(["A1"])).unwrap_err();
        assert_eq!(err.stage(), Some(EnumStage::Orders));
        assert!(err.to_string().contains("Order Number"));
    }

    #[test]
    fn missing_stock_code_or_locations_is_reported() {
        let skus = SpecValidSkus::new(["A1"]);
        let df_no_code = DataFrame::new(vec![
            Column::new("Order Number".into(), vec!["SO1"]),
            Column::new("Total Locations".into(), vec![1i64]),
        ])
        .unwrap();
        let err = transform_orders(&df_no_code, &skus).unwrap_err();
        assert_eq!(err.stage(), Some(EnumStage::Orders));
        assert!(err.to_string().contains("Stock Code"));

        let df_no_locations = DataFrame::new(vec![
            Column::new("Order Number".into(), vec!["SO1"]),
            Column::new("Stock Code".into(), vec!["A1"]),
        ])
        .unwrap();
        let err = transform_orders(&df_no_locations, &skus).unwrap_err();
        assert!(err.to_string().contains("Total Locations"));
    }
}
