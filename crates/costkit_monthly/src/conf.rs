//! Unit rates, input layout constants and report presets.

use costkit_io_xlsx::SpecCellFormat;

/// Charge per picked location.
pub const N_RATE_PICK: f64 = 1.59;
/// Charge per packaging unit.
pub const N_RATE_PACKAGING: f64 = 0.97;
/// Charge per label.
pub const N_RATE_LABEL: f64 = 0.39;
/// Storage charge per pallet for the period.
pub const N_RATE_PALLET: f64 = 1.92;
/// Goods-in charge per container.
pub const N_RATE_CONTAINER: f64 = 5.26;

/// Every n-th line of an order (starting with the first) bears packaging.
pub const N_PACKAGING_INTERVAL: usize = 10;

/// Zero-based header row of the order-line export.
pub const N_ROW_HEADER_ORDERS: usize = 1;
/// Zero-based header row of the stock report.
pub const N_ROW_HEADER_STOCK: usize = 1;
/// Zero-based header row of the pallet-period report.
pub const N_ROW_HEADER_PALLETS: usize = 1;
/// Zero-based header row of the goods-in export.
pub const N_ROW_HEADER_GOODS_IN: usize = 0;
/// Zero-based header row of the SKU allow-list.
pub const N_ROW_HEADER_SKU_LIST: usize = 0;

/// `Event` value marking valid SKUs when the stock report is the SKU source.
pub const C_SKU_EVENT_DEFAULT: &str = "Dummy Cards & Boxes";

/// Owner assigned to stock codes absent from the owner map.
pub const C_OWNER_UNKNOWN: &str = "Unknown";

/// Accounting-style pound format: `£` padded left, two decimals with a
/// thousands separator, a leading minus for negatives, `-` for zero.
pub const C_FMT_CURRENCY: &str = "_-£* #,##0.00_-;-£* #,##0.00_-;_-£* \"-\"??_-;_-@_-";

/// File name of the combined workbook.
pub const C_FILE_COMBINED: &str = "monthly_costs_report.xlsx";

/// Tab names.
pub const C_TAB_ORDERS: &str = "Orders";
pub const C_TAB_STORAGE: &str = "Storage";
pub const C_TAB_GOODS_IN: &str = "Goods In";
pub const C_TAB_SUMMARY: &str = "Summary";

/// Currency cell format.
pub fn derive_currency_format() -> SpecCellFormat {
    SpecCellFormat::from_num_format(C_FMT_CURRENCY)
}
