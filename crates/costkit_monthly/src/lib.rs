//! `costkit_monthly` v1:
//! Monthly costs reconciliation pipeline.
//!
//! - `sku`         : valid-SKU set from an allow-list or a stock-report event
//! - `orders`      : order-line filtering, packaging eligibility, line charges
//! - `storage`     : pallet storage cost and owner/description maps
//! - `attribution` : owner (and description) columns on order lines
//! - `goods_in`    : goods-in receipts filtered and priced
//! - `report`      : per-owner workbooks with total rows and currency format
//! - `pipeline`    : immutable context threading the stages of one run
//! - `inputs`      : source workbook readers with their header offsets
pub mod attribution;
pub mod conf;
pub mod error;
pub mod frame;
pub mod goods_in;
pub mod inputs;
pub mod orders;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod sku;
pub mod spec;
pub mod storage;

pub use attribution::apply_owner_attribution;
pub use error::{CostkitError, EnumStage, Result};
pub use goods_in::{SpecGoodsInOutput, transform_goods_in};
pub use orders::{SpecOrdersOutput, derive_packaging_flags, transform_orders};
pub use pipeline::{ReportRun, SpecPipelineContext};
pub use report::{
    ReportAssembled, SpecReportTables, SpecReportWorkbook, assemble_report, derive_owner_universe,
};
pub use sku::{
    SpecValidSkus, derive_valid_skus_from_event, derive_valid_skus_from_list, normalize_stock_code,
};
pub use spec::{
    EnumOwnerUniverse, EnumWorkbookLayout, SpecReportOptions, SpecRunOptions,
};
pub use storage::{SpecDescriptionMap, SpecOwnerMap, SpecStorageOutput, compute_storage};

pub use costkit_io_xlsx::C_MIME_XLSX;
