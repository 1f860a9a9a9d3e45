//! Column-name constants shared by every pipeline stage.

// ── Order-line export ───────────────────────────────────────────────────────
pub mod orders {
    pub const STOCK_CODE: &str = "Stock Code";
    pub const ORDER_NUMBER: &str = "Order Number";
    pub const TOTAL_LOCATIONS: &str = "Total Locations";
    pub const DATE_ORDERED: &str = "Date Ordered";
    pub const LOCATION_CODE: &str = "Location Code";
    pub const STOCK_TITLE: &str = "Stock Title";

    pub const PICK_CHARGE: &str = "Pick Charge";
    pub const PACKAGING: &str = "Packaging";
    pub const PACKAGING_CHARGE: &str = "Packaging Charge";
    pub const LABEL_CHARGE: &str = "Label Charge";

    pub const MONETARY: [&str; 3] = [PICK_CHARGE, PACKAGING_CHARGE, LABEL_CHARGE];

    pub const DROPPED: [&str; 5] = [
        "Sell Price",
        "Line Status",
        "Back Order Status",
        "Back Order Placed Date",
        "Sell Price (Packs)",
    ];
}

// ── Stock report ────────────────────────────────────────────────────────────
pub mod stock {
    pub const STOCK_CODE: &str = "Stock Code";
    pub const RESPONSIBLE_OWNER: &str = "Responsible Owner";
    pub const FULL_DESCRIPTION: &str = "Full Description";
    pub const EVENT: &str = "Event";

    pub const PALLETS: &str = "Pallets";
    pub const COST: &str = "Cost";

    pub const MONETARY: [&str; 1] = [COST];
}

// ── Pallet-period storage report ────────────────────────────────────────────
pub mod pallets {
    pub const PART_NUMBER: &str = "Part Number";
    pub const PERIOD: &str = "Period";
}

// ── Goods-in export ─────────────────────────────────────────────────────────
pub mod goods_in {
    /// Part-number column probe, compared lowercase with spaces removed.
    pub const PART_NO_PROBE: &str = "partno";
    pub const PART_DESCRIPTION: &str = "Part Description";
    pub const QTY: &str = "Qty";
    pub const NO_OF_CONTAINERS_SRC: &str = "No Of Containers";

    pub const STOCK_CODE: &str = "Stock Code";
    pub const NO_OF_CONTAINERS: &str = "No of Containers";
    pub const COST: &str = "Cost";
    pub const RESPONSIBLE_OWNER: &str = "Responsible Owner";

    pub const MONETARY: [&str; 1] = [COST];
}

// ── Summary sheet ───────────────────────────────────────────────────────────
pub mod summary {
    pub const PERIOD: &str = "Period";
    pub const TAB: &str = "Tab";
    pub const TOTAL_COST: &str = "Total Cost";

    pub const MONETARY: [&str; 1] = [TOTAL_COST];
}
