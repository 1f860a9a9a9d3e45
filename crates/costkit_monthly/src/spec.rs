//! Run options and report-shape enums.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conf::C_SKU_EVENT_DEFAULT;

/// Report workbook shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumWorkbookLayout {
    /// One workbook; every sheet name carries an ` - {owner}` suffix.
    #[default]
    Combined,
    /// One workbook per owner with uniformly named sheets.
    PerOwner,
}

/// Which owners get a report partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumOwnerUniverse {
    /// Owners present in the storage table.
    #[default]
    Storage,
    /// Storage owners, plus `Unknown` when any order or goods-in line is unmapped.
    StorageAndUnknown,
    /// Every owner seen in orders, storage or goods in.
    All,
}

macro_rules! impl_kebab_enum {
    ($ty:ty, $( $variant:path => $text:literal ),+ $(,)?) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let c_text = match self {
                    $( $variant => $text, )+
                };
                f.write_str(c_text)
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().replace('_', "-").as_str() {
                    $( $text => Ok($variant), )+
                    other => Err(format!(
                        "unknown value {other:?}; expected one of: {}",
                        [$( $text ),+].join(", ")
                    )),
                }
            }
        }
    };
}

impl_kebab_enum!(
    EnumWorkbookLayout,
    EnumWorkbookLayout::Combined => "combined",
    EnumWorkbookLayout::PerOwner => "per-owner",
);
impl_kebab_enum!(
    EnumOwnerUniverse,
    EnumOwnerUniverse::Storage => "storage",
    EnumOwnerUniverse::StorageAndUnknown => "storage-and-unknown",
    EnumOwnerUniverse::All => "all",
);

/// Report assembly options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecReportOptions {
    pub layout: EnumWorkbookLayout,
    pub owner_universe: EnumOwnerUniverse,
    /// Free-text period label, e.g. `Mar-24`. Display and naming only.
    pub period: Option<String>,
    /// Append a per-partition summary sheet.
    pub if_include_summary: bool,
}

/// Run-level options, loadable from a config file or environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecRunOptions {
    pub period: Option<String>,
    pub layout: EnumWorkbookLayout,
    pub owner_universe: EnumOwnerUniverse,
    pub summary: bool,
    /// `Event` literal used when the stock report is the SKU source.
    pub sku_event: String,
    pub out_dir: PathBuf,
}

impl Default for SpecRunOptions {
    fn default() -> Self {
        Self {
            period: None,
            layout: EnumWorkbookLayout::default(),
            owner_universe: EnumOwnerUniverse::default(),
            summary: false,
            sku_event: C_SKU_EVENT_DEFAULT.to_string(),
            out_dir: PathBuf::from("."),
        }
    }
}

impl SpecRunOptions {
    pub fn report_options(&self) -> SpecReportOptions {
        SpecReportOptions {
            layout: self.layout,
            owner_universe: self.owner_universe,
            period: self
                .period
                .as_deref()
                .map(str::trim)
                .filter(|period| !period.is_empty())
                .map(ToString::to_string),
            if_include_summary: self.summary,
        }
    }
}
