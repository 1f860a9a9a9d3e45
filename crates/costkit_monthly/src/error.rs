//! Stage-scoped error type.

use std::fmt;

use polars::error::PolarsError;
use thiserror::Error;

/// Pipeline stage, used to scope error and notice messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumStage {
    /// Valid-SKU set construction.
    SkuFilter,
    /// Order-line transformation.
    Orders,
    /// Storage cost calculation and owner map.
    Storage,
    /// Goods-in transformation.
    GoodsIn,
    /// Workbook assembly.
    Report,
}

impl fmt::Display for EnumStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_name = match self {
            Self::SkuFilter => "SKU List",
            Self::Orders => "Orders",
            Self::Storage => "Storage",
            Self::GoodsIn => "Goods In",
            Self::Report => "Report",
        };
        f.write_str(c_name)
    }
}

/// Pipeline failure. Messages name the cause; `stage()` names the stage.
#[derive(Error, Debug)]
pub enum CostkitError {
    #[error("required column {column:?} not found")]
    MissingColumn { stage: EnumStage, column: String },

    #[error("please complete {requires} processing first")]
    StageNotReady { stage: EnumStage, requires: EnumStage },

    #[error("{message}")]
    Xlsx { stage: EnumStage, message: String },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CostkitError {
    /// Stage the error belongs to, when known.
    pub fn stage(&self) -> Option<EnumStage> {
        match self {
            Self::MissingColumn { stage, .. }
            | Self::StageNotReady { stage, .. }
            | Self::Xlsx { stage, .. } => Some(*stage),
            Self::Polars(_) | Self::Io(_) => None,
        }
    }

    pub(crate) fn missing_column(stage: EnumStage, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            stage,
            column: column.into(),
        }
    }
}

pub type Result<T, E = CostkitError> = std::result::Result<T, E>;
