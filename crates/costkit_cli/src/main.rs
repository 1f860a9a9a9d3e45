//! `costkit`: reconcile monthly order, storage and goods-in exports into a
//! per-owner cost report.

mod config;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::{ArgGroup, Parser};
use tracing::info;

use costkit_monthly::inputs::{
    read_goods_in, read_orders, read_pallet_report, read_sku_list, read_sku_stock_report,
    read_stock_report,
};
use costkit_monthly::{
    EnumOwnerUniverse, EnumStage, EnumWorkbookLayout, SpecPipelineContext, SpecRunOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "costkit",
    version,
    about = "Build the monthly costs report from order, stock, storage and goods-in exports."
)]
#[command(group(ArgGroup::new("sku_source").required(true).args(["skus", "sku_stock_report"])))]
struct Args {
    /// Order-line export (header on the second row).
    #[arg(long, value_name = "PATH")]
    orders: PathBuf,

    /// SKU allow-list; codes are read from the first column.
    #[arg(long, value_name = "PATH")]
    skus: Option<PathBuf>,

    /// Stock report used as the SKU source, selecting rows by `Event`.
    #[arg(long, value_name = "PATH")]
    sku_stock_report: Option<PathBuf>,

    /// `Event` value selecting valid SKUs from `--sku-stock-report`.
    #[arg(long, value_name = "TEXT")]
    sku_event: Option<String>,

    /// Stock report with `Responsible Owner` (header on the second row).
    #[arg(long, value_name = "PATH")]
    stock: PathBuf,

    /// Pallet-period storage report keyed by `Part Number`.
    #[arg(long, value_name = "PATH")]
    storage: PathBuf,

    /// Goods-in export. Without it the Goods In tab is left out.
    #[arg(long, value_name = "PATH")]
    goods_in: Option<PathBuf>,

    /// Period label for summary rows and per-owner file names, e.g. `Mar-24`.
    #[arg(long, value_name = "TEXT")]
    period: Option<String>,

    /// `combined` or `per-owner`.
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<EnumWorkbookLayout>,

    /// `storage`, `storage-and-unknown` or `all`.
    #[arg(long, value_name = "POLICY")]
    owner_universe: Option<EnumOwnerUniverse>,

    /// Add a Summary sheet per owner.
    #[arg(long)]
    summary: bool,

    /// Directory receiving the report workbooks.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// TOML file with run options; `COSTKIT_*` env vars override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// CLI flags win over config file and environment.
    fn apply_overrides(&self, mut options: SpecRunOptions) -> SpecRunOptions {
        if let Some(period) = &self.period {
            options.period = Some(period.clone());
        }
        if let Some(layout) = self.layout {
            options.layout = layout;
        }
        if let Some(owner_universe) = self.owner_universe {
            options.owner_universe = owner_universe;
        }
        if self.summary {
            options.summary = true;
        }
        if let Some(sku_event) = &self.sku_event {
            options.sku_event = sku_event.clone();
        }
        if let Some(out_dir) = &self.out_dir {
            options.out_dir = out_dir.clone();
        }
        options
    }
}

/// Run one stage; on failure print the stage-scoped message and return `None`.
fn run_stage<T>(stage: EnumStage, step: impl FnOnce() -> costkit_monthly::Result<T>) -> Option<T> {
    match step() {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("An error occurred in {stage} processing: {err}");
            eprintln!("Please check that all files have the expected format and try again.");
            None
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let options = args.apply_overrides(config::load_run_options(args.config.as_deref())?);
    info!(?options, "run options resolved");
    let mut if_any_failed = false;

    let ctx = SpecPipelineContext::new();
    let ctx_skus = match (&args.skus, &args.sku_stock_report) {
        (Some(path), _) => run_stage(EnumStage::SkuFilter, || ctx.run_sku_list(&read_sku_list(path)?)),
        (None, Some(path)) => run_stage(EnumStage::SkuFilter, || {
            ctx.run_sku_event(&read_sku_stock_report(path)?, &options.sku_event)
        }),
        (None, None) => bail!("one of --skus or --sku-stock-report is required"),
    };
    let Some(ctx) = ctx_skus else {
        println!("Please complete SKU List processing before Orders, Storage and Goods In.");
        return Ok(ExitCode::FAILURE);
    };
    println!("Valid SKUs: {}", ctx.summary().n_skus);

    let ctx = match run_stage(EnumStage::Orders, || ctx.run_orders(&read_orders(&args.orders)?)) {
        Some(ctx_next) => {
            let summary = ctx_next.summary();
            println!("Total Orders: {}", summary.n_orders_total);
            println!("Valid Orders: {}", summary.n_orders_valid);
            println!("Removed Orders: {}", summary.n_orders_removed);
            ctx_next
        }
        None => {
            if_any_failed = true;
            ctx
        }
    };

    let ctx = match run_stage(EnumStage::Storage, || {
        ctx.run_storage(&read_stock_report(&args.stock)?, &read_pallet_report(&args.storage)?)
    }) {
        Some(ctx_next) => {
            println!("Storage Lines: {}", ctx_next.summary().n_storage_rows);
            ctx_next
        }
        None => {
            if_any_failed = true;
            ctx
        }
    };

    let if_storage_ready = ctx.storage().is_some();
    let ctx = match (&args.goods_in, if_storage_ready) {
        (Some(path), true) => {
            match run_stage(EnumStage::GoodsIn, || ctx.run_goods_in(&read_goods_in(path)?)) {
                Some(ctx_next) => ctx_next,
                None => {
                    if_any_failed = true;
                    ctx
                }
            }
        }
        (Some(_), false) => {
            println!("Please complete Storage processing before Goods In.");
            ctx
        }
        (None, _) => ctx,
    };

    if ctx.orders().is_none() || ctx.storage().is_none() {
        println!("Please complete Orders and Storage processing before building the report.");
        return Ok(ExitCode::FAILURE);
    }
    let if_written = run_stage(EnumStage::Report, || {
        let report = ctx.assemble_report(&options.report_options())?;
        for c_notice in &report.notices {
            println!("{c_notice}");
        }
        for c_warning in &report.warnings {
            eprintln!("warning: {c_warning}");
        }
        let l_paths = report.write_to_dir(&options.out_dir)?;
        for (workbook, path) in report.workbooks.iter().zip(&l_paths) {
            println!(
                "Wrote {} ({}) [{}]",
                path.display(),
                workbook.sheets.join(", "),
                workbook.mime()
            );
        }
        Ok(())
    })
    .is_some();

    Ok(if if_written && !if_any_failed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::init_tracing(&args.log_level);

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
