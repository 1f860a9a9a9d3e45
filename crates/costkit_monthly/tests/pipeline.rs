use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use costkit_monthly::inputs::{
    read_goods_in, read_orders, read_pallet_report, read_sku_list, read_stock_report,
};
use costkit_monthly::{
    EnumWorkbookLayout, ReportAssembled, SpecPipelineContext, SpecReportOptions,
};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;

enum Cell {
    Text(&'static str),
    Num(f64),
}

/// Write one sheet: an optional title row, a header row, then data rows.
fn write_input(path: &Path, title: Option<&str>, header: &[&str], rows: &[Vec<Cell>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let mut n_row = 0u32;
    if let Some(title) = title {
        worksheet.write_string(n_row, 0, title).unwrap();
        n_row += 1;
    }
    for (n_col, label) in header.iter().enumerate() {
        worksheet.write_string(n_row, n_col as u16, *label).unwrap();
    }
    for row in rows {
        n_row += 1;
        for (n_col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(text) => worksheet.write_string(n_row, n_col as u16, *text).unwrap(),
                Cell::Num(x) => worksheet.write_number(n_row, n_col as u16, *x).unwrap(),
            };
        }
    }
    workbook.save(path).unwrap();
}

struct Inputs {
    _dir: tempfile::TempDir,
    skus: PathBuf,
    orders: PathBuf,
    stock: PathBuf,
    pallets: PathBuf,
    goods_in: PathBuf,
}

fn derive_inputs(l_goods_in_codes: &[&'static str]) -> Inputs {
    use Cell::{Num, Text};

    let dir = tempfile::tempdir().unwrap();
    let inputs = Inputs {
        skus: dir.path().join("skus.xlsx"),
        orders: dir.path().join("orders.xlsx"),
        stock: dir.path().join("stock.xlsx"),
        pallets: dir.path().join("pallets.xlsx"),
        goods_in: dir.path().join("goods_in.xlsx"),
        _dir: dir,
    };

    write_input(
        &inputs.skus,
        None,
        &["SKU"],
        &[vec![Text("A1")], vec![Text(" b2 ")]],
    );
    write_input(
        &inputs.orders,
        Some("Order lines export"),
        &["Order Number", "Stock Code", "Stock Title", "Total Locations", "Sell Price"],
        &[
            vec![Text("O1"), Text("A1"), Text("Card"), Num(2.0), Num(9.99)],
            vec![Text("O1"), Text("a1 "), Text("Card"), Num(2.0), Num(9.99)],
            vec![Text("O1"), Text("C3"), Text("Other"), Num(5.0), Num(1.0)],
        ],
    );
    write_input(
        &inputs.stock,
        Some("Stock report"),
        &["Stock Code", "Responsible Owner", "Event"],
        &[
            vec![Text("A1"), Text("North"), Text("Dummy Cards & Boxes")],
            vec![Text("B2"), Text("North"), Text("Dummy Cards & Boxes")],
            vec![Text("C3"), Text("South"), Text("Other")],
        ],
    );
    write_input(
        &inputs.pallets,
        Some("Storage tab"),
        &["Part Number", "Period"],
        &[vec![Text("A1"), Num(3.0)]],
    );
    let l_goods_in_rows: Vec<Vec<Cell>> = l_goods_in_codes
        .iter()
        .map(|code| vec![Text(*code), Text("Receipt"), Num(10.0), Num(2.0)])
        .collect();
    write_input(
        &inputs.goods_in,
        None,
        &["Part No", "Part Description", "Qty", "No Of Containers"],
        &l_goods_in_rows,
    );
    inputs
}

fn run_pipeline(inputs: &Inputs, options: &SpecReportOptions) -> (SpecPipelineContext, ReportAssembled) {
    let ctx = SpecPipelineContext::new()
        .run_sku_list(&read_sku_list(&inputs.skus).unwrap())
        .unwrap()
        .run_orders(&read_orders(&inputs.orders).unwrap())
        .unwrap()
        .run_storage(
            &read_stock_report(&inputs.stock).unwrap(),
            &read_pallet_report(&inputs.pallets).unwrap(),
        )
        .unwrap()
        .run_goods_in(&read_goods_in(&inputs.goods_in).unwrap())
        .unwrap();
    let report = ctx.assemble_report(options).unwrap();
    (ctx, report)
}

fn derive_f64(cell: Option<&Data>) -> f64 {
    match cell {
        Some(Data::Float(x)) => *x,
        Some(Data::Int(x)) => *x as f64,
        Some(Data::String(s)) => s.parse().unwrap(),
        other => panic!("not a number: {other:?}"),
    }
}

fn derive_column_f64(bytes: &[u8], sheet: &str, n_col: u32, n_rows: u32) -> Vec<f64> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    (1..=n_rows)
        .map(|n_row| derive_f64(range.get_value((n_row, n_col))))
        .collect()
}

#[test]
fn allow_list_run_produces_charged_orders_and_storage_sheets() {
    let inputs = derive_inputs(&["X9"]);
    let (ctx, report) = run_pipeline(&inputs, &SpecReportOptions::default());

    let summary = ctx.summary();
    assert_eq!(
        (summary.n_orders_total, summary.n_orders_valid, summary.n_orders_removed),
        (3, 2, 1)
    );
    assert_eq!(summary.n_goods_in_rows, Some(0));

    assert_eq!(report.workbooks.len(), 1);
    let workbook = &report.workbooks[0];
    assert_eq!(workbook.file_name, "monthly_costs_report.xlsx");
    assert_eq!(workbook.sheets, vec!["Orders - North", "Storage - North"]);
    assert_eq!(report.notices.len(), 1);
    assert!(report.notices[0].contains("Goods In"));

    let mut book = open_workbook_auto_from_rs(Cursor::new(workbook.bytes.clone())).unwrap();
    let orders = book.worksheet_range("Orders - North").unwrap();
    let l_header: Vec<String> = (0..10)
        .map(|n_col| orders.get_value((0, n_col)).map(ToString::to_string).unwrap_or_default())
        .collect();
    assert_eq!(
        l_header,
        vec![
            "Order Number",
            "Stock Code",
            "Stock Title",
            "Total Locations",
            "Pick Charge",
            "Packaging",
            "Packaging Charge",
            "Label Charge",
            "Responsible Owner",
            "",
        ]
    );
    assert_eq!(derive_column_f64(&workbook.bytes, "Orders - North", 4, 2), vec![3.18, 3.18]);
    assert_eq!(derive_column_f64(&workbook.bytes, "Orders - North", 5, 2), vec![2.0, 0.0]);
    assert_eq!(derive_column_f64(&workbook.bytes, "Orders - North", 6, 2), vec![1.94, 0.0]);
    assert_eq!(derive_column_f64(&workbook.bytes, "Orders - North", 7, 2), vec![0.78, 0.0]);
    assert_eq!(orders.get_value((3, 0)), Some(&Data::String("Total".to_string())));

    let formulas = book.worksheet_formula("Orders - North").unwrap();
    assert_eq!(formulas.get_value((3, 4)).map(String::as_str), Some("SUM(E2:E3)"));
    assert_eq!(formulas.get_value((3, 6)).map(String::as_str), Some("SUM(G2:G3)"));
    assert_eq!(formulas.get_value((3, 7)).map(String::as_str), Some("SUM(H2:H3)"));
    assert!((derive_f64(orders.get_value((3, 4))) - 6.36).abs() < 1e-9);

    let storage = book.worksheet_range("Storage - North").unwrap();
    let formulas = book.worksheet_formula("Storage - North").unwrap();
    // Stock Code, Responsible Owner, Event, Pallets, Cost
    assert_eq!(formulas.get_value((3, 4)).map(String::as_str), Some("SUM(E2:E3)"));
    assert_eq!(derive_column_f64(&workbook.bytes, "Storage - North", 3, 2), vec![3.0, 0.0]);
    assert_eq!(derive_column_f64(&workbook.bytes, "Storage - North", 4, 2), vec![5.76, 0.0]);
    assert!((derive_f64(storage.get_value((3, 4))) - 5.76).abs() < 1e-9);
}

#[test]
fn matching_goods_in_adds_tab_and_summary_per_owner() {
    let inputs = derive_inputs(&["b2", "X9"]);
    let (_, report) = run_pipeline(
        &inputs,
        &SpecReportOptions {
            layout: EnumWorkbookLayout::PerOwner,
            period: Some("Mar-24".to_string()),
            if_include_summary: true,
            ..Default::default()
        },
    );

    assert!(report.notices.is_empty());
    assert_eq!(report.workbooks.len(), 1);
    let workbook = &report.workbooks[0];
    assert_eq!(workbook.file_name, "North - Mar-24 Monthly Costs.xlsx");
    assert_eq!(workbook.sheets, vec!["Orders", "Storage", "Goods In", "Summary"]);
    assert_eq!(derive_column_f64(&workbook.bytes, "Goods In", 4, 1), vec![10.52]);

    let mut book = open_workbook_auto_from_rs(Cursor::new(workbook.bytes.clone())).unwrap();
    let summary = book.worksheet_range("Summary").unwrap();
    assert_eq!(summary.get_value((1, 0)), Some(&Data::String("Mar-24".to_string())));
    assert_eq!(summary.get_value((3, 1)), Some(&Data::String("Goods In".to_string())));
    // Orders 6.36 + 1.94 + 0.78, storage 5.76, goods in 10.52.
    assert_eq!(derive_column_f64(&workbook.bytes, "Summary", 2, 3), vec![9.08, 5.76, 10.52]);
    let formulas = book.worksheet_formula("Summary").unwrap();
    assert_eq!(formulas.get_value((4, 2)).map(String::as_str), Some("SUM(C2:C4)"));

    let dir_out = tempfile::tempdir().unwrap();
    let l_paths = report.write_to_dir(dir_out.path()).unwrap();
    assert_eq!(l_paths.len(), 1);
    assert!(l_paths[0].ends_with("North - Mar-24 Monthly Costs.xlsx"));
    assert!(l_paths[0].exists());
}

#[test]
fn rerunning_storage_clears_goods_in_until_reprocessed() {
    let inputs = derive_inputs(&["A1"]);
    let (ctx, _) = run_pipeline(&inputs, &SpecReportOptions::default());
    assert_eq!(ctx.summary().n_goods_in_rows, Some(1));

    let ctx = ctx
        .run_storage(
            &read_stock_report(&inputs.stock).unwrap(),
            &read_pallet_report(&inputs.pallets).unwrap(),
        )
        .unwrap();
    assert_eq!(ctx.summary().n_goods_in_rows, None);
    let report = ctx.assemble_report(&SpecReportOptions::default()).unwrap();
    assert_eq!(report.workbooks[0].sheets, vec!["Orders - North", "Storage - North"]);
}
