#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use odsmerge::AssemblyConfig;
use odsmerge::records::{Amount, LineItem, PRODUCT_SLOTS, Record};

pub const SHEET: &str = "PRINT_ALL";
/// Automatic styles declared by the fixture template.
pub const TEMPLATE_STYLES: usize = 7;

const NS: &str = r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0""#;

#[derive(Clone, Copy, PartialEq)]
pub enum Layout {
    Standard,
    NoPaginationRow,
    Short,
    /// Rows 32-33 repeat on every printed page.
    HeaderInTail,
    /// The master block sits inside the header rows.
    HeaderInMaster,
}

fn header_rows(rows: &str) -> String {
    format!("<table:table-header-rows>{rows}</table:table-header-rows>")
}

fn empty_row(style: &str, repeat: u32) -> String {
    let repeat = if repeat > 1 {
        format!(r#" table:number-rows-repeated="{repeat}""#)
    } else {
        String::new()
    };
    format!(
        r#"<table:table-row table:style-name="{style}"{repeat}><table:table-cell table:number-columns-repeated="18"/></table:table-row>"#
    )
}

fn blank(n: u32) -> String {
    if n == 1 {
        "<table:table-cell/>".to_string()
    } else {
        format!(r#"<table:table-cell table:number-columns-repeated="{n}"/>"#)
    }
}

fn text_cell(text: &str) -> String {
    format!(
        r#"<table:table-cell table:style-name="ce1" office:value-type="string"><text:p>{text}</text:p></table:table-cell>"#
    )
}

fn row(style: &str, repeat: u32, cells: &[String]) -> String {
    let repeat = if repeat > 1 {
        format!(r#" table:number-rows-repeated="{repeat}""#)
    } else {
        String::new()
    };
    format!(
        r#"<table:table-row table:style-name="{style}"{repeat}>{}</table:table-row>"#,
        cells.concat()
    )
}

/// Rows 1..=31 of the fixture: placeholders sit in every clear target.
fn master_rows() -> String {
    let title = r#"<table:table-cell table:style-name="ce1" office:value-type="string" table:number-columns-spanned="18" table:number-rows-spanned="1"><text:p>ORDER SHEET</text:p></table:table-cell><table:covered-table-cell table:number-columns-repeated="17"/>"#;
    let name_cell = r#"<table:table-cell table:style-name="ce1" office:value-type="string" table:number-columns-spanned="3" table:number-rows-spanned="1"><text:p>old-name</text:p></table:table-cell><table:covered-table-cell table:number-columns-repeated="2"/>"#;
    let product = r#"<table:table-cell table:style-name="ce1" office:value-type="float" office:value="1"><text:p>1</text:p></table:table-cell>"#;
    [
        row("ro2", 1, &[title.to_string()]),
        empty_row("ro1", 3),
        row(
            "ro1",
            1,
            &[
                blank(2),
                text_cell("Date:"),
                text_cell("old-date"),
                blank(13),
                text_cell("old-order"),
            ],
        ),
        row(
            "ro1",
            1,
            &[
                blank(2),
                text_cell("Name:"),
                name_cell.to_string(),
                blank(7),
                text_cell("old-serial"),
                blank(4),
            ],
        ),
        row("ro1", 1, &[blank(17), text_cell("old-phone")]),
        empty_row("ro1", 5),
        row(
            "ro1",
            16,
            &[
                blank(2),
                text_cell("old-sku"),
                blank(2),
                text_cell("old-product"),
                blank(5),
                product.to_string(),
                blank(1),
                text_cell("9.99"),
                text_cell("9.99"),
                blank(3),
            ],
        ),
        row(
            "ro1",
            1,
            &[blank(13), text_cell("TOTAL"), text_cell("$0.00"), blank(3)],
        ),
        empty_row("ro1", 2),
    ]
    .concat()
}

pub fn content_xml(layout: Layout) -> String {
    let rows = match layout {
        Layout::Short => empty_row("ro1", 20),
        Layout::NoPaginationRow => [master_rows(), empty_row("ro1", 968)].concat(),
        Layout::HeaderInTail => [
            master_rows(),
            header_rows(&empty_row("ro1", 2)),
            empty_row("ro1", 966),
            empty_row("ro3", 1),
            empty_row("ro1", 10),
        ]
        .concat(),
        Layout::HeaderInMaster => [
            header_rows(&master_rows()),
            empty_row("ro1", 968),
            empty_row("ro3", 1),
            empty_row("ro1", 10),
        ]
        .concat(),
        Layout::Standard => [
            master_rows(),
            empty_row("ro1", 968),
            empty_row("ro3", 1),
            empty_row("ro1", 10),
        ]
        .concat(),
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content {NS} office:version="1.2"><office:automatic-styles><style:style style:name="co1" style:family="table-column"><style:table-column-properties style:column-width="2cm"/></style:style><style:style style:name="ro1" style:family="table-row"><style:table-row-properties style:row-height="0.5cm"/></style:style><style:style style:name="ro2" style:family="table-row"><style:table-row-properties style:row-height="1.2cm"/></style:style><style:style style:name="ro3" style:family="table-row"><style:table-row-properties style:row-height="0.5cm" fo:break-before="page"/></style:style><style:style style:name="ta1" style:family="table"/><style:style style:name="ce1" style:family="table-cell"><style:table-cell-properties fo:border="0.5pt solid #000000"/></style:style><style:style style:name="ce2" style:family="table-cell"/></office:automatic-styles><office:body><office:spreadsheet><table:table table:name="Notes" table:style-name="ta1"><table:table-row table:style-name="ro1"><table:table-cell office:value-type="string"><text:p>scratch</text:p></table:table-cell></table:table-row></table:table><table:table table:name="{SHEET}" table:style-name="ta1" table:print-ranges="'{SHEET}'.A1:'{SHEET}'.R31"><table:table-column table:style-name="co1" table:number-columns-repeated="18" table:default-cell-style-name="ce2"/>{rows}</table:table></office:spreadsheet></office:body></office:document-content>"#
    )
}

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2"><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/><manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/></manifest:manifest>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" office:version="1.2"/>"#;

pub fn write_template(dir: &Path, layout: Layout) -> PathBuf {
    let path = dir.join("templates.ods");
    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    let stored =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/vnd.oasis.opendocument.spreadsheet")
        .unwrap();
    zip.start_file("META-INF/manifest.xml", deflated).unwrap();
    zip.write_all(MANIFEST.as_bytes()).unwrap();
    zip.start_file("content.xml", deflated).unwrap();
    zip.write_all(content_xml(layout).as_bytes()).unwrap();
    zip.start_file("styles.xml", deflated).unwrap();
    zip.write_all(STYLES.as_bytes()).unwrap();
    zip.finish().unwrap();
    path
}

pub fn headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        "Serial No",
        "Order No",
        "Order Date",
        "Customer Name",
        "Customer Phone",
        "Customer Email",
        "Grand Total",
        "Location",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for i in 1..=PRODUCT_SLOTS {
        for field in ["Name", "SKU", "Quantity", "Price", "Total"] {
            headers.push(format!("Product {i} {field}"));
        }
    }
    headers
}

/// Write a CSV with the full header; each row lists only the columns it sets.
pub fn write_csv(dir: &Path, rows: &[Vec<(&str, &str)>]) -> PathBuf {
    let path = dir.join("input.csv");
    let headers = headers();
    let mut w = csv::Writer::from_path(&path).unwrap();
    w.write_record(&headers).unwrap();
    for row in rows {
        let values: HashMap<&str, &str> = row.iter().copied().collect();
        let line: Vec<&str> = headers
            .iter()
            .map(|h| values.get(h.as_str()).copied().unwrap_or(""))
            .collect();
        w.write_record(&line).unwrap();
    }
    w.flush().unwrap();
    path
}

pub fn order(serial: &'static str, grand_total: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("Serial No", serial),
        ("Order No", "ORD-1"),
        ("Order Date", "2024-03-01 10:15:00"),
        ("Customer Name", "Ada Lovelace"),
        ("Customer Phone", "555-0100"),
        ("Grand Total", grand_total),
    ]
}

pub fn config(dir: &Path, template: PathBuf, input: PathBuf) -> AssemblyConfig {
    AssemblyConfig {
        input,
        template,
        output: dir.join("out").join("output.ods"),
        log: dir.join("out").join("log.txt"),
        sheet: SHEET.to_string(),
    }
}

pub fn blank_record() -> Record {
    let item = LineItem {
        name: String::new(),
        sku: String::new(),
        quantity: String::new(),
        price: String::new(),
        total: Amount::new(""),
    };
    Record {
        serial_no: "7".to_string(),
        order_no: "ORD-7".to_string(),
        order_date: "2024-03-01".to_string(),
        customer_name: "Grace Hopper".to_string(),
        customer_phone: String::new(),
        customer_email: String::new(),
        grand_total: Amount::new(""),
        location: String::new(),
        products: vec![item; PRODUCT_SLOTS],
    }
}

pub fn zip_entry(path: &Path, name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut data = Vec::new();
    zip.by_name(name).unwrap().read_to_end(&mut data).unwrap();
    data
}

pub fn zip_names(path: &Path) -> Vec<String> {
    let zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    zip.file_names().map(str::to_string).collect()
}

pub fn content_of(path: &Path) -> String {
    String::from_utf8(zip_entry(path, "content.xml")).unwrap()
}

#[derive(Clone, Debug, PartialEq)]
pub struct CellView {
    pub covered: bool,
    pub style: Option<String>,
    pub text: String,
    pub cols_spanned: Option<String>,
    pub value_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowView {
    pub style: Option<String>,
    pub cells: Vec<CellView>,
}

impl RowView {
    /// 1-based column.
    pub fn cell(&self, col: usize) -> &CellView {
        &self.cells[col - 1]
    }
}

pub struct SheetView {
    pub names: Vec<String>,
    pub print_ranges: Option<String>,
    pub rows: Vec<RowView>,
    pub automatic_styles: usize,
}

impl SheetView {
    /// 1-based row.
    pub fn row(&self, row: usize) -> &RowView {
        &self.rows[row - 1]
    }

    /// Cell by A1 reference.
    pub fn at(&self, a1: &str) -> &CellView {
        let r = odsmerge::model::CellRef::parse(a1).unwrap();
        self.row(r.row as usize).cell(r.col as usize)
    }
}

const TABLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const STYLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:style:1.0";

fn repeat(node: roxmltree::Node, attr: &str) -> usize {
    node.attribute((TABLE_NS, attr))
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
}

fn text_of(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Read the retained sheet back with repeats expanded.
pub fn read_sheet(path: &Path) -> SheetView {
    let xml = content_of(path);
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let tables: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name((TABLE_NS, "table")))
        .collect();
    let names = tables
        .iter()
        .filter_map(|t| t.attribute((TABLE_NS, "name")))
        .map(str::to_string)
        .collect();
    let automatic_styles = doc
        .descendants()
        .filter(|n| n.has_tag_name((OFFICE_NS, "automatic-styles")))
        .flat_map(|n| n.children())
        .filter(|n| n.has_tag_name((STYLE_NS, "style")))
        .count();
    let table = tables
        .iter()
        .find(|t| t.attribute((TABLE_NS, "name")) == Some(SHEET))
        .expect("sheet present");

    let mut rows = Vec::new();
    for row in table
        .children()
        .flat_map(|n| {
            if n.has_tag_name((TABLE_NS, "table-header-rows")) {
                n.children().collect::<Vec<_>>()
            } else {
                vec![n]
            }
        })
        .filter(|n| n.has_tag_name((TABLE_NS, "table-row")))
    {
        let mut cells = Vec::new();
        for cell in row.children().filter(|n| n.is_element()) {
            let view = CellView {
                covered: cell.tag_name().name() == "covered-table-cell",
                style: cell.attribute((TABLE_NS, "style-name")).map(str::to_string),
                text: text_of(cell),
                cols_spanned: cell
                    .attribute((TABLE_NS, "number-columns-spanned"))
                    .map(str::to_string),
                value_type: cell
                    .attribute((OFFICE_NS, "value-type"))
                    .map(str::to_string),
            };
            for _ in 0..repeat(cell, "number-columns-repeated") {
                cells.push(view.clone());
            }
        }
        let view = RowView {
            style: row.attribute((TABLE_NS, "style-name")).map(str::to_string),
            cells,
        };
        for _ in 0..repeat(row, "number-rows-repeated") {
            rows.push(view.clone());
        }
    }

    SheetView {
        names,
        print_ranges: table
            .attribute((TABLE_NS, "print-ranges"))
            .map(str::to_string),
        rows,
        automatic_styles,
    }
}

pub fn read_log(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
