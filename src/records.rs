use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::decimal::{DecimalOutcome, parse_decimal};
use crate::error::Error;

pub const PRODUCT_SLOTS: usize = 25;
pub const MAPPED_PRODUCTS: usize = 16;

pub const SERIAL_NO: &str = "Serial No";
pub const ORDER_NO: &str = "Order No";
pub const ORDER_DATE: &str = "Order Date";
pub const CUSTOMER_NAME: &str = "Customer Name";
pub const CUSTOMER_PHONE: &str = "Customer Phone";
pub const CUSTOMER_EMAIL: &str = "Customer Email";
pub const GRAND_TOTAL: &str = "Grand Total";
pub const LOCATION: &str = "Location";

/// A numeric field: the trimmed source text plus its parse outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct Amount {
    pub raw: String,
    pub parsed: DecimalOutcome,
}

impl Amount {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = parse_decimal(&raw);
        Self { raw, parsed }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub sku: String,
    pub quantity: String,
    pub price: String,
    pub total: Amount,
}

impl LineItem {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.sku.is_empty()
            && self.quantity.is_empty()
            && self.price.is_empty()
            && self.total.raw.is_empty()
    }
}

/// One order row. `products` always holds `PRODUCT_SLOTS` items; index 0 is product 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub serial_no: String,
    pub order_no: String,
    pub order_date: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub grand_total: Amount,
    pub location: String,
    pub products: Vec<LineItem>,
}

impl Record {
    pub fn mapped_products(&self) -> &[LineItem] {
        &self.products[..MAPPED_PRODUCTS]
    }

    pub fn overflow_products(&self) -> &[LineItem] {
        &self.products[MAPPED_PRODUCTS..]
    }
}

/// Header-indexed CSV input. Each call to [`RecordSource::records`] re-reads the
/// file from its first data row.
pub struct RecordSource {
    path: PathBuf,
    columns: HashMap<String, usize>,
}

impl RecordSource {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut reader = open_reader(path)?;
        let columns = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect::<HashMap<_, _>>();
        if columns.is_empty() {
            return Err(Error::InvalidCsv(format!(
                "{}: missing header row",
                path.display()
            )));
        }
        for required in [SERIAL_NO, ORDER_NO, GRAND_TOTAL] {
            if !columns.contains_key(required) {
                log::warn!("Input column '{required}' not found; treating it as empty");
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            columns,
        })
    }

    pub fn records(&self) -> Result<Records<'_>, Error> {
        let reader = open_reader(&self.path)?;
        Ok(Records {
            source: self,
            inner: reader.into_byte_records(),
        })
    }

    /// Trimmed text of `name`. Bytes that are not UTF-8 are replaced rather
    /// than failing the row.
    fn field(&self, row: &csv::ByteRecord, name: &str) -> String {
        self.columns
            .get(name)
            .and_then(|&i| row.get(i))
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .unwrap_or_default()
    }

    fn build(&self, row: &csv::ByteRecord) -> Record {
        if std::str::from_utf8(row.as_slice()).is_err() {
            let line = row.position().map_or(0, csv::Position::line);
            log::warn!("Input line {line} is not valid UTF-8; replacing bad bytes");
        }
        let text = |name: &str| self.field(row, name);
        let products = (1..=PRODUCT_SLOTS)
            .map(|i| LineItem {
                name: text(&format!("Product {i} Name")),
                sku: text(&format!("Product {i} SKU")),
                quantity: text(&format!("Product {i} Quantity")),
                price: text(&format!("Product {i} Price")),
                total: Amount::new(text(&format!("Product {i} Total"))),
            })
            .collect();
        Record {
            serial_no: text(SERIAL_NO),
            order_no: text(ORDER_NO),
            order_date: text(ORDER_DATE),
            customer_name: text(CUSTOMER_NAME),
            customer_phone: text(CUSTOMER_PHONE),
            customer_email: text(CUSTOMER_EMAIL),
            grand_total: Amount::new(text(GRAND_TOTAL)),
            location: text(LOCATION),
            products,
        }
    }
}

pub struct Records<'a> {
    source: &'a RecordSource,
    inner: csv::ByteRecordsIntoIter<File>,
}

impl Iterator for Records<'_> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.inner.next()?;
        Some(row.map(|r| self.source.build(&r)).map_err(Error::from))
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, Error> {
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, path.display()),
        ))
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}
