use crate::decimal::normalize_number_text;
use crate::model::{BLOCK_ROWS, Cell, CellRange, CellRef, Row, block_offset, translate};
use crate::records::{MAPPED_PRODUCTS, Record};
use crate::template::{Field, PaginationMarker, Template};

/// The master block materialised for one record. Coordinates passed to its
/// methods are document coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedBlock {
    offset: u32,
    rows: Vec<Row>,
}

impl PlacedBlock {
    /// Copy `master` to start below `offset` rows. Rows and cells are cloned
    /// with their style ids; the style table itself is never touched.
    pub fn place(master: &[Row], offset: u32) -> Self {
        Self {
            offset,
            rows: master.to_vec(),
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// First and last document row covered by this block.
    pub fn row_span(&self) -> (u32, u32) {
        (self.offset + 1, self.offset + BLOCK_ROWS)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        let local = row.checked_sub(self.offset + 1)?;
        self.rows.get(local as usize)
    }

    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        self.row(at.row)?.cell(at.col)
    }

    fn row_mut(&mut self, row: u32) -> Option<&mut Row> {
        let local = row.checked_sub(self.offset + 1)?;
        self.rows.get_mut(local as usize)
    }

    fn cell_mut(&mut self, at: CellRef) -> Option<&mut Cell> {
        self.row_mut(at.row)?.cell_mut(at.col)
    }

    /// Blank the content of every master-local cell in `targets`.
    pub fn clear(&mut self, targets: &[CellRange]) {
        for range in targets {
            for master in range.cells() {
                let at = translate(master, self.offset);
                match self.cell_mut(at) {
                    Some(cell) => cell.clear_content(),
                    None => log::debug!("Clear target {master} is outside the master row"),
                }
            }
        }
    }

    /// Write `text` into the cell bound to `field`. Fields without a slot are skipped.
    pub fn write_field(&mut self, template: &Template, field: Field, text: &str) {
        let Some(master) = template.write_target_for(field) else {
            return;
        };
        let at = translate(master, self.offset);
        match self.cell_mut(at) {
            Some(cell) => cell.set_text(text),
            None => log::warn!("Write target {master} for {field:?} is outside the master row"),
        }
    }

    /// Fill the block from `record`.
    pub fn write(&mut self, template: &Template, record: &Record) {
        self.write_field(template, Field::OrderDate, order_day(&record.order_date));
        self.write_field(template, Field::CustomerName, &record.customer_name);
        self.write_field(template, Field::SerialNo, &record.serial_no);
        self.write_field(template, Field::OrderNo, &record.order_no);
        self.write_field(template, Field::CustomerPhone, &record.customer_phone);

        for (i, item) in record.products.iter().enumerate().take(MAPPED_PRODUCTS) {
            let index = i + 1;
            self.write_field(template, Field::ProductSku(index), &item.sku);
            self.write_field(template, Field::ProductName(index), &item.name);
            self.write_field(
                template,
                Field::ProductQuantity(index),
                &normalize_number_text(&item.quantity),
            );
            self.write_field(
                template,
                Field::ProductPrice(index),
                &normalize_number_text(&item.price),
            );
            self.write_field(
                template,
                Field::ProductTotal(index),
                &normalize_number_text(&item.total.raw),
            );
        }

        let grand_total = format!("${}", record.grand_total.parsed.value());
        self.write_field(template, Field::GrandTotal, &grand_total);
    }

    /// Put a page break before record `n`'s block. The first block never gets one.
    pub fn paginate(&mut self, n: usize, marker: &PaginationMarker) {
        if n < 2 {
            return;
        }
        debug_assert_eq!(self.offset, block_offset(n));
        let first = translate(CellRef::new(1, 1), self.offset);
        if let Some(row) = self.row_mut(first.row) {
            marker.apply(row);
        }
    }
}

/// Date part of an order timestamp like `2024-03-01 10:15:00`.
pub fn order_day(order_date: &str) -> &str {
    order_date.split(' ').next().unwrap_or_default()
}
