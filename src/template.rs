//! The master block and the fixed cell layout of an order block.

use crate::error::Error;
use crate::model::{BLOCK_ROWS, CellRange, CellRef, Row, StyleId, TableChild, Worksheet};
use crate::ods::styles::StyleTable;
use crate::records::MAPPED_PRODUCTS;

/// Row holding the reusable page-break row style.
pub const PAGINATION_ROW: u32 = 1000;

const COL_C: u32 = 3;
const COL_D: u32 = 4;
const COL_F: u32 = 6;
const COL_L: u32 = 12;
const COL_N: u32 = 14;
const COL_O: u32 = 15;
const COL_R: u32 = 18;

/// Master row of product 1; product `i` sits on `FIRST_PRODUCT_ROW + i - 1`.
const FIRST_PRODUCT_ROW: u32 = 13;
const LAST_PRODUCT_ROW: u32 = FIRST_PRODUCT_ROW + MAPPED_PRODUCTS as u32 - 1;
const SUMMARY_ROW: u32 = 29;

const fn column(col: u32) -> CellRange {
    CellRange::new(
        CellRef::new(col, FIRST_PRODUCT_ROW),
        CellRef::new(col, LAST_PRODUCT_ROW),
    )
}

const fn single(col: u32, row: u32) -> CellRange {
    CellRange::new(CellRef::new(col, row), CellRef::new(col, row))
}

const CLEAR_TARGETS: [CellRange; 11] = [
    single(COL_D, 5),
    single(COL_D, 6),
    single(COL_N, 6),
    single(COL_R, 5),
    single(COL_R, 7),
    column(COL_C),
    column(COL_F),
    column(COL_L),
    column(COL_N),
    column(COL_O),
    single(COL_O, SUMMARY_ROW),
];

/// A value slot in the block. Product indexes are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    OrderDate,
    CustomerName,
    SerialNo,
    OrderNo,
    CustomerPhone,
    ProductSku(usize),
    ProductName(usize),
    ProductQuantity(usize),
    ProductPrice(usize),
    ProductTotal(usize),
    GrandTotal,
}

/// Master-local cell receiving `field`, or `None` when the block has no slot
/// for it (products past the sixteenth).
pub fn write_target_for(field: Field) -> Option<CellRef> {
    let product = |i: usize, col: u32| {
        (1..=MAPPED_PRODUCTS)
            .contains(&i)
            .then(|| CellRef::new(col, FIRST_PRODUCT_ROW + i as u32 - 1))
    };
    match field {
        Field::OrderDate => Some(CellRef::new(COL_D, 5)),
        Field::CustomerName => Some(CellRef::new(COL_D, 6)),
        Field::SerialNo => Some(CellRef::new(COL_N, 6)),
        Field::OrderNo => Some(CellRef::new(COL_R, 5)),
        Field::CustomerPhone => Some(CellRef::new(COL_R, 7)),
        Field::ProductSku(i) => product(i, COL_C),
        Field::ProductName(i) => product(i, COL_F),
        Field::ProductQuantity(i) => product(i, COL_L),
        Field::ProductPrice(i) => product(i, COL_N),
        Field::ProductTotal(i) => product(i, COL_O),
        Field::GrandTotal => Some(CellRef::new(COL_O, SUMMARY_ROW)),
    }
}

/// Everything on the pagination-template row except its repeat count.
#[derive(Clone, Debug, PartialEq)]
pub struct PaginationMarker {
    pub style: Option<StyleId>,
    pub default_cell_style: Option<StyleId>,
    pub attrs: Vec<(String, String)>,
}

impl PaginationMarker {
    fn from_row(row: &Row) -> Self {
        Self {
            style: row.style,
            default_cell_style: row.default_cell_style,
            attrs: row.attrs.clone(),
        }
    }

    pub fn apply(&self, row: &mut Row) {
        if self.style.is_some() {
            row.style = self.style;
        }
        if self.default_cell_style.is_some() {
            row.default_cell_style = self.default_cell_style;
        }
        for (key, value) in &self.attrs {
            match row.attrs.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => row.attrs.push((key.clone(), value.clone())),
            }
        }
    }

    pub fn is_carried_by(&self, row: &Row) -> bool {
        self.style.is_none_or(|s| row.style == Some(s))
            && self
                .default_cell_style
                .is_none_or(|s| row.default_cell_style == Some(s))
            && self.attrs.iter().all(|a| row.attrs.contains(a))
    }
}

pub struct Template {
    styles: StyleTable,
    master: Vec<Row>,
    marker: PaginationMarker,
}

impl Template {
    /// Pull the master block out of `sheet`, leaving a block slot in its place.
    ///
    /// Fails when the sheet is too short or the pagination row is missing.
    /// Rows 1..=31 must be plain consecutive rows outside any header-row group.
    pub fn extract(sheet: &mut Worksheet, styles: StyleTable) -> Result<Self, Error> {
        let total = sheet.row_count();
        if total < BLOCK_ROWS {
            return Err(Error::TemplateShape(format!(
                "sheet '{}' has {total} rows, the master block needs {BLOCK_ROWS}",
                sheet.name
            )));
        }

        let mut positions = Vec::with_capacity(BLOCK_ROWS as usize);
        for row in 1..=BLOCK_ROWS {
            let pos = sheet.materialize_row(row).ok_or_else(|| {
                Error::TemplateShape(format!("master row {row} not found"))
            })?;
            positions.push(pos);
        }
        let first = positions[0];
        let last = positions[positions.len() - 1];
        let opened_before = sheet.children[..first]
            .iter()
            .fold(false, |open, c| match c {
                TableChild::HeaderStart => true,
                TableChild::HeaderEnd => false,
                _ => open,
            });
        let marker_inside = sheet.children[first..=last]
            .iter()
            .any(|c| matches!(c, TableChild::HeaderStart | TableChild::HeaderEnd));
        if opened_before || marker_inside {
            return Err(Error::TemplateShape(format!(
                "master rows 1..={BLOCK_ROWS} overlap table:table-header-rows"
            )));
        }
        if positions.iter().enumerate().any(|(i, p)| *p != first + i) {
            return Err(Error::TemplateShape(format!(
                "master rows 1..={BLOCK_ROWS} are not contiguous"
            )));
        }

        let marker_pos = sheet.materialize_row(PAGINATION_ROW).ok_or_else(|| {
            Error::TemplateShape(format!(
                "pagination row {PAGINATION_ROW} not found (sheet has {total} rows)"
            ))
        })?;
        let marker = match &sheet.children[marker_pos] {
            TableChild::Row(row) => PaginationMarker::from_row(row),
            _ => {
                return Err(Error::TemplateShape(format!(
                    "pagination row {PAGINATION_ROW} is not a table row"
                )));
            }
        };
        let breaks = marker
            .style
            .and_then(|s| styles.get(s))
            .is_some_and(|d| d.page_break_before);
        if !breaks {
            log::warn!("Pagination row {PAGINATION_ROW} does not carry a page break style");
        }

        let master = sheet
            .children
            .splice(first..first + BLOCK_ROWS as usize, [TableChild::Blocks])
            .filter_map(|c| match c {
                TableChild::Row(row) => Some(row),
                _ => None,
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Template '{}': {} styles, marker {:?}",
            sheet.name,
            styles.len(),
            marker.style.map(|s| styles.name(s))
        );
        Ok(Self {
            styles,
            master,
            marker,
        })
    }

    pub fn master_rows(&self) -> &[Row] {
        &self.master
    }

    pub fn pagination_marker(&self) -> &PaginationMarker {
        &self.marker
    }

    pub fn clear_targets(&self) -> &'static [CellRange] {
        &CLEAR_TARGETS
    }

    pub fn write_target_for(&self, field: Field) -> Option<CellRef> {
        write_target_for(field)
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }
}
