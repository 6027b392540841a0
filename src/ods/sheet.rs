use std::borrow::Cow;

use crate::error::Error;
use crate::model::{Cell, CellKind, Row, Span, TableChild, Worksheet};

use super::styles::StyleTable;
use super::xml::{XmlElement, XmlNode, XmlWriter};

const ROW: &str = "table:table-row";
const CELL: &str = "table:table-cell";
const COVERED_CELL: &str = "table:covered-table-cell";
const HEADER_ROWS: &str = "table:table-header-rows";
const ROW_GROUPS: [&str; 2] = ["table:table-row-group", "table:table-rows"];

const NAME: &str = "table:name";
const STYLE_NAME: &str = "table:style-name";
const PRINT_RANGES: &str = "table:print-ranges";
const ROWS_REPEATED: &str = "table:number-rows-repeated";
const COLUMNS_REPEATED: &str = "table:number-columns-repeated";
const DEFAULT_CELL_STYLE: &str = "table:default-cell-style-name";
const COLUMNS_SPANNED: &str = "table:number-columns-spanned";
const ROWS_SPANNED: &str = "table:number-rows-spanned";

fn count_attr(value: Option<&str>) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

pub(crate) fn read_worksheet(table: XmlElement, styles: &mut StyleTable) -> Worksheet {
    let mut sheet = Worksheet {
        name: table.attr(NAME).unwrap_or_default().to_string(),
        style: table.attr(STYLE_NAME).map(|s| styles.intern(s)),
        attrs: table
            .attrs
            .iter()
            .filter(|(k, _)| k != NAME && k != STYLE_NAME && k != PRINT_RANGES)
            .cloned()
            .collect(),
        print_ranges: table.attr(PRINT_RANGES).map(str::to_string),
        children: Vec::new(),
    };
    // Namespace declarations on the table itself are rare but must survive.
    sheet.attrs.splice(0..0, table.namespaces.iter().cloned());
    collect_children(table.children, styles, &mut sheet.children);
    sheet
}

fn collect_children(nodes: Vec<XmlNode>, styles: &mut StyleTable, out: &mut Vec<TableChild>) {
    for node in nodes {
        match node {
            XmlNode::Element(e) if e.name == ROW => out.push(TableChild::Row(read_row(e, styles))),
            XmlNode::Element(e) if e.name == HEADER_ROWS => {
                out.push(TableChild::HeaderStart);
                collect_children(e.children, styles, out);
                out.push(TableChild::HeaderEnd);
            }
            XmlNode::Element(e) if ROW_GROUPS.contains(&e.name.as_str()) => {
                log::warn!("Flattening <{}>; row grouping is not preserved", e.name);
                collect_children(e.children, styles, out);
            }
            XmlNode::Text(t) if t.trim().is_empty() => {}
            other => out.push(TableChild::Other(other)),
        }
    }
}

fn read_row(el: XmlElement, styles: &mut StyleTable) -> Row {
    let style = el.attr(STYLE_NAME).map(|s| styles.intern(s));
    let default_cell_style = el.attr(DEFAULT_CELL_STYLE).map(|s| styles.intern(s));
    let repeat = count_attr(el.attr(ROWS_REPEATED));
    let attrs = el
        .attrs
        .iter()
        .filter(|(k, _)| k != STYLE_NAME && k != DEFAULT_CELL_STYLE && k != ROWS_REPEATED)
        .cloned()
        .collect();
    let cells = el
        .children
        .into_iter()
        .filter_map(|c| match c {
            XmlNode::Element(e) if e.name == CELL || e.name == COVERED_CELL => {
                Some(read_cell(e, styles))
            }
            _ => None,
        })
        .collect();
    Row {
        style,
        default_cell_style,
        repeat,
        attrs,
        cells,
    }
}

fn read_cell(el: XmlElement, styles: &mut StyleTable) -> Cell {
    let kind = if el.name == COVERED_CELL {
        CellKind::Covered
    } else {
        CellKind::Cell
    };
    let span = (el.attr(COLUMNS_SPANNED).is_some() || el.attr(ROWS_SPANNED).is_some()).then(|| {
        Span {
            rows: count_attr(el.attr(ROWS_SPANNED)),
            cols: count_attr(el.attr(COLUMNS_SPANNED)),
        }
    });
    Cell {
        kind,
        style: el.attr(STYLE_NAME).map(|s| styles.intern(s)),
        span,
        repeat: count_attr(el.attr(COLUMNS_REPEATED)),
        attrs: el
            .attrs
            .iter()
            .filter(|(k, _)| {
                ![STYLE_NAME, COLUMNS_REPEATED, COLUMNS_SPANNED, ROWS_SPANNED].contains(&k.as_str())
            })
            .cloned()
            .collect(),
        content: el.children,
    }
}

/// Write `sheet` as a `table:table`, emitting `slot_rows` where the blocks go.
pub(crate) fn write_worksheet(
    w: &mut XmlWriter,
    sheet: &Worksheet,
    styles: &StyleTable,
    slot_rows: &[&[Row]],
) -> Result<(), Error> {
    let mut attrs: Vec<(&str, Cow<str>)> = vec![(NAME, Cow::Borrowed(sheet.name.as_str()))];
    if let Some(style) = sheet.style {
        attrs.push((STYLE_NAME, Cow::Borrowed(styles.name(style))));
    }
    attrs.extend(sheet.attrs.iter().map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str()))));
    if let Some(ranges) = &sheet.print_ranges {
        attrs.push((PRINT_RANGES, Cow::Borrowed(ranges.as_str())));
    }
    w.start("table:table", attrs, false)?;
    for child in &sheet.children {
        match child {
            TableChild::Row(row) => write_row(w, row, styles)?,
            TableChild::Blocks => {
                for row in slot_rows.iter().flat_map(|rows| rows.iter()) {
                    write_row(w, row, styles)?;
                }
            }
            TableChild::HeaderStart => w.start(HEADER_ROWS, std::iter::empty(), false)?,
            TableChild::HeaderEnd => w.end(HEADER_ROWS)?,
            TableChild::Other(node) => w.nodes(std::slice::from_ref(node))?,
        }
    }
    w.end("table:table")
}

fn write_row(w: &mut XmlWriter, row: &Row, styles: &StyleTable) -> Result<(), Error> {
    let mut attrs: Vec<(&str, Cow<str>)> = Vec::with_capacity(row.attrs.len() + 3);
    if let Some(style) = row.style {
        attrs.push((STYLE_NAME, Cow::Borrowed(styles.name(style))));
    }
    if row.repeat > 1 {
        attrs.push((ROWS_REPEATED, Cow::Owned(row.repeat.to_string())));
    }
    if let Some(style) = row.default_cell_style {
        attrs.push((DEFAULT_CELL_STYLE, Cow::Borrowed(styles.name(style))));
    }
    attrs.extend(row.attrs.iter().map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str()))));
    w.start(ROW, attrs, row.cells.is_empty())?;
    if row.cells.is_empty() {
        return Ok(());
    }
    for cell in &row.cells {
        write_cell(w, cell, styles)?;
    }
    w.end(ROW)
}

fn write_cell(w: &mut XmlWriter, cell: &Cell, styles: &StyleTable) -> Result<(), Error> {
    let name = match cell.kind {
        CellKind::Cell => CELL,
        CellKind::Covered => COVERED_CELL,
    };
    let mut attrs: Vec<(&str, Cow<str>)> = Vec::with_capacity(cell.attrs.len() + 4);
    if let Some(style) = cell.style {
        attrs.push((STYLE_NAME, Cow::Borrowed(styles.name(style))));
    }
    if cell.repeat > 1 {
        attrs.push((COLUMNS_REPEATED, Cow::Owned(cell.repeat.to_string())));
    }
    if let Some(span) = cell.span {
        attrs.push((COLUMNS_SPANNED, Cow::Owned(span.cols.to_string())));
        attrs.push((ROWS_SPANNED, Cow::Owned(span.rows.to_string())));
    }
    attrs.extend(cell.attrs.iter().map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str()))));
    w.start(name, attrs, cell.content.is_empty())?;
    if cell.content.is_empty() {
        return Ok(());
    }
    w.nodes(&cell.content)?;
    w.end(name)
}
