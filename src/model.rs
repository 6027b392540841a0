use std::fmt;

use crate::ods::xml::{XmlElement, XmlNode};

/// Height of one record block in rows.
pub const BLOCK_ROWS: u32 = 31;
/// Last printable column (R).
pub const LAST_COLUMN: u32 = 18;

/// Reference into the shared [`StyleTable`](crate::ods::styles::StyleTable).
/// Cells and rows only ever hold ids; copying an id never creates a style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub rows: u32,
    pub cols: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Cell,
    Covered,
}

/// Attributes that hold a cell's value rather than its formatting.
const VALUE_ATTRS: [&str; 9] = [
    "office:value",
    "office:value-type",
    "office:date-value",
    "office:time-value",
    "office:boolean-value",
    "office:string-value",
    "office:currency",
    "calcext:value-type",
    "table:formula",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub style: Option<StyleId>,
    pub span: Option<Span>,
    pub repeat: u32,
    pub attrs: Vec<(String, String)>,
    pub content: Vec<XmlNode>,
}

impl Cell {
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.content {
            node.collect_text(&mut out);
        }
        out
    }

    /// Drop the cell's value and paragraphs. Style, span and repeat stay as they are.
    pub fn clear_content(&mut self) {
        self.content.clear();
        self.attrs.retain(|(k, _)| !VALUE_ATTRS.contains(&k.as_str()));
    }

    pub fn set_text(&mut self, text: &str) {
        self.clear_content();
        if text.is_empty() {
            return;
        }
        self.attrs
            .push(("office:value-type".to_string(), "string".to_string()));
        let mut p = XmlElement::new("text:p");
        p.children.push(XmlNode::Text(text.to_string()));
        self.content.push(XmlNode::Element(p));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub style: Option<StyleId>,
    pub default_cell_style: Option<StyleId>,
    pub repeat: u32,
    pub attrs: Vec<(String, String)>,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn column_count(&self) -> u32 {
        self.cells.iter().map(Repeated::repeat).sum()
    }

    /// Cell at 1-based `col`, splitting a repeated run so the result stands alone.
    pub fn cell_mut(&mut self, col: u32) -> Option<&mut Cell> {
        let i = materialize(&mut self.cells, col)?;
        self.cells.get_mut(i)
    }

    pub fn cell(&self, col: u32) -> Option<&Cell> {
        let mut current = 1;
        for cell in &self.cells {
            if col < current + cell.repeat {
                return Some(cell);
            }
            current += cell.repeat;
        }
        None
    }
}

/// Runs that ODF compresses with `number-*-repeated`.
pub trait Repeated: Clone {
    /// Number of grid positions this item covers; zero for non-grid items.
    fn repeat(&self) -> u32;
    fn set_repeat(&mut self, n: u32);
}

impl Repeated for Cell {
    fn repeat(&self) -> u32 {
        self.repeat
    }
    fn set_repeat(&mut self, n: u32) {
        self.repeat = n;
    }
}

impl Repeated for Row {
    fn repeat(&self) -> u32 {
        self.repeat
    }
    fn set_repeat(&mut self, n: u32) {
        self.repeat = n;
    }
}

/// Split the run covering 1-based grid position `index` into before/target/after
/// and return the vector index of the single-position target.
pub fn materialize<T: Repeated>(items: &mut Vec<T>, index: u32) -> Option<usize> {
    let mut current = 1;
    for i in 0..items.len() {
        let repeat = items[i].repeat();
        if repeat == 0 {
            continue;
        }
        if index < current + repeat {
            if repeat == 1 {
                return Some(i);
            }
            let before = index - current;
            let after = repeat - before - 1;
            let mut target = items[i].clone();
            target.set_repeat(1);
            let mut replacement = Vec::with_capacity(3);
            if before > 0 {
                let mut run = items[i].clone();
                run.set_repeat(before);
                replacement.push(run);
            }
            replacement.push(target);
            if after > 0 {
                let mut run = items[i].clone();
                run.set_repeat(after);
                replacement.push(run);
            }
            items.splice(i..=i, replacement);
            return Some(i + usize::from(before > 0));
        }
        current += repeat;
    }
    None
}

/// A 1-based cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Parse A1 notation, e.g. `"O29"`.
    pub fn parse(s: &str) -> Option<Self> {
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let col = column_index(&s[..split])?;
        let row = s[split..].parse::<u32>().ok().filter(|r| *r > 0)?;
        Some(Self { col, row })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub const fn new(start: CellRef, end: CellRef) -> Self {
        Self { start, end }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let (a, b) = s.split_once(':')?;
        Some(Self {
            start: CellRef::parse(a)?,
            end: CellRef::parse(b)?,
        })
    }

    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellRef::new(col, row))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        let c = c.to_ascii_uppercase();
        c.is_ascii_uppercase()
            .then(|| acc * 26 + (c as u32 - 'A' as u32 + 1))
    })
}

/// Row offset of the 1-based record `n`.
pub fn block_offset(n: usize) -> u32 {
    (n.saturating_sub(1) as u32) * BLOCK_ROWS
}

/// Map a master-block coordinate onto the block placed at `offset`.
/// Clearing, writing and pagination all go through here.
pub fn translate(master: CellRef, offset: u32) -> CellRef {
    CellRef::new(master.col, master.row + offset)
}

#[derive(Clone)]
pub enum TableChild {
    Row(Row),
    /// Where the placed record blocks are emitted.
    Blocks,
    /// Opens `table:table-header-rows`; the rows up to the matching
    /// `HeaderEnd` repeat at the top of every printed page.
    HeaderStart,
    HeaderEnd,
    Other(XmlNode),
}

impl Repeated for TableChild {
    fn repeat(&self) -> u32 {
        match self {
            TableChild::Row(r) => r.repeat,
            _ => 0,
        }
    }
    fn set_repeat(&mut self, n: u32) {
        if let TableChild::Row(r) = self {
            r.repeat = n;
        }
    }
}

/// The one retained `table:table`.
pub struct Worksheet {
    pub name: String,
    pub style: Option<StyleId>,
    pub attrs: Vec<(String, String)>,
    pub print_ranges: Option<String>,
    pub children: Vec<TableChild>,
}

impl Worksheet {
    pub fn row_count(&self) -> u32 {
        self.children.iter().map(Repeated::repeat).sum()
    }

    /// Child index of 1-based `row`, split out of any repeated run.
    pub fn materialize_row(&mut self, row: u32) -> Option<usize> {
        materialize(&mut self.children, row)
    }

    /// Declare the printable area as columns A..R through `end_row`.
    pub fn set_print_extent(&mut self, end_row: u32) {
        let sheet = quote_sheet_name(&self.name);
        let range = CellRange::new(CellRef::new(1, 1), CellRef::new(LAST_COLUMN, end_row));
        self.print_ranges = Some(format!(
            "{sheet}.{}:{sheet}.{}",
            range.start, range.end
        ));
    }
}

fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}
