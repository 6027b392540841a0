use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::audit::{AuditEntry, AuditLog, validate};
use crate::block::PlacedBlock;
use crate::error::Error;
use crate::model::{BLOCK_ROWS, Row, Worksheet, block_offset};
use crate::ods::Package;
use crate::ods::sheet::{read_worksheet, write_worksheet};
use crate::ods::styles::StyleTable;
use crate::records::{Record, RecordSource};
use crate::template::Template;

pub const DEFAULT_SHEET: &str = "PRINT_ALL";

#[derive(Clone, Debug)]
pub struct AssemblyConfig {
    pub input: PathBuf,
    pub template: PathBuf,
    pub output: PathBuf,
    pub log: PathBuf,
    pub sheet: String,
}

impl AssemblyConfig {
    /// Conventional layout: `in/input.csv`, `in/templates.ods`,
    /// `out/output.ods` and `out/log.txt` under `base`.
    pub fn from_base_dir(base: &Path) -> Self {
        Self {
            input: base.join("in").join("input.csv"),
            template: base.join("in").join("templates.ods"),
            output: base.join("out").join("output.ods"),
            log: base.join("out").join("log.txt"),
            sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AssemblyReport {
    pub records: usize,
    pub anomalies: usize,
    pub elapsed: Duration,
    pub output: PathBuf,
    pub style_count: usize,
    pub print_ranges: Option<String>,
}

/// The output document while blocks are being placed.
pub struct Document {
    package: Package,
    sheet: Worksheet,
    template: Template,
    blocks: Vec<PlacedBlock>,
}

impl Document {
    /// Load `path`, keep only `sheet_name`, and take its master block.
    pub fn open(path: &Path, sheet_name: &str) -> Result<Self, Error> {
        let mut package = Package::open(path)?;
        let table = package.take_sheet(sheet_name)?;
        let mut styles = StyleTable::from_content(package.content());
        let mut sheet = read_worksheet(table, &mut styles);
        let template = Template::extract(&mut sheet, styles)?;
        Ok(Self {
            package,
            sheet,
            template,
            blocks: Vec::new(),
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn blocks(&self) -> &[PlacedBlock] {
        &self.blocks
    }

    pub fn style_count(&self) -> usize {
        self.template.styles().len()
    }

    /// Place the next block, fill it from `record`, and return its anomalies.
    pub fn append_record(&mut self, record: &Record) -> Vec<AuditEntry> {
        let n = self.blocks.len() + 1;
        let template = &self.template;
        let mut block = PlacedBlock::place(template.master_rows(), block_offset(n));
        block.clear(template.clear_targets());
        block.write(template, record);
        block.paginate(n, template.pagination_marker());
        log::debug!(
            "Placed record {n} (order {}) at rows {:?}",
            record.order_no,
            block.row_span()
        );
        self.blocks.push(block);
        validate(record)
    }

    /// Fix the print extent to the placed blocks. With no blocks the
    /// template's own range is left alone.
    pub fn finish(mut self) -> FinishedDocument {
        let n = self.blocks.len();
        if n == 0 {
            log::warn!("No records; leaving the master block and print range unchanged");
        } else {
            self.sheet.set_print_extent(block_offset(n) + BLOCK_ROWS);
        }
        FinishedDocument { doc: self }
    }
}

/// A document whose print extent has been fixed; only this can be saved.
pub struct FinishedDocument {
    doc: Document,
}

impl FinishedDocument {
    pub fn blocks(&self) -> &[PlacedBlock] {
        &self.doc.blocks
    }

    pub fn print_ranges(&self) -> Option<&str> {
        self.doc.sheet.print_ranges.as_deref()
    }

    pub fn style_count(&self) -> usize {
        self.doc.style_count()
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let doc = &self.doc;
        let slot_rows: Vec<&[Row]> = if doc.blocks.is_empty() {
            vec![doc.template.master_rows()]
        } else {
            doc.blocks.iter().map(PlacedBlock::rows).collect()
        };
        let styles = doc.template.styles();
        doc.package
            .save(path, |w| write_worksheet(w, &doc.sheet, styles, &slot_rows))
    }
}

/// Build the output document from the template and every input record, then
/// append the audit log.
///
/// Template and input problems stop the run before anything is written.
/// Record-level anomalies only produce audit entries.
pub fn assemble(config: &AssemblyConfig) -> Result<AssemblyReport, Error> {
    let t0 = Instant::now();

    let mut doc = Document::open(&config.template, &config.sheet)?;
    let source = RecordSource::open(&config.input)?;
    let t_load = t0.elapsed();

    let mut audit = AuditLog::new();
    for record in source.records()? {
        let record = record?;
        audit.record(doc.append_record(&record));
    }
    let records = doc.blocks().len();
    let doc = doc.finish();
    let t_build = t0.elapsed();

    doc.save(&config.output)?;
    let elapsed = t0.elapsed();

    audit.summary(records, elapsed, &config.output);
    audit.append_to(&config.log)?;

    log::info!(
        "Timing: load={:.1}ms, build={:.1}ms, write={:.1}ms, total={:.1}ms ({} records, {} anomalies)",
        t_load.as_secs_f64() * 1000.0,
        (t_build - t_load).as_secs_f64() * 1000.0,
        (elapsed - t_build).as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0,
        records,
        audit.anomaly_count(),
    );

    Ok(AssemblyReport {
        records,
        anomalies: audit.anomaly_count(),
        elapsed,
        output: config.output.clone(),
        style_count: doc.style_count(),
        print_ranges: doc.print_ranges().map(str::to_string),
    })
}
