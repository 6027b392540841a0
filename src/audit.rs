//! Per-record anomaly checks and the append-only audit log.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::error::Error;
use crate::records::{CUSTOMER_NAME, GRAND_TOTAL, ORDER_DATE, ORDER_NO, Record, SERIAL_NO};

/// Value written for a sum or difference that does not fit in a `Decimal`.
pub const OVERFLOW: &str = "OVERFLOW";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    HasProduct17To25,
    TotalMismatch,
    ParseError,
    Summary,
}

impl Reason {
    pub fn code(&self) -> &'static str {
        match self {
            Reason::HasProduct17To25 => "HAS_PRODUCT_17_25",
            Reason::TotalMismatch => "TOTAL_MISMATCH",
            Reason::ParseError => "PARSE_ERROR",
            Reason::Summary => "SUMMARY",
        }
    }
}

/// One log line: the reason, the identifying fields of the record, then
/// reason-specific extras.
#[derive(Clone, Debug, PartialEq)]
pub struct AuditEntry {
    pub reason: Reason,
    pub serial_no: String,
    pub order_no: String,
    pub order_date: String,
    pub customer_name: String,
    pub grand_total: String,
    pub extra: Vec<(String, String)>,
}

impl AuditEntry {
    fn for_record(reason: Reason, record: &Record) -> Self {
        Self {
            reason,
            serial_no: record.serial_no.clone(),
            order_no: record.order_no.clone(),
            order_date: record.order_date.clone(),
            customer_name: record.customer_name.clone(),
            grand_total: record.grand_total.raw.clone(),
            extra: Vec::new(),
        }
    }

    fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.extra.push((key.to_string(), value.to_string()));
        self
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reason={},{SERIAL_NO}={},{ORDER_NO}={},{ORDER_DATE}={},{CUSTOMER_NAME}={},{GRAND_TOTAL}={}",
            self.reason.code(),
            self.serial_no,
            self.order_no,
            self.order_date,
            self.customer_name,
            self.grand_total,
        )?;
        for (key, value) in &self.extra {
            write!(f, ",{key}={value}")?;
        }
        Ok(())
    }
}

/// Check one record. Never fails; an empty result means a clean record.
pub fn validate(record: &Record) -> Vec<AuditEntry> {
    let mut entries = Vec::new();

    if record.overflow_products().iter().any(|p| !p.is_empty()) {
        entries.push(AuditEntry::for_record(Reason::HasProduct17To25, record));
    }

    let sum = record
        .mapped_products()
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.total.parsed.value()));
    let grand_total = record.grand_total.parsed.value();
    let diff = sum.and_then(|s| grand_total.checked_sub(s));
    if diff != Some(Decimal::ZERO) {
        entries.push(
            AuditEntry::for_record(Reason::TotalMismatch, record)
                .with("Sum(Product Totals)", display_or_overflow(sum))
                .with("Diff", display_or_overflow(diff)),
        );
    }

    let invalid: Vec<(String, &str)> = record
        .mapped_products()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.total.parsed.is_invalid())
        .map(|(i, p)| (format!("Product {} Total", i + 1), p.total.raw.as_str()))
        .chain(
            record
                .grand_total
                .parsed
                .is_invalid()
                .then(|| (GRAND_TOTAL.to_string(), record.grand_total.raw.as_str())),
        )
        .collect();
    if !invalid.is_empty() {
        let fields = invalid.iter().map(|(f, _)| f.as_str()).collect::<Vec<_>>();
        let values = invalid.iter().map(|(_, v)| *v).collect::<Vec<_>>();
        entries.push(
            AuditEntry::for_record(Reason::ParseError, record)
                .with("Field", fields.join(";"))
                .with("Value", values.join(";")),
        );
    }

    entries
}

fn display_or_overflow(value: Option<Decimal>) -> String {
    value.map_or_else(|| OVERFLOW.to_string(), |v| v.to_string())
}

#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entries: Vec<AuditEntry>) {
        for entry in &entries {
            log::warn!("{entry}");
        }
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn anomaly_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.reason != Reason::Summary)
            .count()
    }

    pub fn summary(&mut self, total_records: usize, elapsed: Duration, output: &Path) {
        self.entries.push(AuditEntry {
            reason: Reason::Summary,
            serial_no: String::new(),
            order_no: String::new(),
            order_date: String::new(),
            customer_name: String::new(),
            grand_total: String::new(),
            extra: vec![
                ("TotalRecords".to_string(), total_records.to_string()),
                (
                    "ElapsedSeconds".to_string(),
                    format!("{:.2}", elapsed.as_secs_f64()),
                ),
                ("Output".to_string(), output.display().to_string()),
            ],
        });
    }

    /// Append every entry to `path`, one per line. Existing content is kept.
    pub fn append_to(&self, path: &Path) -> Result<(), Error> {
        if self.entries.is_empty() {
            return Ok(());
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut out = BufWriter::new(file);
        for entry in &self.entries {
            writeln!(out, "{entry}")?;
        }
        out.flush()?;
        Ok(())
    }
}
