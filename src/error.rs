use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("XML writing error: {0}")]
    XmlWrite(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    #[error("Invalid ODS: {0}")]
    InvalidOds(String),

    #[error("Sheet not found: {0}")]
    MissingSheet(String),

    #[error("Incompatible template: {0}")]
    TemplateShape(String),

    #[error("Render failed for {path}: {reason}")]
    Render { path: PathBuf, reason: String },
}
