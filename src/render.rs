//! Hand-off to an external office converter (e.g. LibreOffice `soffice`).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;

pub const DEFAULT_CONVERTER: &str = "soffice";

/// Convert `document` to PDF in `out_dir` and return the expected PDF path.
/// The converter is a black box; only its exit status is checked.
pub fn convert(converter: &Path, document: &Path, out_dir: &Path) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(out_dir)?;
    log::info!(
        "Rendering {} with {}",
        document.display(),
        converter.display()
    );
    let output = Command::new(converter)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(out_dir)
        .arg(document)
        .output()
        .map_err(|e| Error::Render {
            path: document.to_path_buf(),
            reason: format!("cannot run {}: {e}", converter.display()),
        })?;
    if !output.status.success() {
        return Err(Error::Render {
            path: document.to_path_buf(),
            reason: format!(
                "{} exited with {}: {}",
                converter.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    let mut name = document.file_stem().unwrap_or_default().to_os_string();
    name.push(".pdf");
    Ok(out_dir.join(name))
}
