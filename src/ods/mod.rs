pub mod sheet;
pub mod styles;
pub mod xml;

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::Error;

use self::xml::{XmlElement, XmlNode, XmlWriter};

const CONTENT: &str = "content.xml";
const MIMETYPE: &str = "mimetype";
const ODS_MIMETYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";

struct Entry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// An ODF package held in memory. `content.xml` is kept as a parsed tree;
/// every other part is carried through untouched.
pub struct Package {
    entries: Vec<Entry>,
    content: XmlElement,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;

        let mut zip = zip::ZipArchive::new(file)
            .map_err(|_| Error::InvalidOds("file is not a ZIP archive".into()))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let mut data = Vec::new();
            if !is_dir {
                file.read_to_end(&mut data)?;
            }
            entries.push(Entry { name, data, is_dir });
        }

        let raw = entries
            .iter_mut()
            .find(|e| e.name == CONTENT)
            .map(|e| std::mem::take(&mut e.data))
            .ok_or_else(|| Error::InvalidOds("missing content.xml (is this an ODS file?)".into()))?;
        let text = String::from_utf8(raw)
            .map_err(|_| Error::InvalidOds("content.xml is not valid UTF-8".into()))?;
        let xml = roxmltree::Document::parse(&text)?;
        let content = XmlElement::from_node(xml.root_element());

        log::debug!("Opened {} ({} parts)", path.display(), entries.len());
        Ok(Self { entries, content })
    }

    pub fn content(&self) -> &XmlElement {
        &self.content
    }

    /// Detach the sheet called `name` and drop every other sheet. A slot is
    /// left where the detached sheet stood.
    pub fn take_sheet(&mut self, name: &str) -> Result<XmlElement, Error> {
        let spreadsheet = self
            .content
            .child_mut("office:body")
            .and_then(|b| b.child_mut("office:spreadsheet"))
            .ok_or_else(|| Error::InvalidOds("missing office:spreadsheet body".into()))?;

        let mut taken = None;
        let mut kept = Vec::with_capacity(spreadsheet.children.len());
        for child in std::mem::take(&mut spreadsheet.children) {
            match child {
                XmlNode::Element(e) if e.name == "table:table" => {
                    if taken.is_none() && e.attr("table:name") == Some(name) {
                        taken = Some(e);
                        kept.push(XmlNode::Slot);
                    } else {
                        log::info!(
                            "Dropping sheet '{}'",
                            e.attr("table:name").unwrap_or_default()
                        );
                    }
                }
                other => kept.push(other),
            }
        }
        spreadsheet.children = kept;
        taken.ok_or_else(|| Error::MissingSheet(name.to_string()))
    }

    /// Write the package to `path`. `slot` writes the detached sheet.
    ///
    /// The archive is built next to the target and renamed into place, so a
    /// failure never leaves a half-written document behind.
    pub fn save<F>(&self, path: &Path, mut slot: F) -> Result<(), Error>
    where
        F: FnMut(&mut XmlWriter) -> Result<(), Error>,
    {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut w = XmlWriter::new()?;
        w.element(&self.content, &mut slot)?;
        let content = w.into_bytes();

        let tmp = temp_path(path);
        let result = self.write_archive(&tmp, &content);
        match result {
            Ok(()) => std::fs::rename(&tmp, path).map_err(Error::Io),
            Err(e) => {
                std::fs::remove_file(&tmp).ok();
                Err(e)
            }
        }
    }

    fn write_archive(&self, path: &Path, content: &[u8]) -> Result<(), Error> {
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut zip = zip::ZipWriter::new(File::create(path)?);

        // ODF requires the uncompressed mimetype as the first entry.
        let mimetype = self
            .entries
            .iter()
            .find(|e| e.name == MIMETYPE)
            .map(|e| e.data.as_slice())
            .unwrap_or(ODS_MIMETYPE);
        zip.start_file(MIMETYPE, stored)?;
        zip.write_all(mimetype)?;

        for entry in self.entries.iter().filter(|e| e.name != MIMETYPE) {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), deflated)?;
                continue;
            }
            zip.start_file(entry.name.as_str(), deflated)?;
            if entry.name == CONTENT {
                zip.write_all(content)?;
            } else {
                zip.write_all(&entry.data)?;
            }
        }
        zip.finish()?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
