//! DOCX Provider
//!
//! Reads a WordprocessingML package: styles and document defaults, numbering
//! definitions, body blocks, section properties and header/footer parts.

mod body;
mod styles;

use super::xml_tree;
use super::{has_extension, DocumentProvider};
use crate::document::{Document, NumberingTable, PagePart, PagePartKind, SourceInfo, StyleTable};
use crate::error::DocruleError;
use crate::storage::sha256_hex;
use anyhow::Result;
use regex::Regex;
use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::LazyLock;
use zip::result::ZipError;
use zip::ZipArchive;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const NUMBERING_PART: &str = "word/numbering.xml";

static PAGE_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^word/(header|footer)\d*\.xml$").unwrap());

pub struct DocxProvider;

impl DocxProvider {
    /// Parse package bytes without touching the filesystem. The result has no
    /// `source`; `open` fills it in.
    pub fn parse_package(&self, bytes: &[u8]) -> Result<Document> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(DocruleError::from)?;

        let document_xml = read_part(&mut archive, DOCUMENT_PART)?
            .ok_or_else(|| DocruleError::MissingPart(DOCUMENT_PART.to_string()))?;

        let styles = match read_part(&mut archive, STYLES_PART)? {
            Some(xml) => styles::parse_styles(&xml)?,
            None => {
                log::warn!("package has no {STYLES_PART}; every style lookup will fall through");
                StyleTable::default()
            }
        };

        let numbering = match read_part(&mut archive, NUMBERING_PART)? {
            Some(xml) => styles::parse_numbering(&xml)?,
            None => NumberingTable::default(),
        };

        let root = xml_tree::parse(&document_xml, DOCUMENT_PART)?;
        let body_element = root
            .child("document")
            .and_then(|d| d.child("body"))
            .ok_or_else(|| DocruleError::MissingPart(format!("{DOCUMENT_PART} (w:body)")))?;
        let mut sections = Vec::new();
        let body = body::parse_blocks(body_element, &mut sections);

        let page_parts = read_page_parts(&mut archive)?;

        Ok(Document {
            body,
            styles,
            numbering,
            sections,
            page_parts,
            source: None,
        })
    }
}

impl DocumentProvider for DocxProvider {
    fn name(&self) -> &str {
        "DocxProvider"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["docx", "docm", "dotx"])
    }

    fn open(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path).map_err(|e| DocruleError::io(path, e))?;
        let mut document = self.parse_package(&bytes)?;
        document.source = Some(SourceInfo {
            path: path.display().to_string(),
            sha256: sha256_hex(&bytes),
        });
        log::info!(
            "opened {} ({} bytes, {} styles, {} sections, {} header/footer parts)",
            path.display(),
            bytes.len(),
            document.styles.styles.len(),
            document.sections.len(),
            document.page_parts.len()
        );
        Ok(document)
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(DocruleError::from(e).into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| DocruleError::io(name, e))?;
    Ok(Some(xml))
}

fn read_page_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<PagePart>> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| PAGE_PART_REGEX.is_match(name))
        .map(str::to_string)
        .collect();
    names.sort();

    let mut parts = Vec::new();
    for name in names {
        let Some(xml) = read_part(archive, &name)? else {
            continue;
        };
        let root = xml_tree::parse(&xml, &name)?;
        let (kind, element) = match (root.child("hdr"), root.child("ftr")) {
            (Some(hdr), _) => (PagePartKind::Header, hdr),
            (None, Some(ftr)) => (PagePartKind::Footer, ftr),
            (None, None) => continue,
        };
        let mut ignored_sections = Vec::new();
        let blocks = body::parse_blocks(element, &mut ignored_sections);
        parts.push(PagePart {
            name,
            kind,
            paragraphs: body::paragraphs(blocks),
        });
    }
    Ok(parts)
}
