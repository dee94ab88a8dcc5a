//! Document Annotator
//!
//! Writes a highlighted copy of the checked package. Paragraphs are found again
//! by their pre-order index (the k-th `w:p` not nested in another `w:p`), the
//! same counting the DOCX provider uses, and get a background shading in their
//! paragraph properties. Every other package entry is copied byte for byte.
//!
//! The copy is built in a temporary file next to the target and only renamed
//! into place once complete; any failure leaves no output behind.

use crate::error::DocruleError;
use crate::providers::docx::DOCUMENT_PART;
use crate::storage::sha256_hex;
use crate::types::CheckReport;
use anyhow::{bail, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// Highlight colour for flagged paragraphs
pub const DEFAULT_FILL: &str = "FFFF00";

/// `w:pPr` children that come after `w:shd` in schema order.
const AFTER_SHADING: &[&[u8]] = &[
    b"tabs",
    b"suppressAutoHyphens",
    b"kinsoku",
    b"wordWrap",
    b"overflowPunct",
    b"topLinePunct",
    b"autoSpaceDE",
    b"autoSpaceDN",
    b"bidi",
    b"adjustRightInd",
    b"snapToGrid",
    b"spacing",
    b"ind",
    b"contextualSpacing",
    b"mirrorIndents",
    b"suppressOverlap",
    b"jc",
    b"textDirection",
    b"textAlignment",
    b"textboxTightWrap",
    b"outlineLvl",
    b"divId",
    b"cnfStyle",
    b"rPr",
    b"sectPr",
    b"pPrChange",
];

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationSummary {
    pub target: PathBuf,
    /// Distinct paragraphs carrying violations
    pub flagged: usize,
    /// Paragraphs actually shaded in the copy
    pub highlighted: usize,
}

pub struct Annotator {
    fill: String,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::with_fill(DEFAULT_FILL)
    }
}

impl Annotator {
    pub fn with_fill(fill: impl Into<String>) -> Self {
        Self { fill: fill.into() }
    }

    /// Write a copy of the report's source document to `target` with every
    /// flagged paragraph highlighted. Fails with `SourceChanged` when the
    /// source no longer hashes to what was checked.
    pub fn annotate(&self, report: &CheckReport, target: &Path) -> Result<AnnotationSummary> {
        let source = report.source.as_ref().ok_or(DocruleError::NoSource)?;
        let source_path = Path::new(&source.path);

        let bytes = fs::read(source_path).map_err(|e| DocruleError::io(source_path, e))?;
        let actual = sha256_hex(&bytes);
        if actual != source.sha256 {
            return Err(DocruleError::SourceChanged {
                expected: source.sha256.clone(),
                actual,
            }
            .into());
        }

        if let (Ok(a), Ok(b)) = (source_path.canonicalize(), target.canonicalize()) {
            if a == b {
                bail!("refusing to annotate {} in place", target.display());
            }
        }

        let flagged: HashSet<usize> = report.flagged_nodes().into_iter().map(|n| n.0).collect();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut staged =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| DocruleError::io(&dir, e))?;
        let highlighted = self.write_copy(&bytes, &flagged, staged.as_file_mut())?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| DocruleError::io(staged.path(), e))?;
        staged
            .persist(target)
            .map_err(|e| DocruleError::io(target, e.error))?;

        if highlighted < flagged.len() {
            log::warn!(
                "{} flagged paragraph(s) were not found in the copy",
                flagged.len() - highlighted
            );
        }
        log::info!(
            "annotated copy written to {} ({} paragraph(s) highlighted)",
            target.display(),
            highlighted
        );
        Ok(AnnotationSummary {
            target: target.to_path_buf(),
            flagged: flagged.len(),
            highlighted,
        })
    }

    fn write_copy(
        &self,
        package: &[u8],
        flagged: &HashSet<usize>,
        out: &mut fs::File,
    ) -> Result<usize> {
        let mut archive = ZipArchive::new(Cursor::new(package)).map_err(DocruleError::from)?;
        let mut writer = ZipWriter::new(out);
        let mut highlighted = None;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(DocruleError::from)?;
            if entry.name() != DOCUMENT_PART {
                writer.raw_copy_file(entry).map_err(DocruleError::from)?;
                continue;
            }
            let mut xml = String::new();
            entry
                .read_to_string(&mut xml)
                .map_err(|e| DocruleError::io(DOCUMENT_PART, e))?;
            let (rewritten, count) = highlight_paragraphs(&xml, flagged, &self.fill)?;
            writer
                .start_file(DOCUMENT_PART, FileOptions::default())
                .map_err(DocruleError::from)?;
            writer
                .write_all(&rewritten)
                .map_err(|e| DocruleError::io(DOCUMENT_PART, e))?;
            highlighted = Some(count);
        }

        writer.finish().map_err(DocruleError::from)?;
        highlighted.ok_or_else(|| DocruleError::MissingPart(DOCUMENT_PART.to_string()).into())
    }
}

/// Shade the flagged top-level paragraphs of a `document.xml`. Returns the new
/// part and how many paragraphs were shaded.
pub fn highlight_paragraphs(
    xml: &str,
    flagged: &HashSet<usize>,
    fill: &str,
) -> Result<(Vec<u8>, usize), DocruleError> {
    let mut reader = Reader::from_str(xml);
    let mut highlighter = Highlighter {
        flagged,
        fill,
        writer: Writer::new(Cursor::new(Vec::new())),
        p_depth: 0,
        next_index: 0,
        highlighted: 0,
        state: State::Idle,
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocruleError::xml(DOCUMENT_PART, e))?;
        if matches!(event, Event::Eof) {
            break;
        }
        highlighter
            .handle(event)
            .map_err(|e| DocruleError::xml(DOCUMENT_PART, e))?;
    }

    Ok((highlighter.writer.into_inner().into_inner(), highlighter.highlighted))
}

enum State {
    Idle,
    /// A flagged paragraph opened; its properties element is not seen yet
    AwaitProps { prefix: String },
    /// Inside the flagged paragraph's `pPr`; depth counts open children
    InProps {
        prefix: String,
        depth: usize,
        inserted: bool,
    },
    /// Dropping the paragraph's existing shading element
    SkipShading {
        prefix: String,
        depth: usize,
        inserted: bool,
    },
}

struct Highlighter<'f> {
    flagged: &'f HashSet<usize>,
    fill: &'f str,
    writer: Writer<Cursor<Vec<u8>>>,
    p_depth: usize,
    next_index: usize,
    highlighted: usize,
    state: State,
}

impl Highlighter<'_> {
    fn handle(&mut self, event: Event<'_>) -> quick_xml::Result<()> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => self.handle_plain(event),

            State::AwaitProps { prefix } => match event {
                Event::Start(e) if is_local(&e, b"pPr") => {
                    self.state = State::InProps {
                        prefix,
                        depth: 0,
                        inserted: false,
                    };
                    self.write(Event::Start(e))
                }
                Event::Empty(e) if is_local(&e, b"pPr") => {
                    self.write(Event::Start(e.clone()))?;
                    self.write_shading(&prefix)?;
                    self.write(Event::End(e.to_end()))
                }
                Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {
                    self.state = State::AwaitProps { prefix };
                    self.write(Event::Text(t))
                }
                other => {
                    self.write_properties(&prefix)?;
                    self.handle_plain(other)
                }
            },

            State::InProps {
                prefix,
                depth,
                inserted,
            } => match event {
                Event::Start(e) if depth == 0 && is_local(&e, b"shd") => {
                    self.state = State::SkipShading {
                        prefix,
                        depth: 0,
                        inserted,
                    };
                    Ok(())
                }
                Event::Empty(e) if depth == 0 && is_local(&e, b"shd") => {
                    self.state = State::InProps {
                        prefix,
                        depth,
                        inserted,
                    };
                    Ok(())
                }
                Event::Start(e) => {
                    let inserted = self.shade_before(&prefix, depth, inserted, &e)?;
                    self.state = State::InProps {
                        prefix,
                        depth: depth + 1,
                        inserted,
                    };
                    self.write(Event::Start(e))
                }
                Event::Empty(e) => {
                    let inserted = self.shade_before(&prefix, depth, inserted, &e)?;
                    self.state = State::InProps {
                        prefix,
                        depth,
                        inserted,
                    };
                    self.write(Event::Empty(e))
                }
                Event::End(e) if depth == 0 => {
                    if !inserted {
                        self.write_shading(&prefix)?;
                    }
                    self.write(Event::End(e))
                }
                Event::End(e) => {
                    self.state = State::InProps {
                        prefix,
                        depth: depth - 1,
                        inserted,
                    };
                    self.write(Event::End(e))
                }
                other => {
                    self.state = State::InProps {
                        prefix,
                        depth,
                        inserted,
                    };
                    self.write(other)
                }
            },

            State::SkipShading {
                prefix,
                depth,
                inserted,
            } => {
                self.state = match event {
                    Event::Start(_) => State::SkipShading {
                        prefix,
                        depth: depth + 1,
                        inserted,
                    },
                    Event::End(_) if depth == 0 => State::InProps {
                        prefix,
                        depth: 0,
                        inserted,
                    },
                    Event::End(_) => State::SkipShading {
                        prefix,
                        depth: depth - 1,
                        inserted,
                    },
                    _ => State::SkipShading {
                        prefix,
                        depth,
                        inserted,
                    },
                };
                Ok(())
            }
        }
    }

    fn handle_plain(&mut self, event: Event<'_>) -> quick_xml::Result<()> {
        match &event {
            Event::Start(e) if is_local(e, b"p") => {
                if self.p_depth == 0 && self.take_index() {
                    self.state = State::AwaitProps {
                        prefix: prefix_of(e),
                    };
                }
                self.p_depth += 1;
            }
            Event::End(e) if e.local_name().as_ref() == b"p" => {
                self.p_depth = self.p_depth.saturating_sub(1);
            }
            Event::Empty(e) if is_local(e, b"p") && self.p_depth == 0 => {
                if self.take_index() {
                    let prefix = prefix_of(e);
                    self.write(Event::Start(e.clone()))?;
                    self.write_properties(&prefix)?;
                    return self.write(Event::End(e.to_end()));
                }
            }
            _ => {}
        }
        self.write(event)
    }

    /// Claim the next paragraph index; true when that paragraph is flagged.
    fn take_index(&mut self) -> bool {
        let index = self.next_index;
        self.next_index += 1;
        let hit = self.flagged.contains(&index);
        if hit {
            self.highlighted += 1;
        }
        hit
    }

    fn shade_before(
        &mut self,
        prefix: &str,
        depth: usize,
        inserted: bool,
        child: &BytesStart<'_>,
    ) -> quick_xml::Result<bool> {
        if depth == 0 && !inserted && AFTER_SHADING.contains(&child.local_name().as_ref()) {
            self.write_shading(prefix)?;
            return Ok(true);
        }
        Ok(inserted)
    }

    fn write_shading(&mut self, prefix: &str) -> quick_xml::Result<()> {
        let mut shading = BytesStart::new(format!("{prefix}shd"));
        shading.push_attribute((format!("{prefix}val").as_str(), "clear"));
        shading.push_attribute((format!("{prefix}color").as_str(), "auto"));
        shading.push_attribute((format!("{prefix}fill").as_str(), self.fill));
        self.write(Event::Empty(shading))
    }

    fn write_properties(&mut self, prefix: &str) -> quick_xml::Result<()> {
        self.write(Event::Start(BytesStart::new(format!("{prefix}pPr"))))?;
        self.write_shading(prefix)?;
        self.write(Event::End(BytesEnd::new(format!("{prefix}pPr"))))
    }

    fn write(&mut self, event: Event<'_>) -> quick_xml::Result<()> {
        self.writer.write_event(event)
    }
}

fn is_local(element: &BytesStart<'_>, name: &[u8]) -> bool {
    element.local_name().as_ref() == name
}

/// Namespace prefix of an element including the colon ("w:"), or empty.
fn prefix_of(element: &BytesStart<'_>) -> String {
    match element.name().prefix() {
        Some(prefix) => format!("{}:", String::from_utf8_lossy(prefix.as_ref())),
        None => String::new(),
    }
}
