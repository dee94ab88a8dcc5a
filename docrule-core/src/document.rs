//! Read-only document model handed over by a provider.
//!
//! Measurements are kept exactly as the source format states them (strings in
//! native units). Turning them into centimeters and points is the job of
//! `units`, and a value that cannot be turned is simply "not defined here".

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stable structural index of a body paragraph: its position in a pre-order
/// walk over all body paragraphs, table cells and content controls included.
/// Two copies of the same document produce the same indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef(pub usize);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "¶{}", self.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub body: Vec<Block>,
    #[serde(default)]
    pub styles: StyleTable,
    #[serde(default)]
    pub numbering: NumberingTable,
    #[serde(default)]
    pub sections: Vec<SectionProperties>,
    #[serde(default)]
    pub page_parts: Vec<PagePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
}

/// Where a document came from, for re-opening and integrity checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Container(Container),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    TableOfContents,
    Other,
}

/// Content control (structured document tag) wrapping other blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub kind: ContainerKind,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(default)]
    pub props: ParagraphProps,
    /// Direct numbering. A removal (numId 0) overrides the style's numbering;
    /// `Resolver::numbering` gives the effective one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingRef>,
    #[serde(default)]
    pub runs: Vec<Run>,
    /// Field instruction keywords found in the paragraph ("TOC", "PAGE", ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    pub fn has_drawing(&self) -> bool {
        self.runs.iter().any(|r| r.has_drawing)
    }

    pub fn has_field(&self, keyword: &str) -> bool {
        self.fields.iter().any(|f| f.eq_ignore_ascii_case(keyword))
    }

    /// Runs that carry visible text; formatting of whitespace-only runs is
    /// not observable and is not checked.
    pub fn text_runs(&self) -> impl Iterator<Item = &Run> {
        self.runs.iter().filter(|r| !r.text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(default)]
    pub props: RunProps,
    #[serde(default)]
    pub has_drawing: bool,
}

/// Numbering metadata: which numbering instance and which zero-based level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRef {
    pub num_id: String,
    pub level: u8,
}

impl NumberingRef {
    /// numId 0 switches off numbering a style would otherwise supply.
    pub fn is_removal(&self) -> bool {
        self.num_id.trim() == "0"
    }
}

/// Raw paragraph properties in native units (twips, 240ths of a line).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_first_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_hanging: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing_line_rule: Option<String>,
}

impl ParagraphProps {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Raw run properties: font name, size in half-points, bold toggle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<String>,
}

impl RunProps {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    Numbering,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: StyleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<String>,
    #[serde(default)]
    pub paragraph: ParagraphProps,
    #[serde(default)]
    pub run: RunProps,
    /// Numbering every paragraph of this style carries ("List Number")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingRef>,
}

impl StyleDefinition {
    pub fn new(id: &str, kind: StyleKind) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            kind,
            based_on: None,
            paragraph: ParagraphProps::default(),
            run: RunProps::default(),
            numbering: None,
        }
    }
}

/// Style lookup plus document-wide defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleTable {
    #[serde(default)]
    pub styles: HashMap<String, StyleDefinition>,
    #[serde(default)]
    pub default_paragraph: ParagraphProps,
    #[serde(default)]
    pub default_run: RunProps,
    /// Paragraph style applied when a paragraph names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_paragraph_style: Option<String>,
}

impl StyleTable {
    pub fn get(&self, id: &str) -> Option<&StyleDefinition> {
        self.styles.get(id)
    }

    pub fn insert(&mut self, style: StyleDefinition) {
        self.styles.insert(style.id.clone(), style);
    }

    pub fn based_on(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|s| s.based_on.as_deref())
    }

    /// Style id followed by its based-on ancestors, stopping at the first
    /// unknown id or at the first id already visited.
    pub fn chain(&self, id: &str) -> Vec<&StyleDefinition> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(style_id) = current {
            if !visited.insert(style_id) {
                break;
            }
            let Some(style) = self.get(style_id) else {
                break;
            };
            chain.push(style);
            current = style.based_on.as_deref();
        }
        chain
    }

    /// The style id as written, plus its display name when it has one.
    pub fn names_for<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
        let mut names = vec![id];
        if let Some(name) = self.get(id).and_then(|s| s.name.as_deref()) {
            names.push(name);
        }
        names
    }
}

/// One level of a numbering definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumberingLevel {
    /// Number format ("decimal", "bullet", "lowerLetter", ...)
    #[serde(default)]
    pub format: String,
    /// Level text template ("%1.", "%1)", "•")
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub paragraph: ParagraphProps,
}

impl NumberingLevel {
    pub fn is_bullet(&self) -> bool {
        self.format == "bullet" || !self.text.contains('%')
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumberingTable {
    /// numId -> abstractNumId
    #[serde(default)]
    pub instances: HashMap<String, String>,
    /// abstractNumId -> level index -> level
    #[serde(default)]
    pub abstracts: HashMap<String, HashMap<u8, NumberingLevel>>,
}

impl NumberingTable {
    pub fn level(&self, numbering: &NumberingRef) -> Option<&NumberingLevel> {
        let abstract_id = self.instances.get(&numbering.num_id)?;
        self.abstracts.get(abstract_id)?.get(&numbering.level)
    }
}

/// Page setup of one document section, raw twips.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionProperties {
    pub margin_top: Option<String>,
    pub margin_bottom: Option<String>,
    pub margin_left: Option<String>,
    pub margin_right: Option<String>,
    pub page_width: Option<String>,
    pub page_height: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePartKind {
    Header,
    Footer,
}

/// A header or footer part and its paragraphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePart {
    pub name: String,
    pub kind: PagePartKind,
    pub paragraphs: Vec<Paragraph>,
}

/// A body paragraph seen through a pre-order walk, with the structural facts
/// the classifier needs about where it sits.
#[derive(Debug, Clone, Copy)]
pub struct FlatParagraph<'a> {
    pub node: NodeRef,
    pub paragraph: &'a Paragraph,
    pub in_table: bool,
    pub in_toc_container: bool,
    /// Nearest non-blank paragraph before a table in the same block list
    pub precedes_table: bool,
    /// Nearest non-blank paragraph after an image paragraph
    pub follows_image: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct WalkScope {
    in_table: bool,
    in_toc: bool,
}

impl Document {
    /// All body paragraphs in pre-order. `NodeRef` values are positions in this
    /// sequence.
    pub fn flatten(&self) -> Vec<FlatParagraph<'_>> {
        let mut out = Vec::new();
        flatten_blocks(&self.body, WalkScope::default(), &mut out);
        out
    }

    pub fn table_count(&self) -> usize {
        fn count(blocks: &[Block]) -> usize {
            blocks
                .iter()
                .map(|block| match block {
                    Block::Paragraph(_) => 0,
                    Block::Table(table) => {
                        1 + table
                            .rows
                            .iter()
                            .flat_map(|row| row.cells.iter())
                            .map(|cell| count(&cell.blocks))
                            .sum::<usize>()
                    }
                    Block::Container(container) => count(&container.blocks),
                })
                .sum()
        }
        count(&self.body)
    }
}

fn flatten_blocks<'a>(blocks: &'a [Block], scope: WalkScope, out: &mut Vec<FlatParagraph<'a>>) {
    let (caption_before_table, caption_after_image) = caption_candidates(blocks);

    for (index, block) in blocks.iter().enumerate() {
        match block {
            Block::Paragraph(paragraph) => out.push(FlatParagraph {
                node: NodeRef(out.len()),
                paragraph,
                in_table: scope.in_table,
                in_toc_container: scope.in_toc,
                precedes_table: caption_before_table.contains(&index),
                follows_image: caption_after_image.contains(&index),
            }),
            Block::Table(table) => {
                let inner = WalkScope {
                    in_table: true,
                    ..scope
                };
                for cell in table.rows.iter().flat_map(|row| row.cells.iter()) {
                    flatten_blocks(&cell.blocks, inner, out);
                }
            }
            Block::Container(container) => {
                let inner = WalkScope {
                    in_toc: scope.in_toc || container.kind == ContainerKind::TableOfContents,
                    ..scope
                };
                flatten_blocks(&container.blocks, inner, out);
            }
        }
    }
}

/// Block indices of table-caption candidates (nearest non-blank paragraph
/// before a table) and image-caption candidates (nearest non-blank paragraph
/// after a paragraph holding an image) within one block list.
fn caption_candidates(blocks: &[Block]) -> (HashSet<usize>, HashSet<usize>) {
    let mut before_table = HashSet::new();
    let mut after_image = HashSet::new();

    for (index, block) in blocks.iter().enumerate() {
        match block {
            Block::Table(_) => {
                let candidate = blocks[..index]
                    .iter()
                    .enumerate()
                    .rev()
                    .find(|(_, b)| !matches!(b, Block::Paragraph(p) if p.is_blank()));
                if let Some((i, Block::Paragraph(_))) = candidate {
                    before_table.insert(i);
                }
            }
            Block::Paragraph(paragraph) if paragraph.has_drawing() => {
                let candidate = blocks[index + 1..]
                    .iter()
                    .enumerate()
                    .find(|(_, b)| !matches!(b, Block::Paragraph(p) if p.is_blank()));
                if let Some((offset, Block::Paragraph(next))) = candidate {
                    if !next.has_drawing() {
                        after_image.insert(index + 1 + offset);
                    }
                }
            }
            _ => {}
        }
    }

    (before_table, after_image)
}
