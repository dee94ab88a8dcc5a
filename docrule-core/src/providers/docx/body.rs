//! `word/document.xml` and header/footer parts → body blocks.
//!
//! Paragraph counting follows one rule everywhere: a `w:p` counts when it is
//! not nested in another `w:p`. Run children are read selectively, so text-box
//! paragraphs inside drawings never reach the model; unknown block-level
//! wrappers (`customXml`, `ins`, alternate content) are walked through so the
//! sequence of counted paragraphs matches the package order.

use super::super::xml_tree::Element;
use crate::document::{
    Block, Container, ContainerKind, NumberingRef, Paragraph, ParagraphProps, Run, RunProps,
    SectionProperties, Table, TableCell, TableRow,
};

const TOC_GALLERY: &str = "table of contents";

/// Elements that never hold runs; skipped while collecting a paragraph's runs.
const NON_RUN_CONTAINERS: &[&str] = &["pPr", "rPr", "del", "moveFrom", "sdtPr", "sdtEndPr"];

pub(super) fn parse_blocks(parent: &Element, sections: &mut Vec<SectionProperties>) -> Vec<Block> {
    let mut blocks = Vec::new();
    for child in parent.elements() {
        match child.name.as_str() {
            "p" => {
                if let Some(sect) = child.child("pPr").and_then(|ppr| ppr.child("sectPr")) {
                    sections.push(parse_section(sect));
                }
                blocks.push(Block::Paragraph(parse_paragraph(child)));
            }
            "tbl" => blocks.push(Block::Table(parse_table(child, sections))),
            "sdt" => blocks.push(Block::Container(parse_container(child, sections))),
            "sectPr" => sections.push(parse_section(child)),
            _ => blocks.extend(parse_blocks(child, sections)),
        }
    }
    blocks
}

fn parse_table(tbl: &Element, sections: &mut Vec<SectionProperties>) -> Table {
    let mut table = Table::default();
    for tr in tbl.find_shallow("tr", &["tbl", "p"]) {
        let mut row = TableRow::default();
        for tc in tr.find_shallow("tc", &["tbl", "p"]) {
            row.cells.push(TableCell {
                blocks: parse_blocks(tc, sections),
            });
        }
        table.rows.push(row);
    }
    table
}

fn parse_container(sdt: &Element, sections: &mut Vec<SectionProperties>) -> Container {
    let blocks = sdt
        .child("sdtContent")
        .map(|content| parse_blocks(content, sections))
        .unwrap_or_default();

    let gallery_is_toc = sdt
        .child("sdtPr")
        .and_then(|pr| pr.child("docPartObj"))
        .and_then(|obj| obj.child_val("docPartGallery"))
        .map(|gallery| gallery.to_lowercase().contains(TOC_GALLERY))
        .unwrap_or(false);

    let kind = if gallery_is_toc || blocks_have_field(&blocks, "TOC") {
        ContainerKind::TableOfContents
    } else {
        ContainerKind::Other
    };
    Container { kind, blocks }
}

fn blocks_have_field(blocks: &[Block], keyword: &str) -> bool {
    blocks.iter().any(|block| match block {
        Block::Paragraph(paragraph) => paragraph.has_field(keyword),
        Block::Table(table) => table
            .rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .any(|cell| blocks_have_field(&cell.blocks, keyword)),
        Block::Container(container) => blocks_have_field(&container.blocks, keyword),
    })
}

/// Every paragraph in `blocks`, pre-order.
pub(super) fn paragraphs(blocks: Vec<Block>) -> Vec<Paragraph> {
    let mut out = Vec::new();
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => out.push(paragraph),
            Block::Table(table) => {
                for cell in table.rows.into_iter().flat_map(|row| row.cells) {
                    out.extend(paragraphs(cell.blocks));
                }
            }
            Block::Container(container) => out.extend(paragraphs(container.blocks)),
        }
    }
    out
}

fn parse_paragraph(p: &Element) -> Paragraph {
    let mut paragraph = Paragraph::default();
    if let Some(ppr) = p.child("pPr") {
        paragraph.style_id = ppr.child_val("pStyle").map(str::to_string);
        paragraph.props = paragraph_props(ppr);
        paragraph.numbering = ppr.child("numPr").and_then(numbering_ref);
    }
    collect_runs(p, &mut paragraph);
    paragraph
}

fn collect_runs(container: &Element, paragraph: &mut Paragraph) {
    for child in container.elements() {
        match child.name.as_str() {
            "r" => {
                let run = parse_run(child, &mut paragraph.fields);
                paragraph.runs.push(run);
            }
            "fldSimple" => {
                if let Some(keyword) = child.attr("instr").and_then(field_keyword) {
                    paragraph.fields.push(keyword);
                }
                collect_runs(child, paragraph);
            }
            name if NON_RUN_CONTAINERS.contains(&name) => {}
            _ => collect_runs(child, paragraph),
        }
    }
}

fn parse_run(r: &Element, fields: &mut Vec<String>) -> Run {
    let mut run = Run::default();
    for child in r.elements() {
        match child.name.as_str() {
            "rPr" => {
                run.style_id = child.child_val("rStyle").map(str::to_string);
                run.props = run_props(child);
            }
            "t" => run.text.push_str(&child.text()),
            "tab" | "ptab" => run.text.push('\t'),
            "br" | "cr" => run.text.push('\n'),
            "noBreakHyphen" => run.text.push('-'),
            "drawing" | "pict" | "object" => run.has_drawing = true,
            "AlternateContent" => {
                if child.contains("drawing") || child.contains("pict") {
                    run.has_drawing = true;
                }
            }
            "instrText" => {
                if let Some(keyword) = field_keyword(&child.text()) {
                    fields.push(keyword);
                }
            }
            _ => {}
        }
    }
    run
}

/// First word of a field instruction (" TOC \o "1-3" " → "TOC"). Switch-only
/// continuation fragments carry no keyword.
fn field_keyword(instruction: &str) -> Option<String> {
    let word = instruction.split_whitespace().next()?;
    word.chars()
        .next()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|_| word.to_ascii_uppercase())
}

/// `w:numPr` on a paragraph or a paragraph style. numId 0 is kept: it removes
/// numbering the style would otherwise supply.
pub(super) fn numbering_ref(num_pr: &Element) -> Option<NumberingRef> {
    let num_id = num_pr.child_val("numId")?;
    let level = num_pr
        .child_val("ilvl")
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(0);
    Some(NumberingRef {
        num_id: num_id.to_string(),
        level,
    })
}

pub(super) fn paragraph_props(ppr: &Element) -> ParagraphProps {
    let mut props = ParagraphProps {
        justification: ppr.child_val("jc").map(str::to_string),
        ..ParagraphProps::default()
    };
    if let Some(ind) = ppr.child("ind") {
        props.indent_left = ind.attr("left").or_else(|| ind.attr("start")).map(str::to_string);
        props.indent_right = ind.attr("right").or_else(|| ind.attr("end")).map(str::to_string);
        props.indent_first_line = ind.attr("firstLine").map(str::to_string);
        props.indent_hanging = ind.attr("hanging").map(str::to_string);
    }
    if let Some(spacing) = ppr.child("spacing") {
        props.spacing_before = spacing.attr("before").map(str::to_string);
        props.spacing_after = spacing.attr("after").map(str::to_string);
        props.spacing_line = spacing.attr("line").map(str::to_string);
        props.spacing_line_rule = spacing.attr("lineRule").map(str::to_string);
    }
    props
}

pub(super) fn run_props(rpr: &Element) -> RunProps {
    let font = rpr.child("rFonts").and_then(|fonts| {
        fonts
            .attr("ascii")
            .or_else(|| fonts.attr("hAnsi"))
            .map(str::to_string)
    });
    RunProps {
        font,
        size: rpr.child_val("sz").map(str::to_string),
        // <w:b/> with no value means on
        bold: rpr
            .child("b")
            .map(|b| b.attr("val").unwrap_or_default().to_string()),
    }
}

fn parse_section(sect: &Element) -> SectionProperties {
    let margins = sect.child("pgMar");
    let size = sect.child("pgSz");
    let margin = |name: &str| margins.and_then(|m| m.attr(name)).map(str::to_string);
    SectionProperties {
        margin_top: margin("top"),
        margin_bottom: margin("bottom"),
        margin_left: margin("left"),
        margin_right: margin("right"),
        page_width: size.and_then(|s| s.attr("w")).map(str::to_string),
        page_height: size.and_then(|s| s.attr("h")).map(str::to_string),
    }
}
