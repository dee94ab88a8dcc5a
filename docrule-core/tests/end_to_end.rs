//! End-to-end checks on documents built in code: model → classify → check →
//! aggregate, through the headless `check_document` entry point.

use docrule_core::cascade::Resolver;
use docrule_core::classifier::{Classifier, Context};
use docrule_core::document::{
    Block, NumberingLevel, NumberingRef, Paragraph, Run, RunProps, StyleDefinition, StyleKind,
    Table, TableCell, TableRow,
};
use docrule_core::ruleset::{Alignment, LineSpacing, MarkerSuffix};
use docrule_core::{
    check_document, Attribute, CheckConfig, CheckStatus, CheckerKind, Document, NodeRef,
    NotApplicable, Ruleset, ViolationKind,
};
use std::collections::HashMap;

// ============================================================================
// Fixture helpers
// ============================================================================

fn body_paragraph(text: &str, font: &str, half_points: &str, jc: &str, line: &str) -> Paragraph {
    let mut paragraph = Paragraph {
        runs: vec![Run {
            text: text.to_string(),
            props: RunProps {
                font: Some(font.to_string()),
                size: Some(half_points.to_string()),
                bold: None,
            },
            ..Run::default()
        }],
        ..Paragraph::default()
    };
    paragraph.props.justification = Some(jc.to_string());
    paragraph.props.spacing_line = Some(line.to_string());
    paragraph.props.spacing_line_rule = Some("auto".to_string());
    paragraph
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph {
        runs: vec![Run {
            text: text.to_string(),
            ..Run::default()
        }],
        ..Paragraph::default()
    }
}

fn document(blocks: Vec<Block>) -> Document {
    Document {
        body: blocks,
        ..Document::default()
    }
}

fn one_cell_table() -> Block {
    Block::Table(Table {
        rows: vec![TableRow {
            cells: vec![TableCell {
                blocks: vec![Block::Paragraph(text_paragraph("42"))],
            }],
        }],
    })
}

/// Arial 14pt, justified, 1.5 lines
fn arial_ruleset() -> Ruleset {
    let mut ruleset = Ruleset::new("arial-14");
    ruleset.plain_text.font_name = Some("Arial".to_string());
    ruleset.plain_text.font_size = Some(14.0);
    ruleset.plain_text.alignment = Some(Alignment::Justify);
    ruleset.plain_text.line_spacing = Some(LineSpacing::Multiplier(1.5));
    ruleset
}

// ============================================================================
// Plain text
// ============================================================================

#[test]
fn mismatching_paragraph_yields_one_violation_per_attribute() {
    // Times New Roman 12pt, left aligned, 1.15 lines (276/240)
    let doc = document(vec![Block::Paragraph(body_paragraph(
        "The quick brown fox jumps over the lazy dog.",
        "Times New Roman",
        "24",
        "left",
        "276",
    ))]);

    let report = check_document(&doc, &arial_ruleset()).unwrap();

    assert!(!report.is_valid);
    assert_eq!(report.violation_count(), 4);
    let mut attributes: Vec<Attribute> = report.violations().map(|v| v.attribute).collect();
    attributes.sort_by_key(|a| format!("{a:?}"));
    assert_eq!(
        attributes,
        vec![
            Attribute::Alignment,
            Attribute::FontName,
            Attribute::FontSize,
            Attribute::LineSpacing,
        ]
    );
    assert!(report
        .violations()
        .all(|v| v.kind == ViolationKind::Mismatch && v.node == Some(NodeRef(0))));
}

#[test]
fn exactly_matching_paragraph_is_valid() {
    let doc = document(vec![Block::Paragraph(body_paragraph(
        "The quick brown fox jumps over the lazy dog.",
        "Arial",
        "28",
        "both",
        "360",
    ))]);

    let report = check_document(&doc, &arial_ruleset()).unwrap();

    assert!(report.is_valid);
    assert_eq!(report.violation_count(), 0);
    assert_eq!(
        report.result(CheckerKind::PlainText).unwrap().status,
        CheckStatus::Checked { nodes: 1 }
    );
}

#[test]
fn values_inherited_through_style_chain_comply() {
    // Body -> Text -> Base, with every requirement defined only on Base
    let mut doc = document(vec![Block::Paragraph(Paragraph {
        style_id: Some("Body".to_string()),
        ..text_paragraph("Inherited formatting all the way down.")
    })]);
    let mut base = StyleDefinition::new("Base", StyleKind::Paragraph);
    base.run.font = Some("Arial".to_string());
    base.run.size = Some("28".to_string());
    base.paragraph.justification = Some("both".to_string());
    base.paragraph.spacing_line = Some("360".to_string());
    let mut text = StyleDefinition::new("Text", StyleKind::Paragraph);
    text.based_on = Some("Base".to_string());
    let mut body = StyleDefinition::new("Body", StyleKind::Paragraph);
    body.based_on = Some("Text".to_string());
    for style in [base, text, body] {
        doc.styles.insert(style);
    }
    // A document default that would fail, to prove the chain wins
    doc.styles.default_run.font = Some("Courier New".to_string());

    let report = check_document(&doc, &arial_ruleset()).unwrap();
    assert!(report.is_valid, "unexpected violations: {:?}", report.results);
}

#[test]
fn nothing_defined_anywhere_is_undefined_not_fallback() {
    // The fallback font is configured to the required one; it still must not
    // count as resolved.
    let mut config = CheckConfig::default();
    config.fallbacks.font_name = "Arial".to_string();
    let mut ruleset = Ruleset::new("font-only");
    ruleset.plain_text.font_name = Some("Arial".to_string());

    let doc = document(vec![Block::Paragraph(text_paragraph("No formatting at all."))]);
    let report = docrule_core::check_document_with_config(&doc, &ruleset, &config).unwrap();

    assert!(!report.is_valid);
    let violations: Vec<_> = report.violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::Undefined);
    assert_eq!(violations[0].attribute, Attribute::FontName);
}

// ============================================================================
// Applicability
// ============================================================================

#[test]
fn not_applicable_is_distinct_from_checked_clean() {
    let doc = document(vec![Block::Paragraph(body_paragraph(
        "Body",
        "Arial",
        "28",
        "both",
        "360",
    ))]);
    let mut ruleset = arial_ruleset();
    ruleset.table_text.font_size = Some(10.0);

    let report = check_document(&doc, &ruleset).unwrap();

    let plain = report.result(CheckerKind::PlainText).unwrap();
    assert_eq!(plain.status, CheckStatus::Checked { nodes: 1 });
    assert!(plain.violations.is_empty());

    // Requirements but no tables in the document
    let tables = report.result(CheckerKind::TableText).unwrap();
    assert!(!tables.was_executed());
    assert!(tables.is_valid());

    // No requirements at all
    let lists = report.result(CheckerKind::Lists).unwrap();
    assert!(!lists.was_executed());
    assert!(report.is_valid);
}

#[test]
fn lists_only_at_unconfigured_levels_are_not_applicable() {
    let mut ruleset = Ruleset::new("deep-lists");
    ruleset.lists.levels.entry(3).or_default().format.indent_left_cm = Some(3.75);

    let doc = document(vec![Block::Paragraph(text_paragraph("1. first item"))]);
    let report = check_document(&doc, &ruleset).unwrap();

    let lists = report.result(CheckerKind::Lists).unwrap();
    assert_eq!(
        lists.status,
        CheckStatus::NotApplicable {
            reason: NotApplicable::NoInstances
        }
    );
    assert!(!lists.was_executed());
}

// ============================================================================
// Lists
// ============================================================================

fn numbered(text: &str, num_id: &str) -> Block {
    Block::Paragraph(Paragraph {
        numbering: Some(NumberingRef {
            num_id: num_id.to_string(),
            level: 0,
        }),
        ..text_paragraph(text)
    })
}

#[test]
fn missing_numbering_definition_is_undefined_but_bullets_are_exempt() {
    let mut ruleset = Ruleset::new("suffixes");
    ruleset.lists.levels.entry(1).or_default().suffix = Some(MarkerSuffix::Dot);

    let mut doc = document(vec![
        numbered("points at a numbering instance that does not exist", "9"),
        numbered("bulleted item", "4"),
    ]);
    doc.numbering.instances.insert("4".to_string(), "1".to_string());
    let mut levels = HashMap::new();
    levels.insert(
        0,
        NumberingLevel {
            format: "bullet".to_string(),
            text: "•".to_string(),
            ..NumberingLevel::default()
        },
    );
    doc.numbering.abstracts.insert("1".to_string(), levels);

    let report = check_document(&doc, &ruleset).unwrap();

    let lists = report.result(CheckerKind::Lists).unwrap();
    assert_eq!(lists.status, CheckStatus::Checked { nodes: 2 });
    assert_eq!(lists.violations.len(), 1);
    let violation = &lists.violations[0];
    assert_eq!(violation.kind, ViolationKind::Undefined);
    assert_eq!(violation.attribute, Attribute::NumberingFormat);
    assert_eq!(violation.node, Some(NodeRef(0)));
}

// ============================================================================
// Captions
// ============================================================================

fn caption_ruleset() -> Ruleset {
    let mut ruleset = Ruleset::new("captions");
    ruleset.table_caption.label = Some("Table".to_string());
    ruleset.table_caption.check_format = Some(true);
    ruleset
}

#[test]
fn well_formed_table_caption_passes() {
    let doc = document(vec![
        Block::Paragraph(text_paragraph("Table 3 - Revenue by quarter")),
        one_cell_table(),
    ]);
    let report = check_document(&doc, &caption_ruleset()).unwrap();
    let captions = report.result(CheckerKind::TableCaptions).unwrap();
    assert_eq!(captions.status, CheckStatus::Checked { nodes: 1 });
    assert!(captions.violations.is_empty());
}

#[test]
fn caption_without_number_is_one_format_violation() {
    let doc = document(vec![
        Block::Paragraph(text_paragraph("Table – Revenue")),
        one_cell_table(),
    ]);
    let report = check_document(&doc, &caption_ruleset()).unwrap();
    let violations: Vec<_> = report.violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].attribute, Attribute::CaptionFormat);
    assert_eq!(violations[0].node, Some(NodeRef(0)));
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn list_level_is_inferred_from_indent() {
    let mut ruleset = Ruleset::new("lists");
    ruleset.lists.levels.entry(1).or_default().format.indent_left_cm = Some(1.25);
    ruleset.lists.levels.entry(2).or_default().format.indent_left_cm = Some(2.5);

    let mut item = text_paragraph("• second level item");
    // 2.5cm in twips
    item.props.indent_left = Some("1417".to_string());
    let doc = document(vec![Block::Paragraph(item)]);

    let config = CheckConfig::default();
    let resolver = Resolver::new(&doc.styles, &doc.numbering, &config.fallbacks);
    let map = Classifier::new(&config.classifier, &ruleset)
        .unwrap()
        .classify(&doc, &resolver);

    assert_eq!(map.paragraphs[0].context, Context::ListItem { level: 2 });
}

#[test]
fn violations_point_at_preorder_positions() {
    let mut ruleset = Ruleset::new("sizes");
    ruleset.plain_text.font_size = Some(14.0);
    ruleset.table_text.font_size = Some(10.0);

    let small = |text: &str| {
        let mut p = text_paragraph(text);
        p.runs[0].props.size = Some("20".to_string());
        p
    };
    let doc = document(vec![
        Block::Paragraph(small("first body paragraph is too small")),
        Block::Table(Table {
            rows: vec![TableRow {
                cells: vec![TableCell {
                    blocks: vec![Block::Paragraph(small("cell text at 10pt"))],
                }],
            }],
        }),
        Block::Paragraph(small("last body paragraph is too small")),
    ]);

    let report = check_document(&doc, &ruleset).unwrap();
    // The first paragraph precedes the table and is its caption candidate
    assert_eq!(report.flagged_nodes(), vec![NodeRef(2)]);
    assert!(report.result(CheckerKind::TableText).unwrap().violations.is_empty());
}
