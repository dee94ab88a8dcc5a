//! Package-level tests: a real .docx on disk goes through provider, checker
//! engine and annotator.

use docrule_core::ruleset::Alignment;
use docrule_core::{
    Annotator, CheckConfig, DocruleError, DocumentChecker, NodeRef, Ruleset, RulesetStore,
};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;

// ============================================================================
// Package fixtures
// ============================================================================

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/><w:sz w:val="28"/></w:rPr></w:rPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
</w:styles>"#;

/// Four top-level paragraphs; the second and fourth are left aligned.
const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:jc w:val="both"/></w:pPr><w:r><w:t>First paragraph is justified.</w:t></w:r></w:p>
    <w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r><w:t>Second paragraph is not.</w:t></w:r></w:p>
    <w:p><w:pPr><w:jc w:val="both"/></w:pPr><w:r><w:t>Third paragraph is justified again.</w:t></w:r></w:p>
    <w:p><w:pPr><w:shd w:val="clear" w:color="auto" w:fill="00FF00"/><w:jc w:val="left"/></w:pPr><w:r><w:t>Fourth has its own shading.</w:t></w:r></w:p>
    <w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:bottom="1134" w:left="1701" w:right="850"/></w:sectPr>
  </w:body>
</w:document>"#;

fn write_package(path: &Path, document: &str) {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("word/styles.xml", STYLES),
        ("word/document.xml", document),
    ] {
        writer.start_file(name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    let bytes = writer.finish().unwrap().into_inner();
    fs::write(path, bytes).unwrap();
}

fn read_part(path: &Path, part: &str) -> String {
    let bytes = fs::read(path).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name(part)
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

fn checker_with(ruleset: Ruleset) -> DocumentChecker {
    let mut store = RulesetStore::default();
    store.upsert(ruleset);
    DocumentChecker::new(store, CheckConfig::default())
}

fn justified_ruleset() -> Ruleset {
    let mut ruleset = Ruleset::new("justified");
    ruleset.plain_text.font_name = Some("Arial".to_string());
    ruleset.plain_text.font_size = Some(14.0);
    ruleset.plain_text.alignment = Some(Alignment::Justify);
    ruleset
}

fn fixture(dir: &Path) -> PathBuf {
    let input = dir.join("thesis.docx");
    write_package(&input, DOCUMENT);
    input
}

// ============================================================================
// Checking
// ============================================================================

#[test]
fn docx_on_disk_is_checked_through_the_cascade() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixture(dir.path());

    let mut checker = checker_with(justified_ruleset());
    let report = checker.check_file(&input, "justified").unwrap();

    // Font and size come from docDefaults; only alignment fails
    assert!(!report.is_valid);
    assert_eq!(report.flagged_nodes(), vec![NodeRef(1), NodeRef(3)]);
    assert_eq!(report.violation_count(), 2);

    let source = report.source.as_ref().unwrap();
    assert_eq!(Path::new(&source.path), input.as_path());
    assert_eq!(source.sha256.len(), 64);
}

#[test]
fn compliant_docx_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clean.docx");
    write_package(
        &input,
        &DOCUMENT.replace(r#"w:val="left""#, r#"w:val="both""#),
    );

    let mut checker = checker_with(justified_ruleset());
    let report = checker.check_file(&input, "justified").unwrap();
    assert!(report.is_valid);
    assert!(report.flagged_nodes().is_empty());
}

// ============================================================================
// Annotation
// ============================================================================

#[test]
fn annotated_copy_shades_exactly_the_flagged_paragraphs() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixture(dir.path());
    let target = dir.path().join("thesis.annotated.docx");

    let mut checker = checker_with(justified_ruleset());
    let report = checker.check_file(&input, "justified").unwrap();
    let summary = Annotator::default().annotate(&report, &target).unwrap();

    assert_eq!(summary.flagged, 2);
    assert_eq!(summary.highlighted, 2);

    let original = read_part(&input, "word/document.xml");
    let annotated = read_part(&target, "word/document.xml");
    assert_eq!(
        annotated.matches("<w:p>").count(),
        original.matches("<w:p>").count()
    );
    // The fourth paragraph's own shading is replaced, not duplicated
    assert_eq!(annotated.matches("<w:shd ").count(), 2);
    assert_eq!(annotated.matches(r#"w:fill="FFFF00""#).count(), 2);
    assert!(!annotated.contains("00FF00"));

    // Other parts are carried over unchanged
    assert_eq!(read_part(&target, "word/styles.xml"), STYLES);

    // The source is untouched, and the copy still checks the same way
    assert_eq!(original, DOCUMENT);
    let again = checker.check_file(&target, "justified").unwrap();
    assert_eq!(again.flagged_nodes(), report.flagged_nodes());
}

#[test]
fn changed_source_is_refused_and_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixture(dir.path());
    let target = dir.path().join("out.docx");

    let mut checker = checker_with(justified_ruleset());
    let report = checker.check_file(&input, "justified").unwrap();

    write_package(&input, &DOCUMENT.replace("Second", "Edited"));

    let err = Annotator::default().annotate(&report, &target).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DocruleError>(),
        Some(DocruleError::SourceChanged { .. })
    ));
    assert!(!target.exists());
}

#[test]
fn annotating_in_place_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixture(dir.path());

    let mut checker = checker_with(justified_ruleset());
    let report = checker.check_file(&input, "justified").unwrap();

    assert!(Annotator::default().annotate(&report, &input).is_err());
    assert_eq!(read_part(&input, "word/document.xml"), DOCUMENT);
}
