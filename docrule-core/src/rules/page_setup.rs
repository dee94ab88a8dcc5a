use super::engine::{CheckContext, Checker};
use super::validators::{self, Verdict};
use crate::cascade::{Resolved, SourceLevel};
use crate::document::{PagePart, PagePartKind, Paragraph, SectionProperties};
use crate::ruleset::{PagePosition, PageSetupRules};
use crate::types::{Attribute, CheckResult, CheckerKind, NotApplicable, Violation, ViolationKind};
use crate::units;
use anyhow::Result;

const CONTEXT: &str = "page setup";

/// Section margins and page numbering (presence, header/footer position and
/// alignment of the paragraph holding the page-number field).
pub struct PageSetupChecker;

impl Checker for PageSetupChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::PageSetup
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let rules = &ctx.ruleset.page_setup;
        if rules.is_empty() {
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoRequirements,
            ));
        }

        let mut violations = Vec::new();
        let mut checked = 0;

        if rules.has_margin_requirements() {
            if ctx.document.sections.is_empty() {
                violations.push(Violation::new(
                    ViolationKind::Undefined,
                    Attribute::Margin,
                    CONTEXT,
                    "could not determine page margins: document has no section properties",
                ));
            }
            for (index, section) in ctx.document.sections.iter().enumerate() {
                checked += 1;
                violations.extend(check_margins(ctx, rules, index, section));
            }
        }

        if rules.has_numbering_requirements() {
            checked += ctx.document.page_parts.len();
            violations.extend(check_page_numbers(ctx, rules));
        }

        Ok(CheckResult::checked(self.kind(), checked, violations))
    }
}

fn check_margins(
    ctx: &CheckContext<'_>,
    rules: &PageSetupRules,
    index: usize,
    section: &SectionProperties,
) -> Vec<Violation> {
    let tolerance = ctx.config.tolerances.margin_cm;
    let margins = [
        ("top margin", rules.margin_top_cm, &section.margin_top),
        ("bottom margin", rules.margin_bottom_cm, &section.margin_bottom),
        ("left margin", rules.margin_left_cm, &section.margin_left),
        ("right margin", rules.margin_right_cm, &section.margin_right),
    ];

    let mut violations = Vec::new();
    for (label, expected, raw) in margins {
        let Some(expected) = expected else {
            continue;
        };
        // Margins have no cascade; a missing or malformed value is undefined.
        let actual = match raw.as_deref().and_then(units::length_cm) {
            Some(value) => Resolved::Defined {
                value,
                source: SourceLevel::Explicit,
            },
            None => Resolved::Undefined { fallback: 0.0 },
        };
        let (kind, message) = match validators::indent(label, expected, &actual, tolerance) {
            Verdict::Ok => continue,
            Verdict::Mismatch(message) => (ViolationKind::Mismatch, message),
            Verdict::Undefined(message) => (ViolationKind::Undefined, message),
        };
        violations.push(Violation::new(
            kind,
            Attribute::Margin,
            CONTEXT,
            format!("section {}: {message}", index + 1),
        ));
    }
    violations
}

fn check_page_numbers(ctx: &CheckContext<'_>, rules: &PageSetupRules) -> Vec<Violation> {
    let numbered: Vec<(&PagePart, &Paragraph)> = ctx
        .document
        .page_parts
        .iter()
        .flat_map(|part| part.paragraphs.iter().map(move |p| (part, p)))
        .filter(|(_, paragraph)| paragraph.has_field("PAGE"))
        .collect();

    let mut violations = Vec::new();
    let wants_numbers = rules.page_numbers.unwrap_or(
        rules.page_number_position.is_some() || rules.page_number_alignment.is_some(),
    );

    if numbered.is_empty() {
        if wants_numbers {
            violations.push(Violation::new(
                ViolationKind::StructuralAbsence,
                Attribute::PageNumbers,
                CONTEXT,
                "document has no page numbers",
            ));
        }
        return violations;
    }

    if !wants_numbers {
        violations.push(Violation::new(
            ViolationKind::Mismatch,
            Attribute::PageNumbers,
            CONTEXT,
            "page numbers are present, expected none",
        ));
        return violations;
    }

    if let Some(position) = rules.page_number_position {
        let wanted = match position {
            PagePosition::Header => PagePartKind::Header,
            PagePosition::Footer => PagePartKind::Footer,
        };
        if !numbered.iter().any(|(part, _)| part.kind == wanted) {
            let found = match numbered[0].0.kind {
                PagePartKind::Header => PagePosition::Header,
                PagePartKind::Footer => PagePosition::Footer,
            };
            violations.push(Violation::new(
                ViolationKind::Mismatch,
                Attribute::PageNumbers,
                CONTEXT,
                format!("page numbers in {found}, expected {position}"),
            ));
        }
    }

    if let Some(expected) = rules.page_number_alignment {
        for (part, paragraph) in &numbered {
            let (kind, message) =
                match validators::alignment(expected, &ctx.resolver.alignment(paragraph)) {
                    Verdict::Ok => continue,
                    Verdict::Mismatch(message) => (ViolationKind::Mismatch, message),
                    Verdict::Undefined(message) => (ViolationKind::Undefined, message),
                };
            violations.push(Violation::new(
                kind,
                Attribute::PageNumbers,
                CONTEXT,
                format!("page number in {}: {message}", part.name),
            ));
        }
    }

    violations
}
