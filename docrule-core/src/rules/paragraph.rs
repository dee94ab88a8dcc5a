//! Format checks shared by every paragraph context.

use super::engine::CheckContext;
use super::validators::{self, Verdict};
use crate::classifier::ClassifiedParagraph;
use crate::document::{Paragraph, Run};
use crate::ruleset::ParagraphRules;
use crate::types::{Attribute, CheckResult, CheckerKind, NotApplicable, Violation, ViolationKind};

/// Format-check a set of paragraphs that share one rule group, reporting
/// "not applicable" when the group is empty or there is nothing to check.
pub fn check_all<'p, 'd: 'p>(
    ctx: &CheckContext<'_>,
    checker: CheckerKind,
    rules: &ParagraphRules,
    items: impl IntoIterator<Item = &'p ClassifiedParagraph<'d>>,
    spacing_tolerance: f64,
    label: &str,
) -> CheckResult {
    if rules.is_empty() {
        return CheckResult::not_applicable(checker, NotApplicable::NoRequirements);
    }
    let mut checked = 0;
    let mut violations = Vec::new();
    for item in items {
        checked += 1;
        violations.extend(check_format(ctx, item, rules, spacing_tolerance, label));
    }
    if checked == 0 {
        return CheckResult::not_applicable(checker, NotApplicable::NoInstances);
    }
    CheckResult::checked(checker, checked, violations)
}

/// Check one paragraph against a rule group. Run-level attributes (font,
/// size, bold) are checked on every visible run but reported once per
/// paragraph: an undefined run wins over a mismatching one.
pub fn check_format(
    ctx: &CheckContext<'_>,
    item: &ClassifiedParagraph<'_>,
    rules: &ParagraphRules,
    spacing_tolerance: f64,
    label: &str,
) -> Vec<Violation> {
    let tolerances = &ctx.config.tolerances;
    let resolver = &ctx.resolver;
    let paragraph = item.paragraph;
    let mut verdicts: Vec<(Attribute, Verdict)> = Vec::new();

    if let Some(expected) = &rules.font_name {
        verdicts.push((
            Attribute::FontName,
            worst_run_verdict(paragraph, |run| {
                validators::font_name(expected, &resolver.font_name(paragraph, run))
            }),
        ));
    }
    if let Some(expected) = rules.font_size {
        verdicts.push((
            Attribute::FontSize,
            worst_run_verdict(paragraph, |run| {
                validators::font_size(
                    expected,
                    &resolver.font_size(paragraph, run),
                    tolerances.font_size_pt,
                )
            }),
        ));
    }
    if let Some(expected) = rules.bold {
        verdicts.push((
            Attribute::Bold,
            worst_run_verdict(paragraph, |run| {
                validators::bold(expected, &resolver.bold(paragraph, run))
            }),
        ));
    }
    if let Some(expected) = rules.alignment {
        verdicts.push((
            Attribute::Alignment,
            validators::alignment(expected, &resolver.alignment(paragraph)),
        ));
    }
    if let Some(expected) = rules.indent_left_cm {
        verdicts.push((
            Attribute::IndentLeft,
            validators::indent(
                "left indent",
                expected,
                &resolver.indent_left(paragraph),
                tolerances.indent_cm,
            ),
        ));
    }
    if let Some(expected) = rules.indent_right_cm {
        verdicts.push((
            Attribute::IndentRight,
            validators::indent(
                "right indent",
                expected,
                &resolver.indent_right(paragraph),
                tolerances.indent_cm,
            ),
        ));
    }
    if let Some(expected) = rules.first_line {
        verdicts.push((
            Attribute::FirstLine,
            validators::first_line(expected, &resolver.first_line(paragraph), tolerances.indent_cm),
        ));
    }
    if let Some(expected) = rules.line_spacing {
        verdicts.push((
            Attribute::LineSpacing,
            validators::line_spacing(expected, &resolver.line_spacing(paragraph), tolerances),
        ));
    }
    if let Some(expected) = rules.space_before_pt {
        verdicts.push((
            Attribute::SpaceBefore,
            validators::spacing(
                "spacing before",
                expected,
                &resolver.space_before(paragraph),
                spacing_tolerance,
            ),
        ));
    }
    if let Some(expected) = rules.space_after_pt {
        verdicts.push((
            Attribute::SpaceAfter,
            validators::spacing(
                "spacing after",
                expected,
                &resolver.space_after(paragraph),
                spacing_tolerance,
            ),
        ));
    }

    verdicts
        .into_iter()
        .filter_map(|(attribute, verdict)| violation_for(ctx, item, attribute, verdict, label))
        .collect()
}

/// Turn a verdict into a located violation; `Ok` yields nothing.
pub fn violation_for(
    ctx: &CheckContext<'_>,
    item: &ClassifiedParagraph<'_>,
    attribute: Attribute,
    verdict: Verdict,
    label: &str,
) -> Option<Violation> {
    let (kind, message) = match verdict {
        Verdict::Ok => return None,
        Verdict::Mismatch(message) => (ViolationKind::Mismatch, message),
        Verdict::Undefined(message) => (ViolationKind::Undefined, message),
    };
    let excerpt = excerpt(&item.paragraph.text(), ctx.config.report.excerpt_chars);
    Some(Violation::new(kind, attribute, label, message).at(item.node, excerpt))
}

fn worst_run_verdict(paragraph: &Paragraph, check: impl Fn(&Run) -> Verdict) -> Verdict {
    let mut first_mismatch = None;
    for run in paragraph.text_runs() {
        match check(run) {
            Verdict::Ok => {}
            undefined @ Verdict::Undefined(_) => return undefined,
            mismatch @ Verdict::Mismatch(_) => {
                first_mismatch.get_or_insert(mismatch);
            }
        }
    }
    first_mismatch.unwrap_or(Verdict::Ok)
}

/// Whitespace-collapsed text cut to `max_chars` characters with a trailing
/// ellipsis. `None` for blank text.
pub fn excerpt(text: &str, max_chars: usize) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    if collapsed.chars().count() <= max_chars {
        return Some(collapsed);
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    Some(format!("{}…", cut.trim_end()))
}
