use super::engine::{CheckContext, Checker};
use super::paragraph;
use crate::classifier::{normalize_title, Context};
use crate::types::{Attribute, CheckResult, CheckerKind, NotApplicable, Violation, ViolationKind};
use anyhow::Result;
use std::collections::HashSet;

/// Top-level headings, plus presence of every required section.
pub struct HeadingChecker;

impl Checker for HeadingChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::Headings
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let rules = &ctx.ruleset.heading;
        if rules.is_empty() {
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoRequirements,
            ));
        }

        let headings: Vec<_> = ctx.map.in_context(Context::Heading).collect();
        if headings.is_empty() && rules.required_sections.is_empty() {
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoInstances,
            ));
        }

        let mut violations = Vec::new();
        if !rules.format.is_empty() {
            for item in &headings {
                violations.extend(paragraph::check_format(
                    ctx,
                    item,
                    &rules.format,
                    ctx.config.tolerances.spacing_pt_strict,
                    "heading",
                ));
            }
        }

        let present: HashSet<String> = headings
            .iter()
            .map(|item| normalize_title(&item.paragraph.text()))
            .collect();
        for section in &rules.required_sections {
            if !present.contains(&normalize_title(section)) {
                violations.push(Violation::for_context(
                    ViolationKind::StructuralAbsence,
                    Attribute::Presence,
                    Context::Heading,
                    format!("required section \"{section}\" is missing"),
                ));
            }
        }

        Ok(CheckResult::checked(self.kind(), headings.len(), violations))
    }
}

/// Additional headings: outline levels 2 and below, numbered headings and
/// chapter titles.
pub struct SubHeadingChecker;

impl Checker for SubHeadingChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::SubHeadings
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        Ok(paragraph::check_all(
            ctx,
            self.kind(),
            &ctx.ruleset.subheading,
            ctx.map.in_context(Context::SubHeading),
            ctx.config.tolerances.spacing_pt_strict,
            "sub-heading",
        ))
    }
}
