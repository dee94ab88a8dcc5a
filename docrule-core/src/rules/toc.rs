use super::engine::{CheckContext, Checker};
use super::paragraph;
use crate::classifier::Context;
use crate::types::{Attribute, CheckResult, CheckerKind, NotApplicable, Violation, ViolationKind};
use anyhow::Result;

/// Table of contents entries, and presence of a table of contents when the
/// ruleset requires one.
pub struct TocChecker;

impl Checker for TocChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::TableOfContents
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let rules = &ctx.ruleset.toc;
        if rules.is_empty() {
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoRequirements,
            ));
        }

        if !ctx.map.has_toc() {
            if rules.required == Some(true) {
                return Ok(CheckResult::checked(
                    self.kind(),
                    0,
                    vec![Violation::for_context(
                        ViolationKind::StructuralAbsence,
                        Attribute::Presence,
                        Context::TocEntry,
                        "document has no table of contents",
                    )],
                ));
            }
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoInstances,
            ));
        }

        if rules.format.is_empty() {
            let entries = ctx.map.in_context(Context::TocEntry).count();
            return Ok(CheckResult::checked(self.kind(), entries, Vec::new()));
        }

        Ok(paragraph::check_all(
            ctx,
            self.kind(),
            &rules.format,
            ctx.map.in_context(Context::TocEntry),
            ctx.config.tolerances.spacing_pt,
            "table of contents",
        ))
    }
}
