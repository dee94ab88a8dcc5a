use super::engine::{CheckContext, Checker};
use super::paragraph;
use crate::types::{CheckResult, CheckerKind};
use anyhow::Result;

/// Body text: every paragraph classified as plain text that no skip
/// predicate removed.
pub struct PlainTextChecker;

impl Checker for PlainTextChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::PlainText
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let items = ctx
            .map
            .paragraphs
            .iter()
            .filter(|p| p.is_checked_plain_text());
        Ok(paragraph::check_all(
            ctx,
            self.kind(),
            &ctx.ruleset.plain_text,
            items,
            ctx.config.tolerances.spacing_pt,
            "plain text",
        ))
    }
}
