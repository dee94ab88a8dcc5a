use super::engine::{CheckContext, Checker};
use super::paragraph;
use crate::classifier::Context;
use crate::types::{CheckResult, CheckerKind, NotApplicable};
use anyhow::Result;

/// Text inside table cells.
pub struct TableTextChecker;

impl Checker for TableTextChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::TableText
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let rules = &ctx.ruleset.table_text;
        if !rules.is_empty() && ctx.map.table_count == 0 {
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoInstances,
            ));
        }
        Ok(paragraph::check_all(
            ctx,
            self.kind(),
            rules,
            ctx.map.in_context(Context::TableCell),
            ctx.config.tolerances.spacing_pt,
            "table text",
        ))
    }
}
