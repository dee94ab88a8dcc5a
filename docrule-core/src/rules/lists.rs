use super::engine::{CheckContext, Checker};
use super::paragraph;
use super::validators::{self, Verdict};
use crate::classifier::{ClassifiedParagraph, ListEvidence};
use crate::ruleset::MarkerSuffix;
use crate::types::{Attribute, CheckResult, CheckerKind, NotApplicable};
use anyhow::Result;

/// List items at each of the nine levels, checked against that level's rules.
pub struct ListChecker;

impl Checker for ListChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::Lists
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let lists = &ctx.ruleset.lists;
        if lists.is_empty() {
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoRequirements,
            ));
        }
        if ctx.map.list_items().next().is_none() {
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoInstances,
            ));
        }

        let mut checked = 0;
        let mut violations = Vec::new();
        for (level, item) in ctx.map.list_items() {
            let Some(rules) = lists.level(level) else {
                continue;
            };
            checked += 1;
            let label = format!("list level {level}");
            violations.extend(paragraph::check_format(
                ctx,
                item,
                &rules.format,
                ctx.config.tolerances.spacing_pt,
                &label,
            ));

            if let Some(expected) = rules.suffix {
                if let Some(verdict) = suffix_verdict(ctx, item, expected) {
                    violations.extend(paragraph::violation_for(
                        ctx,
                        item,
                        Attribute::NumberingFormat,
                        verdict,
                        &label,
                    ));
                }
            }
        }

        // Lists exist, but none at a level the ruleset describes
        if checked == 0 {
            return Ok(CheckResult::not_applicable(
                self.kind(),
                NotApplicable::NoInstances,
            ));
        }
        Ok(CheckResult::checked(self.kind(), checked, violations))
    }
}

/// Suffix verdict for one item, or `None` when the item is bulleted and a
/// suffix does not apply. Numbering that points at a missing definition has
/// no known marker and is undefined.
fn suffix_verdict(
    ctx: &CheckContext<'_>,
    item: &ClassifiedParagraph<'_>,
    expected: MarkerSuffix,
) -> Option<Verdict> {
    let actual = match &item.list_evidence {
        Some(ListEvidence::Numbering {
            template: Some(template),
        }) => Some(MarkerSuffix::classify(template)),
        Some(ListEvidence::Numbering { template: None }) => {
            let level = ctx
                .resolver
                .numbering(item.paragraph)
                .and_then(|numbering| ctx.resolver.numbering_level(numbering));
            match level {
                Some(level) if level.is_bullet() => return None,
                _ => None,
            }
        }
        Some(ListEvidence::Marker(marker)) => {
            if !marker.chars().any(char::is_alphanumeric) {
                return None;
            }
            Some(MarkerSuffix::classify(marker))
        }
        Some(ListEvidence::Style) | None => None,
    };
    Some(validators::numbering_suffix(expected, actual))
}
