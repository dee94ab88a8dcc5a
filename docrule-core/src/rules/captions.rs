use super::engine::{CheckContext, Checker};
use super::paragraph;
use super::validators;
use crate::classifier::Context;
use crate::ruleset::CaptionRules;
use crate::types::{Attribute, CheckResult, CheckerKind, NotApplicable, Violation, ViolationKind};
use anyhow::Result;
use std::collections::HashMap;

/// Image or table captions: paragraph format, the "<Label> N - Title" text
/// pattern and, optionally, 1, 2, 3... numbering in document order.
pub struct CaptionChecker {
    kind: CheckerKind,
    context: Context,
    default_label: &'static str,
}

impl CaptionChecker {
    pub fn images() -> Self {
        Self {
            kind: CheckerKind::ImageCaptions,
            context: Context::ImageCaption,
            default_label: "Figure",
        }
    }

    pub fn tables() -> Self {
        Self {
            kind: CheckerKind::TableCaptions,
            context: Context::TableCaption,
            default_label: "Table",
        }
    }

    fn rules<'r>(&self, ctx: &'r CheckContext<'_>) -> &'r CaptionRules {
        match self.context {
            Context::TableCaption => &ctx.ruleset.table_caption,
            _ => &ctx.ruleset.image_caption,
        }
    }

    fn owners_present(&self, ctx: &CheckContext<'_>) -> bool {
        match self.context {
            Context::TableCaption => ctx.map.table_count > 0,
            _ => ctx.map.image_count > 0,
        }
    }
}

impl Checker for CaptionChecker {
    fn kind(&self) -> CheckerKind {
        self.kind
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let rules = self.rules(ctx);
        if rules.is_empty() {
            return Ok(CheckResult::not_applicable(
                self.kind,
                NotApplicable::NoRequirements,
            ));
        }
        if !self.owners_present(ctx) {
            return Ok(CheckResult::not_applicable(
                self.kind,
                NotApplicable::NoInstances,
            ));
        }

        let label = rules.label.as_deref().unwrap_or(self.default_label);
        let pattern = validators::caption_pattern(label)?;
        let check_text = rules.check_format == Some(true);
        let check_sequence = rules.sequential_numbering == Some(true);
        let context_label = self.context.to_string();

        let captions: Vec<_> = ctx.map.in_context(self.context).collect();
        let mut violations = Vec::new();
        // chapter prefix -> next expected number
        let mut next_number: HashMap<String, u32> = HashMap::new();

        for item in &captions {
            violations.extend(paragraph::check_format(
                ctx,
                item,
                &rules.format,
                ctx.config.tolerances.spacing_pt_strict,
                &context_label,
            ));

            let text = item.paragraph.text();
            if check_text {
                violations.extend(paragraph::violation_for(
                    ctx,
                    item,
                    Attribute::CaptionFormat,
                    validators::caption_format(&pattern, label, &text),
                    &context_label,
                ));
            }

            if check_sequence {
                if let Some((prefix, number)) = validators::caption_number(&pattern, &text) {
                    let expected = next_number.entry(prefix).or_insert(1);
                    if number != *expected {
                        let excerpt = paragraph::excerpt(&text, ctx.config.report.excerpt_chars);
                        violations.push(
                            Violation::new(
                                ViolationKind::Mismatch,
                                Attribute::CaptionSequence,
                                context_label.as_str(),
                                format!("{label} numbered {number}, expected {expected}"),
                            )
                            .at(item.node, excerpt),
                        );
                    }
                    *expected = number + 1;
                }
            }
        }

        Ok(CheckResult::checked(self.kind, captions.len(), violations))
    }
}
