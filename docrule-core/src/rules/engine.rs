use crate::cascade::Resolver;
use crate::classifier::{Classifier, DocumentMap};
use crate::config::CheckConfig;
use crate::document::Document;
use crate::ruleset::Ruleset;
use crate::types::*;
use anyhow::Result;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use super::captions::CaptionChecker;
use super::headings::{HeadingChecker, SubHeadingChecker};
use super::lists::ListChecker;
use super::page_setup::PageSetupChecker;
use super::plain_text::PlainTextChecker;
use super::tables::TableTextChecker;
use super::toc::TocChecker;

/// Everything a checker may read. Shared by all checkers of one run and never
/// mutated while they execute.
pub struct CheckContext<'a> {
    pub document: &'a Document,
    pub map: &'a DocumentMap<'a>,
    pub resolver: Resolver<'a>,
    pub ruleset: &'a Ruleset,
    pub config: &'a CheckConfig,
}

/// One context-specific checker.
pub trait Checker: Send + Sync {
    fn kind(&self) -> CheckerKind;
    fn check(&self, ctx: &CheckContext<'_>) -> Result<CheckResult>;
    fn name(&self) -> &str {
        self.kind().label()
    }
}

/// Fans checkers out over one classified document and collects their results.
pub struct CheckEngine {
    checkers: Vec<Box<dyn Checker>>,
    parallel: bool,
    pub checker_timings: Vec<(CheckerKind, Duration)>,
}

impl Default for CheckEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckEngine {
    pub fn new() -> Self {
        Self::with_checkers(default_checkers())
    }

    pub fn with_checkers(checkers: Vec<Box<dyn Checker>>) -> Self {
        Self {
            checkers,
            parallel: true,
            checker_timings: Vec::new(),
        }
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Classify the document and run every checker against it. Only a broken
    /// classifier configuration fails the run; checker failures become
    /// violations on that checker's result.
    pub fn run(&mut self, document: &Document, ruleset: &Ruleset, config: &CheckConfig) -> Result<Vec<CheckResult>> {
        let resolver = Resolver::new(&document.styles, &document.numbering, &config.fallbacks);
        let classifier = Classifier::new(&config.classifier, ruleset)?;
        let map = classifier.classify(document, &resolver);
        let ctx = CheckContext {
            document,
            map: &map,
            resolver,
            ruleset,
            config,
        };

        log::info!(
            "running {} checkers against ruleset '{}' ({})",
            self.checkers.len(),
            ruleset.id,
            if self.parallel { "parallel" } else { "sequential" }
        );

        let outcomes: Vec<(CheckResult, Duration)> = if self.parallel {
            self.checkers
                .par_iter()
                .map(|checker| run_guarded(checker.as_ref(), &ctx))
                .collect()
        } else {
            self.checkers
                .iter()
                .map(|checker| run_guarded(checker.as_ref(), &ctx))
                .collect()
        };

        self.checker_timings = outcomes
            .iter()
            .map(|(result, elapsed)| (result.checker, *elapsed))
            .collect();
        Ok(outcomes.into_iter().map(|(result, _)| result).collect())
    }
}

pub fn default_checkers() -> Vec<Box<dyn Checker>> {
    vec![
        Box::new(PlainTextChecker),
        Box::new(HeadingChecker),
        Box::new(SubHeadingChecker),
        Box::new(ListChecker),
        Box::new(CaptionChecker::images()),
        Box::new(CaptionChecker::tables()),
        Box::new(TableTextChecker),
        Box::new(TocChecker),
        Box::new(PageSetupChecker),
    ]
}

/// Run one checker behind its own boundary: an error or a panic becomes a
/// single undefined violation and never reaches sibling checkers.
fn run_guarded(checker: &dyn Checker, ctx: &CheckContext<'_>) -> (CheckResult, Duration) {
    let start = Instant::now();
    let kind = checker.kind();
    let result = match panic::catch_unwind(AssertUnwindSafe(|| checker.check(ctx))) {
        Ok(Ok(result)) => result,
        Ok(Err(error)) => {
            log::warn!("{} checker failed: {error:#}", checker.name());
            failed(kind, format!("checker failed: {error:#}"))
        }
        Err(payload) => {
            let message = panic_payload_to_string(payload.as_ref());
            log::warn!("{} checker panicked: {message}", checker.name());
            failed(kind, format!("checker panicked: {message}"))
        }
    };
    let elapsed = start.elapsed();
    log::debug!(
        "{}: {} violation(s) in {:.2}ms",
        checker.name(),
        result.violations.len(),
        elapsed.as_secs_f64() * 1000.0
    );
    (result, elapsed)
}

fn failed(kind: CheckerKind, message: String) -> CheckResult {
    CheckResult::checked(
        kind,
        0,
        vec![Violation::new(
            ViolationKind::Undefined,
            Attribute::Checker,
            kind.label(),
            message,
        )],
    )
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Paragraph, Run};

    struct Exploding;

    impl Checker for Exploding {
        fn kind(&self) -> CheckerKind {
            CheckerKind::Lists
        }

        fn check(&self, _ctx: &CheckContext<'_>) -> Result<CheckResult> {
            panic!("malformed level table");
        }
    }

    struct Failing;

    impl Checker for Failing {
        fn kind(&self) -> CheckerKind {
            CheckerKind::TableText
        }

        fn check(&self, _ctx: &CheckContext<'_>) -> Result<CheckResult> {
            anyhow::bail!("unreadable cell")
        }
    }

    fn document() -> Document {
        Document {
            body: vec![Block::Paragraph(Paragraph {
                runs: vec![Run {
                    text: "Body".to_string(),
                    ..Run::default()
                }],
                ..Paragraph::default()
            })],
            ..Document::default()
        }
    }

    #[test]
    fn failing_checkers_do_not_abort_siblings() {
        let mut checkers = default_checkers();
        checkers.push(Box::new(Exploding));
        checkers.push(Box::new(Failing));
        let mut engine = CheckEngine::with_checkers(checkers);
        let results = engine
            .run(&document(), &Ruleset::new("empty"), &CheckConfig::default())
            .unwrap();

        assert_eq!(results.len(), 11);
        let broken: Vec<&CheckResult> = results
            .iter()
            .filter(|r| r.violations.iter().any(|v| v.attribute == Attribute::Checker))
            .collect();
        assert_eq!(broken.len(), 2);
        assert!(broken
            .iter()
            .all(|r| r.violations.len() == 1 && r.violations[0].kind == ViolationKind::Undefined));
        assert!(results
            .iter()
            .filter(|r| r.checker == CheckerKind::PlainText)
            .all(|r| !r.was_executed()));
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let mut ruleset = Ruleset::new("r");
        ruleset.plain_text.font_size = Some(14.0);
        let config = CheckConfig::default();

        let mut parallel = CheckEngine::new();
        let mut sequential = CheckEngine::new();
        sequential.set_parallel(false);
        let a = parallel.run(&document(), &ruleset, &config).unwrap();
        let b = sequential.run(&document(), &ruleset, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(parallel.checker_timings.len(), 9);
    }
}
