use crate::config::CheckConfig;
use crate::document::Document;
use crate::error::DocruleError;
use crate::providers::{default_providers, DocumentProvider};
use crate::rules::CheckEngine;
use crate::ruleset::Ruleset;
use crate::storage::RulesetStore;
use crate::types::*;
use anyhow::Result;
use std::path::Path;
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        log::debug!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    /// Record a duration measured elsewhere (per-checker timings from the engine).
    pub fn record(&mut self, step_name: &str, elapsed: Duration) {
        if self.enabled {
            self.timings.push((step_name.to_string(), elapsed));
        }
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        log::info!("📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            log::info!(
                "   {:.<35} {:.2}ms ({:.1}%)",
                step,
                duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        log::info!("   {:.<35} {:.2}ms", "Total", total.as_secs_f64() * 1000.0);
    }
}

/// Opens documents, resolves rulesets and runs the checker engine.
pub struct DocumentChecker {
    providers: Vec<Box<dyn DocumentProvider>>,
    rulesets: RulesetStore,
    engine: CheckEngine,
    config: CheckConfig,
}

impl DocumentChecker {
    /// Create DocumentChecker with full dependency injection
    pub fn new_with_dependencies(
        providers: Vec<Box<dyn DocumentProvider>>,
        rulesets: RulesetStore,
        engine: CheckEngine,
        config: CheckConfig,
    ) -> Self {
        let mut engine = engine;
        engine.set_parallel(config.parallel);
        Self {
            providers,
            rulesets,
            engine,
            config,
        }
    }

    /// Built-in providers and checkers
    pub fn new(rulesets: RulesetStore, config: CheckConfig) -> Self {
        Self::new_with_dependencies(default_providers(), rulesets, CheckEngine::new(), config)
    }

    pub fn rulesets(&self) -> &RulesetStore {
        &self.rulesets
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn open(&self, input: &Path) -> Result<Document> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.supports(input))
            .ok_or_else(|| DocruleError::UnsupportedFormat(input.to_path_buf()))?;
        log::debug!("opening {} with {}", input.display(), provider.name());
        provider.open(input)
    }

    /// Open `input` and check it against the ruleset with id `ruleset_id`.
    pub fn check_file(&mut self, input: &Path, ruleset_id: &str) -> Result<CheckReport> {
        self.check_file_with_profiling(input, ruleset_id, false)
    }

    pub fn check_file_with_profiling(
        &mut self,
        input: &Path,
        ruleset_id: &str,
        enable_profiling: bool,
    ) -> Result<CheckReport> {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(enable_profiling);

        // The ruleset and the document both load before any checker starts
        let ruleset = profiler
            .time_step("1. Resolve ruleset", || self.rulesets.resolve(ruleset_id).cloned())?;
        let document = profiler.time_step("2. Open document", || self.open(input))?;

        log::info!(
            "📄 Checking {} against '{}'",
            input.display(),
            ruleset.display_name()
        );

        let report =
            profiler.time_step("3. Check", || self.check_with(&document, &ruleset))?;
        for (kind, elapsed) in &self.engine.checker_timings {
            profiler.record(&format!("   3.{} {}", *kind as usize + 1, kind.label()), *elapsed);
        }

        profiler.log_summary();
        log::info!(
            "⏱️  Total processing time: {:.0}ms ({} violation(s))",
            start_time.elapsed().as_millis(),
            report.violation_count()
        );
        Ok(report)
    }

    /// Check an already opened document.
    pub fn check_with(&mut self, document: &Document, ruleset: &Ruleset) -> Result<CheckReport> {
        let results = self.engine.run(document, ruleset, &self.config)?;
        Ok(CheckReport::aggregate(
            &ruleset.id,
            document.source.clone(),
            results,
        ))
    }
}

/// Headless entry point: check a document against a ruleset with the default
/// configuration.
pub fn check_document(document: &Document, ruleset: &Ruleset) -> Result<CheckReport> {
    check_document_with_config(document, ruleset, &CheckConfig::default())
}

pub fn check_document_with_config(
    document: &Document,
    ruleset: &Ruleset,
    config: &CheckConfig,
) -> Result<CheckReport> {
    let mut engine = CheckEngine::new();
    engine.set_parallel(config.parallel);
    let results = engine.run(document, ruleset, config)?;
    Ok(CheckReport::aggregate(
        &ruleset.id,
        document.source.clone(),
        results,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BundledRulesets, NoOverlay};

    #[test]
    fn profiler_records_only_when_enabled() {
        let mut off = StepProfiler::new(false);
        assert_eq!(off.time_step("a", || 1 + 1), 2);
        off.record("b", Duration::from_millis(3));
        assert!(off.timings().is_empty());

        let mut on = StepProfiler::new(true);
        on.time_step("a", || ());
        on.record("b", Duration::from_millis(3));
        assert_eq!(on.timings().len(), 2);
    }

    #[test]
    fn empty_document_has_one_result_per_checker() {
        let store = RulesetStore::load(&BundledRulesets, &NoOverlay).unwrap();
        let ruleset = store.list()[0].clone();
        let report = check_document(&Document::default(), &ruleset).unwrap();
        assert_eq!(report.results.len(), CheckerKind::ALL.len());
        assert_eq!(report.ruleset_id, ruleset.id);
    }

    #[test]
    fn unsupported_extension_is_a_typed_error() {
        let store = RulesetStore::load(&BundledRulesets, &NoOverlay).unwrap();
        let checker = DocumentChecker::new(store, CheckConfig::default());
        let err = checker.open(Path::new("report.odt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocruleError>(),
            Some(DocruleError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn unknown_ruleset_fails_before_opening() {
        let store = RulesetStore::load(&BundledRulesets, &NoOverlay).unwrap();
        let mut checker = DocumentChecker::new(store, CheckConfig::default());
        let err = checker
            .check_file(Path::new("/no/such/file.docx"), "missing")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocruleError>(),
            Some(DocruleError::UnknownRuleset(_))
        ));
    }
}
