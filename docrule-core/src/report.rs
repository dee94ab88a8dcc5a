//! Report sinks: where a finished `CheckReport` is narrated to.
//!
//! `emit_report` produces one message per checker, a final verdict, and then
//! the structured detail list. Sinks decide what to do with them.

use crate::config::ReportConfig;
use crate::document::NodeRef;
use crate::types::{CheckReport, CheckResult, CheckStatus, Severity};
use serde::Serialize;
use std::io::Write;

/// One row of the detail view: a violation message and the paragraph it
/// points at, when it points at one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailEntry {
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeRef>,
}

pub trait ReportSink {
    fn message(&mut self, text: &str, severity: Severity);
    fn details(&mut self, entries: &[DetailEntry]);
}

/// Sends everything through the `log` facade.
pub struct LogSink;

impl ReportSink for LogSink {
    fn message(&mut self, text: &str, severity: Severity) {
        match severity {
            Severity::Error => log::error!("{text}"),
            Severity::Warn => log::warn!("{text}"),
            Severity::Ok | Severity::Info => log::info!("{text}"),
        }
    }

    fn details(&mut self, entries: &[DetailEntry]) {
        for entry in entries {
            match entry.node {
                Some(node) => log::debug!("{node} {}", entry.message),
                None => log::debug!("{}", entry.message),
            }
        }
    }
}

/// Keeps everything in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub messages: Vec<(String, Severity)>,
    pub details: Vec<DetailEntry>,
}

impl ReportSink for CollectingSink {
    fn message(&mut self, text: &str, severity: Severity) {
        self.messages.push((text.to_string(), severity));
    }

    fn details(&mut self, entries: &[DetailEntry]) {
        self.details.extend_from_slice(entries);
    }
}

/// Plain-text rendering onto any writer. Details are left out; the per-checker
/// messages already list the first violations of each category.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn message(&mut self, text: &str, severity: Severity) {
        let marker = match severity {
            Severity::Ok => "✅",
            Severity::Info => "ℹ️ ",
            Severity::Warn => "⚠️ ",
            Severity::Error => "❌",
        };
        if let Err(e) = writeln!(self.writer, "{marker} {text}") {
            log::warn!("failed to write report line: {e}");
        }
    }

    fn details(&mut self, _entries: &[DetailEntry]) {}
}

/// Narrate a report: per-checker summaries, the verdict, then details.
pub fn emit_report(report: &CheckReport, sink: &mut dyn ReportSink, config: &ReportConfig) {
    for result in &report.results {
        let (text, severity) = summarize(result, config.max_listed);
        sink.message(&text, severity);
    }

    let failing = report
        .results
        .iter()
        .filter(|r| r.was_executed() && !r.is_valid())
        .count();
    if report.is_valid {
        sink.message(
            &format!("Document complies with ruleset '{}'", report.ruleset_id),
            Severity::Ok,
        );
    } else {
        sink.message(
            &format!(
                "Document does not comply with ruleset '{}': {} violation(s) in {} categor{}",
                report.ruleset_id,
                report.violation_count(),
                failing,
                if failing == 1 { "y" } else { "ies" }
            ),
            Severity::Error,
        );
    }

    let entries: Vec<DetailEntry> = report
        .violations()
        .map(|v| DetailEntry {
            message: format!("[{}] {}", v.context, v.message),
            severity: v.severity,
            node: v.node,
        })
        .collect();
    sink.details(&entries);
}

fn summarize(result: &CheckResult, max_listed: usize) -> (String, Severity) {
    let label = result.checker.label();
    match result.status {
        CheckStatus::NotApplicable { reason } => {
            (format!("{label}: not applicable ({reason})"), Severity::Info)
        }
        CheckStatus::Checked { nodes } if result.violations.is_empty() => {
            (format!("{label}: ok ({nodes} checked)"), Severity::Ok)
        }
        CheckStatus::Checked { .. } => {
            let severity = result
                .violations
                .iter()
                .map(|v| v.severity)
                .max()
                .unwrap_or(Severity::Error);
            let mut text = format!("{label}: {} violation(s)", result.violations.len());
            for violation in result.violations.iter().take(max_listed) {
                text.push_str(&format!("\n    - {violation}"));
            }
            if result.violations.len() > max_listed {
                text.push_str(&format!("\n    +{} more", result.violations.len() - max_listed));
            }
            (text, severity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attribute, CheckerKind, NotApplicable, Violation, ViolationKind};

    fn mismatch(node: usize) -> Violation {
        Violation::new(
            ViolationKind::Mismatch,
            Attribute::FontSize,
            "plain text",
            format!("font size 12pt, expected 14pt ({node})"),
        )
        .at(NodeRef(node), None)
    }

    fn report(results: Vec<CheckResult>) -> CheckReport {
        CheckReport::aggregate("academic-thesis", None, results)
    }

    #[test]
    fn capped_listing_with_remainder() {
        let violations = (0..8).map(mismatch).collect();
        let report = report(vec![CheckResult::checked(CheckerKind::PlainText, 8, violations)]);
        let mut sink = CollectingSink::default();
        emit_report(&report, &mut sink, &ReportConfig::default());

        let (text, severity) = &sink.messages[0];
        assert_eq!(*severity, Severity::Error);
        assert_eq!(text.matches("\n    - ").count(), 5);
        assert!(text.ends_with("+3 more"));
        assert_eq!(sink.details.len(), 8);
        assert_eq!(sink.details[2].node, Some(NodeRef(2)));
    }

    #[test]
    fn one_message_per_checker_plus_verdict() {
        let report = report(vec![
            CheckResult::not_applicable(CheckerKind::Lists, NotApplicable::NoRequirements),
            CheckResult::checked(CheckerKind::PlainText, 4, Vec::new()),
        ]);
        let mut sink = CollectingSink::default();
        emit_report(&report, &mut sink, &ReportConfig::default());

        assert_eq!(sink.messages.len(), 3);
        assert_eq!(sink.messages[0].1, Severity::Ok);
        assert!(sink.messages[1].0.contains("not applicable"));
        assert_eq!(sink.messages[1].1, Severity::Info);
        assert!(sink.messages[2].0.starts_with("Document complies"));
        assert!(sink.details.is_empty());
    }

    #[test]
    fn undefined_only_category_is_a_warning() {
        let undefined = Violation::new(
            ViolationKind::Undefined,
            Attribute::FontName,
            "plain text",
            "font is not defined",
        );
        let report = report(vec![CheckResult::checked(
            CheckerKind::PlainText,
            1,
            vec![undefined],
        )]);
        let mut sink = CollectingSink::default();
        emit_report(&report, &mut sink, &ReportConfig::default());
        assert_eq!(sink.messages[0].1, Severity::Warn);
        assert_eq!(sink.messages[1].1, Severity::Error);
        assert!(sink.messages[1].0.contains("1 violation(s) in 1 category"));
    }

    #[test]
    fn writer_sink_renders_lines() {
        let report = report(vec![CheckResult::checked(CheckerKind::PlainText, 1, Vec::new())]);
        let mut sink = WriterSink::new(Vec::new());
        emit_report(&report, &mut sink, &ReportConfig::default());
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
