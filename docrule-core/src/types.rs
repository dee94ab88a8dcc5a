use crate::classifier::Context;
use crate::document::{NodeRef, SourceInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The schema version stamped on every report.
/// Bump this when the output shape changes.
pub const SCHEMA_VERSION: &str = "0.1.0";

// ===== VIOLATIONS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Ok,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Ok => "ok",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Resolved value outside the tolerance of the requirement
    Mismatch,
    /// The cascade found no value for a required attribute, or the checker
    /// itself failed
    Undefined,
    /// A required context instance is missing from the document
    StructuralAbsence,
}

impl ViolationKind {
    pub fn severity(&self) -> Severity {
        match self {
            ViolationKind::Mismatch | ViolationKind::StructuralAbsence => Severity::Error,
            ViolationKind::Undefined => Severity::Warn,
        }
    }
}

/// Which formatting attribute a violation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    FontName,
    FontSize,
    Bold,
    Alignment,
    IndentLeft,
    IndentRight,
    FirstLine,
    LineSpacing,
    SpaceBefore,
    SpaceAfter,
    NumberingFormat,
    CaptionFormat,
    CaptionSequence,
    Margin,
    PageNumbers,
    Presence,
    Checker,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Attribute::FontName => "font",
            Attribute::FontSize => "font size",
            Attribute::Bold => "bold",
            Attribute::Alignment => "alignment",
            Attribute::IndentLeft => "left indent",
            Attribute::IndentRight => "right indent",
            Attribute::FirstLine => "first-line indent",
            Attribute::LineSpacing => "line spacing",
            Attribute::SpaceBefore => "spacing before",
            Attribute::SpaceAfter => "spacing after",
            Attribute::NumberingFormat => "numbering format",
            Attribute::CaptionFormat => "caption format",
            Attribute::CaptionSequence => "caption numbering",
            Attribute::Margin => "margin",
            Attribute::PageNumbers => "page numbers",
            Attribute::Presence => "presence",
            Attribute::Checker => "checker",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub attribute: Attribute,
    /// Context label ("plain text", "list level 2", ...)
    pub context: String,
    pub message: String,
    /// Pre-order paragraph index, stable across re-opened copies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl Violation {
    pub fn new(kind: ViolationKind, attribute: Attribute, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            attribute,
            context: context.into(),
            message: message.into(),
            node: None,
            excerpt: None,
        }
    }

    pub fn at(mut self, node: NodeRef, excerpt: Option<String>) -> Self {
        self.node = Some(node);
        self.excerpt = excerpt;
        self
    }

    pub fn for_context(kind: ViolationKind, attribute: Attribute, context: Context, message: impl Into<String>) -> Self {
        Self::new(kind, attribute, context.to_string(), message)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(node) = self.node {
            write!(f, "{node} ")?;
        }
        write!(f, "[{}] {}", self.context, self.message)?;
        if let Some(excerpt) = &self.excerpt {
            write!(f, " \"{excerpt}\"")?;
        }
        Ok(())
    }
}

// ===== CHECK RESULTS =====

/// The checkers the engine runs, one per structural context family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckerKind {
    PlainText,
    Headings,
    SubHeadings,
    Lists,
    ImageCaptions,
    TableCaptions,
    TableText,
    TableOfContents,
    PageSetup,
}

impl CheckerKind {
    pub const ALL: [CheckerKind; 9] = [
        CheckerKind::PlainText,
        CheckerKind::Headings,
        CheckerKind::SubHeadings,
        CheckerKind::Lists,
        CheckerKind::ImageCaptions,
        CheckerKind::TableCaptions,
        CheckerKind::TableText,
        CheckerKind::TableOfContents,
        CheckerKind::PageSetup,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CheckerKind::PlainText => "Plain text",
            CheckerKind::Headings => "Headings",
            CheckerKind::SubHeadings => "Sub-headings",
            CheckerKind::Lists => "Lists",
            CheckerKind::ImageCaptions => "Image captions",
            CheckerKind::TableCaptions => "Table captions",
            CheckerKind::TableText => "Table text",
            CheckerKind::TableOfContents => "Table of contents",
            CheckerKind::PageSetup => "Page setup",
        }
    }
}

/// Why a checker did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotApplicable {
    /// The ruleset defines no requirement for this context
    NoRequirements,
    /// The document contains no instance of this context
    NoInstances,
}

impl fmt::Display for NotApplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotApplicable::NoRequirements => f.write_str("no requirements in ruleset"),
            NotApplicable::NoInstances => f.write_str("nothing to check in document"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CheckStatus {
    NotApplicable { reason: NotApplicable },
    Checked { nodes: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub checker: CheckerKind,
    pub status: CheckStatus,
    pub violations: Vec<Violation>,
}

impl CheckResult {
    pub fn not_applicable(checker: CheckerKind, reason: NotApplicable) -> Self {
        Self {
            checker,
            status: CheckStatus::NotApplicable { reason },
            violations: Vec::new(),
        }
    }

    pub fn checked(checker: CheckerKind, nodes: usize, violations: Vec<Violation>) -> Self {
        Self {
            checker,
            status: CheckStatus::Checked { nodes },
            violations,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn was_executed(&self) -> bool {
        matches!(self.status, CheckStatus::Checked { .. })
    }
}

// ===== REPORT =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub schema_version: String,
    pub run_id: Uuid,
    pub checked_at: DateTime<Utc>,
    pub ruleset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
    pub is_valid: bool,
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    /// Fan-in: a report is valid when every executed checker is valid.
    /// Skipped checkers never affect the verdict.
    pub fn aggregate(ruleset_id: &str, source: Option<SourceInfo>, mut results: Vec<CheckResult>) -> Self {
        results.sort_by_key(|r| r.checker);
        let is_valid = results
            .iter()
            .filter(|r| r.was_executed())
            .all(CheckResult::is_valid);
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: Uuid::new_v4(),
            checked_at: Utc::now(),
            ruleset_id: ruleset_id.to_string(),
            source,
            is_valid,
            results,
        }
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.results.iter().flat_map(|r| r.violations.iter())
    }

    pub fn violation_count(&self) -> usize {
        self.results.iter().map(|r| r.violations.len()).sum()
    }

    /// Paragraphs that carry at least one violation, ascending and unique.
    pub fn flagged_nodes(&self) -> Vec<NodeRef> {
        let mut nodes: Vec<NodeRef> = self.violations().filter_map(|v| v.node).collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    pub fn result(&self, checker: CheckerKind) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.checker == checker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(node: usize) -> Violation {
        Violation::new(ViolationKind::Mismatch, Attribute::FontSize, "plain text", "size").at(NodeRef(node), None)
    }

    #[test]
    fn skipped_checkers_do_not_affect_verdict() {
        let report = CheckReport::aggregate(
            "r",
            None,
            vec![
                CheckResult::not_applicable(CheckerKind::Lists, NotApplicable::NoInstances),
                CheckResult::checked(CheckerKind::PlainText, 3, Vec::new()),
            ],
        );
        assert!(report.is_valid);
        assert_eq!(report.results[0].checker, CheckerKind::PlainText);
    }

    #[test]
    fn one_failing_checker_fails_the_report() {
        let report = CheckReport::aggregate(
            "r",
            None,
            vec![
                CheckResult::checked(CheckerKind::PlainText, 3, vec![violation(4), violation(1), violation(4)]),
                CheckResult::checked(CheckerKind::Headings, 1, Vec::new()),
            ],
        );
        assert!(!report.is_valid);
        assert_eq!(report.violation_count(), 3);
        assert_eq!(report.flagged_nodes(), vec![NodeRef(1), NodeRef(4)]);
    }

    #[test]
    fn not_applicable_is_distinct_from_checked_clean() {
        let skipped = CheckResult::not_applicable(CheckerKind::Lists, NotApplicable::NoRequirements);
        let clean = CheckResult::checked(CheckerKind::Lists, 2, Vec::new());
        assert!(skipped.is_valid() && clean.is_valid());
        assert_ne!(skipped.status, clean.status);
        assert!(!skipped.was_executed());
    }
}
