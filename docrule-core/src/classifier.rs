//! Context classifier: assigns every body paragraph to one structural context.
//!
//! Structural signals (content controls, numbering metadata, style ids,
//! position next to tables and images) are consulted before text heuristics.

use crate::cascade::Resolver;
use crate::config::ClassifierConfig;
use crate::document::{Document, FlatParagraph, NodeRef, Paragraph, StyleTable};
use crate::ruleset::Ruleset;
use anyhow::{Context as _, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Leading section number or roman numeral ("1.", "2.3", "IV.") before a title
static LEADING_NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+(?:\.\d+)*\.?|[IVXLC]+\.)\s+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "context")]
pub enum Context {
    Empty,
    Heading,
    SubHeading,
    ListItem { level: u8 },
    TableCaption,
    ImageCaption,
    TocEntry,
    TableCell,
    AppendixBody,
    PlainText,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Empty => f.write_str("empty"),
            Context::Heading => f.write_str("heading"),
            Context::SubHeading => f.write_str("sub-heading"),
            Context::ListItem { level } => write!(f, "list level {level}"),
            Context::TableCaption => f.write_str("table caption"),
            Context::ImageCaption => f.write_str("image caption"),
            Context::TocEntry => f.write_str("table of contents"),
            Context::TableCell => f.write_str("table text"),
            Context::AppendixBody => f.write_str("appendix"),
            Context::PlainText => f.write_str("plain text"),
        }
    }
}

/// Why a paragraph that classified as plain text is still not checked as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    SpecialStyle,
    PageNumberField,
    CaptionPrefix,
    Drawing,
}

/// How a list paragraph was recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvidence {
    /// Numbering metadata; the level template's text (e.g. "%1.")
    Numbering { template: Option<String> },
    /// A list style id with no leading marker
    Style,
    /// Leading bullet or numeral typed into the text
    Marker(String),
}

#[derive(Debug, Clone)]
pub struct ClassifiedParagraph<'a> {
    pub node: NodeRef,
    pub paragraph: &'a Paragraph,
    pub context: Context,
    pub skip: Option<SkipReason>,
    pub list_evidence: Option<ListEvidence>,
}

impl ClassifiedParagraph<'_> {
    /// True for plain text that passes every skip predicate.
    pub fn is_checked_plain_text(&self) -> bool {
        self.context == Context::PlainText && self.skip.is_none()
    }
}

/// Classification of a whole document.
#[derive(Debug, Clone, Default)]
pub struct DocumentMap<'a> {
    pub paragraphs: Vec<ClassifiedParagraph<'a>>,
    pub table_count: usize,
    pub image_count: usize,
}

impl<'a> DocumentMap<'a> {
    pub fn in_context(&self, context: Context) -> impl Iterator<Item = &ClassifiedParagraph<'a>> {
        self.paragraphs.iter().filter(move |p| p.context == context)
    }

    pub fn list_items(&self) -> impl Iterator<Item = (u8, &ClassifiedParagraph<'a>)> {
        self.paragraphs.iter().filter_map(|p| match p.context {
            Context::ListItem { level } => Some((level, p)),
            _ => None,
        })
    }

    pub fn has_toc(&self) -> bool {
        self.in_context(Context::TocEntry).next().is_some()
    }
}

/// Compiled classifier for one ruleset and one configuration.
pub struct Classifier {
    config: ClassifierConfig,
    required_sections: Vec<String>,
    level_indents: Vec<(u8, f64)>,
    numbered_patterns: Vec<Regex>,
    numbered_heading: Regex,
    chapter: Regex,
    appendix: Regex,
    toc_entry: Regex,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig, ruleset: &Ruleset) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).with_context(|| format!("invalid classifier pattern '{pattern}'"))
        };

        let mut numbered_patterns = Vec::new();
        for pattern in &config.numbered_patterns {
            numbered_patterns.push(compile(pattern)?);
        }

        Ok(Self {
            config: config.clone(),
            required_sections: ruleset
                .heading
                .required_sections
                .iter()
                .map(|s| normalize_title(s))
                .collect(),
            level_indents: ruleset.lists.level_indents(),
            numbered_patterns,
            numbered_heading: compile(&config.numbered_heading_pattern)?,
            chapter: compile(&config.chapter_pattern)?,
            appendix: compile(&config.appendix_pattern)?,
            toc_entry: compile(&config.toc_entry_pattern)?,
        })
    }

    pub fn classify<'a>(&self, document: &'a Document, resolver: &Resolver<'_>) -> DocumentMap<'a> {
        let flat = document.flatten();
        let mut paragraphs = Vec::with_capacity(flat.len());
        let mut in_appendix = false;

        for item in &flat {
            let (mut context, list_evidence) = self.primary_context(item, &document.styles, resolver);
            let text = item.paragraph.text();

            match context {
                Context::Heading => in_appendix = false,
                Context::PlainText | Context::SubHeading
                    if self.appendix.is_match(text.trim_start()) =>
                {
                    in_appendix = true;
                    context = Context::AppendixBody;
                }
                Context::PlainText if in_appendix => context = Context::AppendixBody,
                _ => {}
            }

            let skip = if context == Context::PlainText {
                self.skip_reason(item.paragraph, &document.styles, &text)
            } else {
                None
            };

            paragraphs.push(ClassifiedParagraph {
                node: item.node,
                paragraph: item.paragraph,
                context,
                skip,
                list_evidence,
            });
        }

        let image_count = flat.iter().filter(|f| f.paragraph.has_drawing()).count();
        log::debug!(
            "classified {} paragraphs ({} tables, {} images)",
            paragraphs.len(),
            document.table_count(),
            image_count
        );

        DocumentMap {
            paragraphs,
            table_count: document.table_count(),
            image_count,
        }
    }

    fn primary_context(
        &self,
        item: &FlatParagraph<'_>,
        styles: &StyleTable,
        resolver: &Resolver<'_>,
    ) -> (Context, Option<ListEvidence>) {
        let paragraph = item.paragraph;
        if paragraph.is_blank() {
            return (Context::Empty, None);
        }

        let style_names: Vec<String> = resolver
            .paragraph_style_id(paragraph)
            .map(|id| styles.names_for(id).into_iter().map(normalize_style).collect())
            .unwrap_or_default();
        let text = paragraph.text();
        let trimmed = text.trim();

        if item.in_toc_container
            || paragraph.has_field("TOC")
            || self.has_style_prefix(&style_names, &self.config.toc_style_prefixes)
        {
            if style_names.iter().any(|s| s == "tocheading") {
                return (Context::PlainText, None);
            }
            return (Context::TocEntry, None);
        }

        if self.matches_required_section(trimmed)
            || style_names
                .iter()
                .any(|s| self.config.heading_styles.iter().any(|h| normalize_style(h) == *s))
        {
            return (Context::Heading, None);
        }

        if style_names
            .iter()
            .any(|s| self.heading_style_level(s).is_some_and(|level| level >= 2))
        {
            return (Context::SubHeading, None);
        }

        if item.precedes_table {
            return (Context::TableCaption, None);
        }
        if item.follows_image {
            return (Context::ImageCaption, None);
        }

        if item.in_table {
            return (Context::TableCell, None);
        }

        if let Some(numbering) = resolver.numbering(paragraph) {
            let template = resolver_numbering_template(resolver, paragraph);
            let level = numbering.level.saturating_add(1).min(crate::ruleset::MAX_LIST_LEVEL);
            return (
                Context::ListItem { level },
                Some(ListEvidence::Numbering { template }),
            );
        }

        let marker = self.leading_marker(trimmed);
        let list_style = self.has_style_prefix(&style_names, &self.config.list_style_prefixes);
        if marker.is_some() || list_style {
            let level = self.level_from_indent(resolver, paragraph);
            let evidence = match marker {
                Some(marker) => ListEvidence::Marker(marker),
                None => ListEvidence::Style,
            };
            return (Context::ListItem { level }, Some(evidence));
        }

        if self.toc_entry.is_match(trimmed) {
            return (Context::TocEntry, None);
        }

        if self.numbered_heading.is_match(trimmed) || self.chapter.is_match(trimmed) {
            return (Context::SubHeading, None);
        }

        (Context::PlainText, None)
    }

    fn skip_reason(&self, paragraph: &Paragraph, styles: &StyleTable, text: &str) -> Option<SkipReason> {
        let special_style = paragraph.style_id.as_deref().is_some_and(|id| {
            styles
                .names_for(id)
                .into_iter()
                .map(normalize_style)
                .any(|name| self.config.skip_styles.iter().any(|s| normalize_style(s) == name))
        });
        if special_style {
            return Some(SkipReason::SpecialStyle);
        }
        if paragraph.has_field("PAGE") {
            return Some(SkipReason::PageNumberField);
        }
        if paragraph.has_drawing() {
            return Some(SkipReason::Drawing);
        }
        let trimmed = text.trim_start();
        if self
            .config
            .caption_prefixes
            .iter()
            .any(|prefix| starts_with_word(trimmed, prefix))
        {
            return Some(SkipReason::CaptionPrefix);
        }
        None
    }

    fn matches_required_section(&self, text: &str) -> bool {
        if self.required_sections.is_empty() {
            return false;
        }
        let title = normalize_title(text);
        self.required_sections.iter().any(|s| *s == title)
    }

    /// Outline level encoded in a heading style name ("heading2" -> 2).
    fn heading_style_level(&self, normalized: &str) -> Option<u8> {
        let prefix = normalize_style(&self.config.heading_style_prefix);
        normalized.strip_prefix(prefix.as_str())?.parse().ok()
    }

    fn has_style_prefix(&self, style_names: &[String], prefixes: &[String]) -> bool {
        style_names.iter().any(|name| {
            prefixes
                .iter()
                .any(|prefix| name.starts_with(normalize_style(prefix).as_str()))
        })
    }

    /// Bullet glyph or numeral token typed at the start of the text.
    pub fn leading_marker(&self, text: &str) -> Option<String> {
        for bullet in &self.config.bullet_patterns {
            if let Some(rest) = text.strip_prefix(bullet.as_str()) {
                if rest.starts_with(char::is_whitespace) {
                    return Some(bullet.clone());
                }
            }
        }
        self.numbered_patterns
            .iter()
            .find_map(|pattern| pattern.find(text))
            .map(|m| m.as_str().trim_end().to_string())
    }

    /// Nearest configured level indent within the band, else level 1.
    fn level_from_indent(&self, resolver: &Resolver<'_>, paragraph: &Paragraph) -> u8 {
        let Some(indent) = resolver.indent_left(paragraph).value().copied() else {
            return 1;
        };
        self.level_indents
            .iter()
            .map(|(level, expected)| (*level, (indent - expected).abs()))
            .filter(|(_, distance)| *distance <= self.config.level_indent_band_cm)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(level, _)| level)
            .unwrap_or(1)
    }
}

fn resolver_numbering_template(resolver: &Resolver<'_>, paragraph: &Paragraph) -> Option<String> {
    let numbering = resolver.numbering(paragraph)?;
    resolver
        .numbering_level(numbering)
        .filter(|level| !level.is_bullet())
        .map(|level| level.text.clone())
}

/// Lowercase with spaces, dashes and underscores removed ("List Paragraph" -> "listparagraph").
pub fn normalize_style(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Title text for comparison against required section names.
pub fn normalize_title(text: &str) -> String {
    let stripped = LEADING_NUMERAL.replace(text.trim(), "");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn starts_with_word(text: &str, prefix: &str) -> bool {
    match text.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || !rest.starts_with(char::is_alphanumeric) || prefix.ends_with('.'),
        None => false,
    }
}
