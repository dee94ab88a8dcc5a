//! Style cascade resolver.
//!
//! Paragraph attributes resolve through: direct paragraph properties, the
//! paragraph's style (or the default paragraph style), its based-on ancestors,
//! the numbering level the paragraph belongs to, then the document defaults.
//! Run attributes resolve through: direct run properties, the character style
//! chain, the paragraph style chain, then the document run defaults.
//!
//! A raw value that does not normalize counts as "not defined at this level"
//! and resolution keeps walking. When nothing defines the attribute the result
//! is `Resolved::Undefined`, which carries the configured fallback for display
//! only.

use crate::config::FallbackDefaults;
use crate::document::{
    NumberingLevel, NumberingRef, NumberingTable, Paragraph, ParagraphProps, Run, RunProps,
    StyleTable,
};
use crate::ruleset::{Alignment, FirstLine, LineSpacing};
use crate::units;
use serde::Serialize;
use std::fmt;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "level")]
pub enum SourceLevel {
    Explicit,
    /// Character style of the run; depth 0 is the run's own style
    CharacterStyle { depth: usize },
    /// The paragraph's own style
    Style,
    /// An ancestor of the paragraph's style, depth 1 is the direct parent
    BasedOn { depth: usize },
    Numbering,
    DocumentDefault,
}

impl fmt::Display for SourceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLevel::Explicit => f.write_str("direct formatting"),
            SourceLevel::CharacterStyle { depth: 0 } => f.write_str("character style"),
            SourceLevel::CharacterStyle { depth } => {
                write!(f, "character style ancestor {depth}")
            }
            SourceLevel::Style => f.write_str("paragraph style"),
            SourceLevel::BasedOn { depth } => write!(f, "based-on style {depth}"),
            SourceLevel::Numbering => f.write_str("numbering level"),
            SourceLevel::DocumentDefault => f.write_str("document defaults"),
        }
    }
}

/// Outcome of a cascade walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    Defined { value: T, source: SourceLevel },
    /// Nothing in the chain defines the attribute. `fallback` is what a
    /// renderer would most likely show; it never satisfies a requirement.
    Undefined { fallback: T },
}

impl<T> Resolved<T> {
    pub fn is_defined(&self) -> bool {
        matches!(self, Resolved::Defined { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Resolved::Defined { value, .. } => Some(value),
            Resolved::Undefined { .. } => None,
        }
    }

    /// The defined value, or the fallback when undefined.
    pub fn display_value(&self) -> &T {
        match self {
            Resolved::Defined { value, .. } => value,
            Resolved::Undefined { fallback } => fallback,
        }
    }

    pub fn source(&self) -> Option<SourceLevel> {
        match self {
            Resolved::Defined { source, .. } => Some(*source),
            Resolved::Undefined { .. } => None,
        }
    }
}

/// Resolves effective formatting against one document's style and numbering
/// tables. Cheap to construct; borrows everything.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    styles: &'a StyleTable,
    numbering: &'a NumberingTable,
    fallbacks: &'a FallbackDefaults,
}

impl<'a> Resolver<'a> {
    pub fn new(
        styles: &'a StyleTable,
        numbering: &'a NumberingTable,
        fallbacks: &'a FallbackDefaults,
    ) -> Self {
        Self {
            styles,
            numbering,
            fallbacks,
        }
    }

    /// Style id the paragraph effectively uses.
    pub fn paragraph_style_id<'p>(&'p self, paragraph: &'p Paragraph) -> Option<&'p str> {
        paragraph
            .style_id
            .as_deref()
            .or(self.styles.default_paragraph_style.as_deref())
    }

    /// Effective numbering: the paragraph's own `numPr`, else the nearest one
    /// in its style chain. A removal (numId 0) at either place ends the search
    /// with no numbering.
    pub fn numbering<'p>(&'p self, paragraph: &'p Paragraph) -> Option<&'p NumberingRef> {
        let found = match &paragraph.numbering {
            Some(direct) => Some(direct),
            None => self.paragraph_style_id(paragraph).and_then(|style_id| {
                self.styles
                    .chain(style_id)
                    .into_iter()
                    .find_map(|style| style.numbering.as_ref())
            }),
        };
        found.filter(|numbering| !numbering.is_removal())
    }

    pub fn numbering_level(&self, numbering: &NumberingRef) -> Option<&'a NumberingLevel> {
        self.numbering.level(numbering)
    }

    fn resolve_paragraph<T>(
        &self,
        paragraph: &Paragraph,
        fallback: T,
        pick: impl Fn(&ParagraphProps) -> Option<T>,
    ) -> Resolved<T> {
        if let Some(value) = pick(&paragraph.props) {
            return Resolved::Defined {
                value,
                source: SourceLevel::Explicit,
            };
        }

        if let Some(style_id) = self.paragraph_style_id(paragraph) {
            for (depth, style) in self.styles.chain(style_id).into_iter().enumerate() {
                if let Some(value) = pick(&style.paragraph) {
                    let source = if depth == 0 {
                        SourceLevel::Style
                    } else {
                        SourceLevel::BasedOn { depth }
                    };
                    return Resolved::Defined { value, source };
                }
            }
        }

        if let Some(value) = self
            .numbering(paragraph)
            .and_then(|numbering| self.numbering.level(numbering))
            .and_then(|level| pick(&level.paragraph))
        {
            return Resolved::Defined {
                value,
                source: SourceLevel::Numbering,
            };
        }

        match pick(&self.styles.default_paragraph) {
            Some(value) => Resolved::Defined {
                value,
                source: SourceLevel::DocumentDefault,
            },
            None => Resolved::Undefined { fallback },
        }
    }

    fn resolve_run<T>(
        &self,
        paragraph: &Paragraph,
        run: &Run,
        fallback: T,
        pick: impl Fn(&RunProps) -> Option<T>,
    ) -> Resolved<T> {
        if let Some(value) = pick(&run.props) {
            return Resolved::Defined {
                value,
                source: SourceLevel::Explicit,
            };
        }

        if let Some(style_id) = run.style_id.as_deref() {
            for (depth, style) in self.styles.chain(style_id).into_iter().enumerate() {
                if let Some(value) = pick(&style.run) {
                    return Resolved::Defined {
                        value,
                        source: SourceLevel::CharacterStyle { depth },
                    };
                }
            }
        }

        if let Some(style_id) = self.paragraph_style_id(paragraph) {
            for (depth, style) in self.styles.chain(style_id).into_iter().enumerate() {
                if let Some(value) = pick(&style.run) {
                    let source = if depth == 0 {
                        SourceLevel::Style
                    } else {
                        SourceLevel::BasedOn { depth }
                    };
                    return Resolved::Defined { value, source };
                }
            }
        }

        match pick(&self.styles.default_run) {
            Some(value) => Resolved::Defined {
                value,
                source: SourceLevel::DocumentDefault,
            },
            None => Resolved::Undefined { fallback },
        }
    }

    pub fn font_name(&self, paragraph: &Paragraph, run: &Run) -> Resolved<String> {
        self.resolve_run(paragraph, run, self.fallbacks.font_name.clone(), |props| {
            props
                .font
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        })
    }

    /// Font size in points.
    pub fn font_size(&self, paragraph: &Paragraph, run: &Run) -> Resolved<f64> {
        self.resolve_run(paragraph, run, self.fallbacks.font_size_pt, |props| {
            props.size.as_deref().and_then(units::font_size_points)
        })
    }

    pub fn bold(&self, paragraph: &Paragraph, run: &Run) -> Resolved<bool> {
        self.resolve_run(paragraph, run, self.fallbacks.bold, |props| {
            props.bold.as_deref().and_then(units::on_off)
        })
    }

    pub fn alignment(&self, paragraph: &Paragraph) -> Resolved<Alignment> {
        self.resolve_paragraph(paragraph, self.fallbacks.alignment, |props| {
            props.justification.as_deref().and_then(units::alignment)
        })
    }

    /// Left indentation in centimeters.
    pub fn indent_left(&self, paragraph: &Paragraph) -> Resolved<f64> {
        self.resolve_paragraph(paragraph, self.fallbacks.indent_cm, |props| {
            props.indent_left.as_deref().and_then(units::length_cm)
        })
    }

    /// Right indentation in centimeters.
    pub fn indent_right(&self, paragraph: &Paragraph) -> Resolved<f64> {
        self.resolve_paragraph(paragraph, self.fallbacks.indent_cm, |props| {
            props.indent_right.as_deref().and_then(units::length_cm)
        })
    }

    pub fn first_line(&self, paragraph: &Paragraph) -> Resolved<FirstLine> {
        self.resolve_paragraph(paragraph, self.fallbacks.first_line, |props| {
            units::first_line(
                props.indent_first_line.as_deref(),
                props.indent_hanging.as_deref(),
            )
        })
    }

    pub fn line_spacing(&self, paragraph: &Paragraph) -> Resolved<LineSpacing> {
        self.resolve_paragraph(paragraph, self.fallbacks.line_spacing, |props| {
            props
                .spacing_line
                .as_deref()
                .and_then(|line| units::line_spacing(line, props.spacing_line_rule.as_deref()))
        })
    }

    /// Space before the paragraph in points.
    pub fn space_before(&self, paragraph: &Paragraph) -> Resolved<f64> {
        self.resolve_paragraph(paragraph, self.fallbacks.spacing_pt, |props| {
            props.spacing_before.as_deref().and_then(units::spacing_points)
        })
    }

    /// Space after the paragraph in points.
    pub fn space_after(&self, paragraph: &Paragraph) -> Resolved<f64> {
        self.resolve_paragraph(paragraph, self.fallbacks.spacing_pt, |props| {
            props.spacing_after.as_deref().and_then(units::spacing_points)
        })
    }
}
