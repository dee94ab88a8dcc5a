//! Attribute validators: pure comparisons of a resolved value against a
//! requirement. None of them look at the document.

use crate::cascade::Resolved;
use crate::config::Tolerances;
use crate::ruleset::{Alignment, FirstLine, LineSpacing, MarkerSuffix};
use anyhow::Result;
use regex::Regex;

/// Float comparisons at exactly the tolerance must pass despite rounding.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Ok,
    Mismatch(String),
    Undefined(String),
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Ok)
    }
}

fn within(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= tolerance + EPSILON
}

fn undefined(attribute: &str, fallback: impl std::fmt::Display) -> Verdict {
    Verdict::Undefined(format!(
        "could not determine {attribute} (would display as {fallback})"
    ))
}

pub fn font_name(expected: &str, actual: &Resolved<String>) -> Verdict {
    match actual {
        Resolved::Undefined { fallback } => undefined("font", fallback),
        Resolved::Defined { value, .. } if value.trim().eq_ignore_ascii_case(expected.trim()) => {
            Verdict::Ok
        }
        Resolved::Defined { value, .. } => {
            Verdict::Mismatch(format!("font {value}, expected {expected}"))
        }
    }
}

pub fn font_size(expected: f64, actual: &Resolved<f64>, tolerance: f64) -> Verdict {
    match actual {
        Resolved::Undefined { fallback } => undefined("font size", format!("{fallback:.1}pt")),
        Resolved::Defined { value, .. } if within(*value, expected, tolerance) => Verdict::Ok,
        Resolved::Defined { value, .. } => Verdict::Mismatch(format!(
            "font size {value:.1}pt, expected {expected:.1}pt"
        )),
    }
}

pub fn bold(expected: bool, actual: &Resolved<bool>) -> Verdict {
    let describe = |b: bool| if b { "bold" } else { "not bold" };
    match actual {
        Resolved::Undefined { fallback } => undefined("bold", describe(*fallback)),
        Resolved::Defined { value, .. } if *value == expected => Verdict::Ok,
        Resolved::Defined { value, .. } => Verdict::Mismatch(format!(
            "text is {}, expected {}",
            describe(*value),
            describe(expected)
        )),
    }
}

pub fn alignment(expected: Alignment, actual: &Resolved<Alignment>) -> Verdict {
    match actual {
        Resolved::Undefined { fallback } => undefined("alignment", fallback),
        Resolved::Defined { value, .. } if *value == expected => Verdict::Ok,
        Resolved::Defined { value, .. } => {
            Verdict::Mismatch(format!("alignment {value}, expected {expected}"))
        }
    }
}

/// Left or right indentation in centimeters.
pub fn indent(label: &str, expected: f64, actual: &Resolved<f64>, tolerance: f64) -> Verdict {
    match actual {
        Resolved::Undefined { fallback } => undefined(label, format!("{fallback:.2}cm")),
        Resolved::Defined { value, .. } if within(*value, expected, tolerance) => Verdict::Ok,
        Resolved::Defined { value, .. } => Verdict::Mismatch(format!(
            "{label} {value:.2}cm, expected {expected:.2}cm"
        )),
    }
}

pub fn first_line(expected: FirstLine, actual: &Resolved<FirstLine>, tolerance: f64) -> Verdict {
    let value = match actual {
        Resolved::Undefined { fallback } => return undefined("first-line indent", fallback),
        Resolved::Defined { value, .. } => *value,
    };
    let matches = match (expected, value) {
        (FirstLine::None, FirstLine::None) => true,
        (FirstLine::Indent(e), FirstLine::Indent(a)) | (FirstLine::Outdent(e), FirstLine::Outdent(a)) => {
            within(a, e, tolerance)
        }
        // A requirement of zero magnitude is the same as no indent
        (FirstLine::None, other) | (other, FirstLine::None) => {
            within(other.magnitude(), 0.0, tolerance)
        }
        _ => false,
    };
    if matches {
        Verdict::Ok
    } else {
        Verdict::Mismatch(format!("{value}, expected {expected}"))
    }
}

pub fn line_spacing(expected: LineSpacing, actual: &Resolved<LineSpacing>, tolerances: &Tolerances) -> Verdict {
    let value = match actual {
        Resolved::Undefined { fallback } => return undefined("line spacing", fallback),
        Resolved::Defined { value, .. } => *value,
    };
    let matches = match (expected, value) {
        (LineSpacing::Multiplier(e), LineSpacing::Multiplier(a)) => {
            within(a, e, tolerances.line_multiplier)
        }
        (LineSpacing::AtLeast(e), LineSpacing::AtLeast(a))
        | (LineSpacing::Exact(e), LineSpacing::Exact(a)) => within(a, e, tolerances.line_points),
        _ => false,
    };
    if matches {
        Verdict::Ok
    } else {
        Verdict::Mismatch(format!("line spacing {value}, expected {expected}"))
    }
}

/// Paragraph spacing before or after, in points.
pub fn spacing(label: &str, expected: f64, actual: &Resolved<f64>, tolerance: f64) -> Verdict {
    match actual {
        Resolved::Undefined { fallback } => undefined(label, format!("{fallback:.1}pt")),
        Resolved::Defined { value, .. } if within(*value, expected, tolerance) => Verdict::Ok,
        Resolved::Defined { value, .. } => Verdict::Mismatch(format!(
            "{label} {value:.1}pt, expected {expected:.1}pt"
        )),
    }
}

pub fn numbering_suffix(expected: MarkerSuffix, actual: Option<MarkerSuffix>) -> Verdict {
    match actual {
        None => Verdict::Undefined("could not determine the list marker".to_string()),
        Some(suffix) if suffix == expected => Verdict::Ok,
        Some(suffix) => Verdict::Mismatch(format!(
            "list marker ends with {suffix}, expected {expected}"
        )),
    }
}

/// Caption text pattern "<Label> <number> <dash> <description>". The number
/// may be chapter-qualified ("2.3"); the dash may be a hyphen, en dash or
/// em dash.
pub fn caption_pattern(label: &str) -> Result<Regex> {
    let pattern = format!(
        r"^{}\s+(\d+(?:\.\d+)*)\s*[-–—]\s*\S.*$",
        regex::escape(label.trim())
    );
    Ok(Regex::new(&pattern)?)
}

pub fn caption_format(pattern: &Regex, label: &str, text: &str) -> Verdict {
    if pattern.is_match(text.trim()) {
        Verdict::Ok
    } else {
        Verdict::Mismatch(format!(
            "caption should read \"{label} <number> - <title>\""
        ))
    }
}

/// The caption number split into its chapter prefix and final component
/// ("2.3" -> ("2", 3), "7" -> ("", 7)), when the text matches.
pub fn caption_number(pattern: &Regex, text: &str) -> Option<(String, u32)> {
    let captures = pattern.captures(text.trim())?;
    let number = captures.get(1)?.as_str();
    let (prefix, last) = number.rsplit_once('.').unwrap_or(("", number));
    Some((prefix.to_string(), last.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::SourceLevel;

    const EPS: f64 = 1e-4;

    fn defined<T>(value: T) -> Resolved<T> {
        Resolved::Defined {
            value,
            source: SourceLevel::Explicit,
        }
    }

    fn assert_boundary(tolerance: f64, check: impl Fn(f64) -> Verdict) {
        assert!(check(14.0 + tolerance - EPS).is_ok(), "inside +{tolerance}");
        assert!(check(14.0 - tolerance + EPS).is_ok(), "inside -{tolerance}");
        assert!(matches!(check(14.0 + tolerance + EPS), Verdict::Mismatch(_)), "outside +{tolerance}");
        assert!(matches!(check(14.0 - tolerance - EPS), Verdict::Mismatch(_)), "outside -{tolerance}");
    }

    #[test]
    fn tolerance_boundaries_for_every_numeric_category() {
        let t = Tolerances::default();

        assert_boundary(t.font_size_pt, |a| font_size(14.0, &defined(a), t.font_size_pt));
        assert_boundary(t.indent_cm, |a| indent("left indent", 14.0, &defined(a), t.indent_cm));
        assert_boundary(t.spacing_pt, |a| spacing("spacing after", 14.0, &defined(a), t.spacing_pt));
        assert_boundary(t.spacing_pt_strict, |a| {
            spacing("spacing after", 14.0, &defined(a), t.spacing_pt_strict)
        });
        assert_boundary(t.line_multiplier, |a| {
            line_spacing(LineSpacing::Multiplier(14.0), &defined(LineSpacing::Multiplier(a)), &t)
        });
        assert_boundary(t.line_points, |a| {
            line_spacing(LineSpacing::Exact(14.0), &defined(LineSpacing::Exact(a)), &t)
        });
        assert_boundary(t.indent_cm, |a| {
            first_line(FirstLine::Indent(14.0), &defined(FirstLine::Indent(a)), t.indent_cm)
        });
    }

    #[test]
    fn undefined_is_never_ok_even_when_fallback_matches() {
        let actual = Resolved::Undefined { fallback: 14.0 };
        assert!(matches!(font_size(14.0, &actual, 0.1), Verdict::Undefined(_)));
        let name = Resolved::Undefined {
            fallback: "Arial".to_string(),
        };
        assert!(matches!(font_name("Arial", &name), Verdict::Undefined(_)));
    }

    #[test]
    fn font_names_compare_case_insensitively() {
        assert!(font_name("Times New Roman", &defined("times new roman".to_string())).is_ok());
        assert!(!font_name("Arial", &defined("Arial Narrow".to_string())).is_ok());
    }

    #[test]
    fn line_spacing_type_must_match() {
        let t = Tolerances::default();
        let verdict = line_spacing(LineSpacing::Multiplier(1.0), &defined(LineSpacing::Exact(12.0)), &t);
        assert!(matches!(verdict, Verdict::Mismatch(_)));
    }

    #[test]
    fn first_line_kinds() {
        assert!(first_line(FirstLine::None, &defined(FirstLine::None), 0.05).is_ok());
        assert!(first_line(FirstLine::None, &defined(FirstLine::Indent(0.02)), 0.05).is_ok());
        assert!(!first_line(FirstLine::Indent(1.25), &defined(FirstLine::Outdent(1.25)), 0.05).is_ok());
        assert!(!first_line(FirstLine::Indent(1.25), &defined(FirstLine::None), 0.05).is_ok());
    }

    #[test]
    fn caption_text_format() {
        let pattern = caption_pattern("Table").unwrap();
        assert!(caption_format(&pattern, "Table", "Table 3 - Revenue by quarter").is_ok());
        assert!(caption_format(&pattern, "Table", "Table 2.1 – Costs").is_ok());
        assert!(matches!(
            caption_format(&pattern, "Table", "Table – Revenue"),
            Verdict::Mismatch(_)
        ));
        assert!(!caption_format(&pattern, "Table", "Table 4 -").is_ok());
        assert_eq!(caption_number(&pattern, "Table 2.3 - Costs"), Some(("2".to_string(), 3)));
        assert_eq!(caption_number(&pattern, "Table 7 - Costs"), Some((String::new(), 7)));
    }

    #[test]
    fn numbering_suffix_classes() {
        assert!(numbering_suffix(MarkerSuffix::Dot, Some(MarkerSuffix::Dot)).is_ok());
        assert!(matches!(
            numbering_suffix(MarkerSuffix::Dot, Some(MarkerSuffix::Parenthesis)),
            Verdict::Mismatch(_)
        ));
        assert!(matches!(numbering_suffix(MarkerSuffix::Dot, None), Verdict::Undefined(_)));
    }
}
