//! Unit normalizer: native WordprocessingML measurements to canonical units.
//!
//! Lengths become centimeters, typography becomes points and "auto" line
//! spacing becomes a unitless multiplier. Every function returns `None` for a
//! missing or malformed value instead of failing, so the cascade can keep
//! looking further up the chain.

use crate::ruleset::{Alignment, FirstLine, LineSpacing};

pub const TWIPS_PER_POINT: f64 = 20.0;
pub const TWIPS_PER_INCH: f64 = 1440.0;
pub const CM_PER_INCH: f64 = 2.54;
/// `w:spacing/@line` units per single line when the rule is "auto"
pub const LINE_UNITS_PER_LINE: f64 = 240.0;

/// Parse a length in twips. Plain numbers are twips; universal measures with
/// a unit suffix ("2.5cm", "12pt", "1in", "10mm", "1pc", "1pi") are converted.
pub fn parse_twips(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let split = raw
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let twips = match unit.trim().to_ascii_lowercase().as_str() {
        "" => value,
        "pt" => value * TWIPS_PER_POINT,
        "in" => value * TWIPS_PER_INCH,
        "cm" => value / CM_PER_INCH * TWIPS_PER_INCH,
        "mm" => value / (CM_PER_INCH * 10.0) * TWIPS_PER_INCH,
        "pc" | "pi" => value * 12.0 * TWIPS_PER_POINT,
        _ => return None,
    };
    Some(twips)
}

pub fn twips_to_cm(twips: f64) -> f64 {
    twips / TWIPS_PER_INCH * CM_PER_INCH
}

pub fn cm_to_twips(cm: f64) -> f64 {
    cm / CM_PER_INCH * TWIPS_PER_INCH
}

/// Native length (twips or universal measure) to centimeters.
pub fn length_cm(raw: &str) -> Option<f64> {
    parse_twips(raw).map(twips_to_cm)
}

/// Native spacing (twips) to points.
pub fn spacing_points(raw: &str) -> Option<f64> {
    parse_twips(raw).map(|twips| twips / TWIPS_PER_POINT)
}

/// Font size in half-points to points.
pub fn font_size_points(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.ends_with("pt") {
        return spacing_points(raw);
    }
    let half_points: f64 = raw.parse().ok()?;
    (half_points.is_finite() && half_points > 0.0).then_some(half_points / 2.0)
}

/// OOXML on/off toggle. An empty value means the element was present with no
/// `w:val`, which switches the property on.
pub fn on_off(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" | "none" => Some(false),
        _ => None,
    }
}

/// `w:jc` value to the closed alignment set.
pub fn alignment(raw: &str) -> Option<Alignment> {
    match raw.trim() {
        "left" | "start" => Some(Alignment::Start),
        "center" => Some(Alignment::Center),
        "right" | "end" => Some(Alignment::End),
        "both" | "distribute" | "justify" | "lowKashida" | "mediumKashida" | "highKashida"
        | "thaiDistribute" => Some(Alignment::Justify),
        _ => None,
    }
}

/// `w:spacing/@line` + `@lineRule` to a line-spacing rule. A missing rule
/// means "auto".
pub fn line_spacing(line: &str, rule: Option<&str>) -> Option<LineSpacing> {
    let value: f64 = line.trim().parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    match rule.map(str::trim).unwrap_or("auto") {
        "auto" => Some(LineSpacing::Multiplier(value / LINE_UNITS_PER_LINE)),
        "atLeast" => Some(LineSpacing::AtLeast(value / TWIPS_PER_POINT)),
        "exact" => Some(LineSpacing::Exact(value / TWIPS_PER_POINT)),
        _ => None,
    }
}

/// First-line indentation from `w:ind/@firstLine` and `@hanging`, both twips.
/// A hanging value wins over a first-line value, as in Word.
pub fn first_line(first_line: Option<&str>, hanging: Option<&str>) -> Option<FirstLine> {
    if let Some(cm) = hanging.and_then(length_cm) {
        return Some(if cm.abs() < f64::EPSILON {
            FirstLine::None
        } else {
            FirstLine::Outdent(cm.abs())
        });
    }
    let cm = first_line.and_then(length_cm)?;
    Some(if cm.abs() < f64::EPSILON {
        FirstLine::None
    } else if cm > 0.0 {
        FirstLine::Indent(cm)
    } else {
        FirstLine::Outdent(-cm)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn twips_and_universal_measures() {
        assert!(close(length_cm("567").unwrap(), 567.0 / 1440.0 * 2.54));
        assert!(close(length_cm("2.5cm").unwrap(), 2.5));
        assert!(close(length_cm("25mm").unwrap(), 2.5));
        assert!(close(length_cm("1in").unwrap(), 2.54));
        assert!(close(spacing_points("240").unwrap(), 12.0));
        assert!(close(spacing_points("6pt").unwrap(), 6.0));
    }

    #[test]
    fn malformed_values_are_undefined() {
        assert_eq!(length_cm(""), None);
        assert_eq!(length_cm("abc"), None);
        assert_eq!(length_cm("12furlongs"), None);
        assert_eq!(font_size_points("big"), None);
        assert_eq!(font_size_points("-4"), None);
        assert_eq!(line_spacing("360", Some("sideways")), None);
        assert_eq!(alignment("diagonal"), None);
        assert_eq!(on_off("maybe"), None);
    }

    #[test]
    fn font_sizes_are_half_points() {
        assert_eq!(font_size_points("28"), Some(14.0));
        assert_eq!(font_size_points("23"), Some(11.5));
    }

    #[test]
    fn line_spacing_rules() {
        assert_eq!(line_spacing("360", None), Some(LineSpacing::Multiplier(1.5)));
        assert_eq!(line_spacing("276", Some("auto")), Some(LineSpacing::Multiplier(1.15)));
        assert_eq!(line_spacing("240", Some("exact")), Some(LineSpacing::Exact(12.0)));
        assert_eq!(line_spacing("360", Some("atLeast")), Some(LineSpacing::AtLeast(18.0)));
    }

    #[test]
    fn first_line_classification() {
        assert_eq!(first_line(Some("0"), None), Some(FirstLine::None));
        assert_eq!(first_line(None, None), None);
        match first_line(Some("709"), None) {
            Some(FirstLine::Indent(cm)) => assert!((cm - 1.25).abs() < 0.01),
            other => panic!("unexpected {other:?}"),
        }
        match first_line(Some("709"), Some("360")) {
            Some(FirstLine::Outdent(cm)) => assert!((cm - 0.635).abs() < 0.001),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn toggles() {
        assert_eq!(on_off(""), Some(true));
        assert_eq!(on_off("0"), Some(false));
        assert_eq!(on_off("true"), Some(true));
    }
}
