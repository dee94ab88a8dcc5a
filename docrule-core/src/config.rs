use crate::ruleset::{Alignment, FirstLine, LineSpacing};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Engine configuration. Separate from rulesets: a ruleset says what a
/// standard requires, this says how the engine measures and classifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub tolerances: Tolerances,
    pub fallbacks: FallbackDefaults,
    pub classifier: ClassifierConfig,
    pub report: ReportConfig,
    /// Run checkers on the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            fallbacks: FallbackDefaults::default(),
            classifier: ClassifierConfig::default(),
            report: ReportConfig::default(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Font size, points
    pub font_size_pt: f64,
    /// Left/right/first-line indentation, centimeters
    pub indent_cm: f64,
    /// Page margins, centimeters
    pub margin_cm: f64,
    /// Multiplier line spacing, unitless
    pub line_multiplier: f64,
    /// At-least/exact line spacing, points (one twip)
    pub line_points: f64,
    /// Paragraph spacing for body text, lists, TOC and table text, points
    pub spacing_pt: f64,
    /// Paragraph spacing for headings and captions, points
    pub spacing_pt_strict: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            font_size_pt: 0.1,
            indent_cm: 0.05,
            margin_cm: 0.05,
            line_multiplier: 0.01,
            line_points: 0.05,
            spacing_pt: 0.1,
            spacing_pt_strict: 0.01,
        }
    }
}

/// Values used when the cascade finds nothing. They only ever feed the
/// displayed "actual" value of an undefined attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackDefaults {
    pub font_name: String,
    pub font_size_pt: f64,
    pub bold: bool,
    pub alignment: Alignment,
    pub indent_cm: f64,
    pub first_line: FirstLine,
    pub line_spacing: LineSpacing,
    pub spacing_pt: f64,
}

impl Default for FallbackDefaults {
    fn default() -> Self {
        Self {
            font_name: "Times New Roman".to_string(),
            font_size_pt: 10.0,
            bold: false,
            alignment: Alignment::Start,
            indent_cm: 0.0,
            first_line: FirstLine::None,
            line_spacing: LineSpacing::Multiplier(1.0),
            spacing_pt: 0.0,
        }
    }
}

fn default_bullet_patterns() -> Vec<String> {
    vec![
        "•".to_string(),
        "·".to_string(),
        "●".to_string(),
        "■".to_string(),
        "▪".to_string(),
        "◦".to_string(),
        "‣".to_string(),
        "⁃".to_string(),
        "-".to_string(),
        "–".to_string(),
        "—".to_string(),
        "*".to_string(),
        "→".to_string(),
        "✓".to_string(),
    ]
}

fn default_numbered_patterns() -> Vec<String> {
    vec![
        r"^\d+[.)]\s".to_string(),       // 1. 2) 3.
        r"^\(\d+\)\s".to_string(),       // (1) (2)
        r"^[a-zа-я][.)]\s".to_string(),  // a) б.
        r"^[ivx]+[.)]\s".to_string(),    // i. ii)
    ]
}

/// Style ids and text heuristics the classifier relies on. Style ids are
/// compared after normalization (lowercase, no spaces, dashes or underscores),
/// against both the style id and its display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Styles marking a top-level heading
    pub heading_styles: Vec<String>,
    /// Style prefix for outline headings; the trailing digit is the level
    pub heading_style_prefix: String,
    pub list_style_prefixes: Vec<String>,
    pub toc_style_prefixes: Vec<String>,
    /// Styles that never count as plain text
    pub skip_styles: Vec<String>,
    pub bullet_patterns: Vec<String>,
    pub numbered_patterns: Vec<String>,
    pub numbered_heading_pattern: String,
    pub chapter_pattern: String,
    pub appendix_pattern: String,
    pub toc_entry_pattern: String,
    /// Text prefixes that mark a caption-like paragraph
    pub caption_prefixes: Vec<String>,
    /// Half-width of the band around a configured list-level indent, cm
    pub level_indent_band_cm: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            heading_styles: vec!["heading1".to_string(), "title".to_string()],
            heading_style_prefix: "heading".to_string(),
            list_style_prefixes: vec![
                "listparagraph".to_string(),
                "listbullet".to_string(),
                "listnumber".to_string(),
            ],
            toc_style_prefixes: vec!["toc".to_string(), "contents".to_string()],
            skip_styles: vec![
                "header".to_string(),
                "footer".to_string(),
                "caption".to_string(),
                "footnotetext".to_string(),
                "endnotetext".to_string(),
                "tocheading".to_string(),
            ],
            bullet_patterns: default_bullet_patterns(),
            numbered_patterns: default_numbered_patterns(),
            numbered_heading_pattern: r"^\d+(?:\.\d+)+\.?\s+\S".to_string(),
            chapter_pattern: r"(?i)^chapter\s+\d+\b".to_string(),
            appendix_pattern: r"^APPENDIX\s+\p{Lu}\b".to_string(),
            toc_entry_pattern: r"(?:\.{3,}|…+|\t)\s*\d+\s*$".to_string(),
            caption_prefixes: vec![
                "Figure".to_string(),
                "Fig.".to_string(),
                "Table".to_string(),
            ],
            level_indent_band_cm: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Violations listed per category before "+N more"
    pub max_listed: usize,
    /// Length of the text excerpt attached to a violation, in characters
    pub excerpt_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_listed: 5,
            excerpt_chars: 40,
        }
    }
}

impl CheckConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading check config {path}"))?;
        let config: CheckConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing check config {path}"))?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                log::warn!("failed to load config from {p}, using defaults: {e:#}");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: CheckConfig = serde_yaml::from_str(
            r#"
tolerances:
  font_size_pt: 0.5
fallbacks:
  font_name: Arial
"#,
        )
        .unwrap();
        assert_eq!(config.tolerances.font_size_pt, 0.5);
        assert_eq!(config.tolerances.indent_cm, 0.05);
        assert_eq!(config.fallbacks.font_name, "Arial");
        assert_eq!(config.fallbacks.font_size_pt, 10.0);
        assert_eq!(config.report.max_listed, 5);
        assert!(config.parallel);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = CheckConfig::load_with_fallback(Some("/definitely/not/here.yaml"));
        assert_eq!(config.classifier.level_indent_band_cm, 0.5);
    }
}
