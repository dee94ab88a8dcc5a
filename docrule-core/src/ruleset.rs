//! Ruleset records: the expected formatting for every structural context.
//!
//! Every requirement is an `Option`. `None` means "no requirement, skip this
//! check". It never means "use the default"; defaults only exist on the
//! *actual* side of a comparison (see `config::FallbackDefaults`).

use serde::de::{self, IgnoredAny};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Highest list nesting level a ruleset can describe.
pub const MAX_LIST_LEVEL: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Start,
    Center,
    End,
    Justify,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Alignment::Start => "start",
            Alignment::Center => "center",
            Alignment::End => "end",
            Alignment::Justify => "justify",
        };
        f.write_str(label)
    }
}

/// Line spacing as a closed set of rules. Multipliers are unitless, the
/// point-based variants carry points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSpacing {
    Multiplier(f64),
    AtLeast(f64),
    Exact(f64),
}

impl LineSpacing {
    pub fn kind(&self) -> &'static str {
        match self {
            LineSpacing::Multiplier(_) => "multiplier",
            LineSpacing::AtLeast(_) => "at-least",
            LineSpacing::Exact(_) => "exact",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            LineSpacing::Multiplier(v) | LineSpacing::AtLeast(v) | LineSpacing::Exact(v) => *v,
        }
    }
}

impl fmt::Display for LineSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSpacing::Multiplier(v) => write!(f, "multiplier {v:.2}"),
            LineSpacing::AtLeast(v) => write!(f, "at least {v:.2}pt"),
            LineSpacing::Exact(v) => write!(f, "exactly {v:.2}pt"),
        }
    }
}

/// First-line indentation. Magnitudes are centimeters and always positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstLine {
    None,
    Indent(f64),
    Outdent(f64),
}

impl FirstLine {
    pub fn kind(&self) -> &'static str {
        match self {
            FirstLine::None => "none",
            FirstLine::Indent(_) => "indent",
            FirstLine::Outdent(_) => "outdent",
        }
    }

    pub fn magnitude(&self) -> f64 {
        match self {
            FirstLine::None => 0.0,
            FirstLine::Indent(v) | FirstLine::Outdent(v) => *v,
        }
    }
}

impl fmt::Display for FirstLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirstLine::None => f.write_str("no first-line indent"),
            FirstLine::Indent(v) => write!(f, "first-line indent {v:.2}cm"),
            FirstLine::Outdent(v) => write!(f, "hanging indent {v:.2}cm"),
        }
    }
}

/// Terminal character class of a list number ("1." / "1)" / "1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSuffix {
    Dot,
    Parenthesis,
    Bare,
}

impl MarkerSuffix {
    /// Classify the terminal character of a marker token or level template.
    pub fn classify(marker: &str) -> Self {
        match marker.trim_end().chars().last() {
            Some('.') => MarkerSuffix::Dot,
            Some(')') => MarkerSuffix::Parenthesis,
            _ => MarkerSuffix::Bare,
        }
    }
}

impl fmt::Display for MarkerSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarkerSuffix::Dot => "'.'",
            MarkerSuffix::Parenthesis => "')'",
            MarkerSuffix::Bare => "no suffix",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePosition {
    Header,
    Footer,
}

impl fmt::Display for PagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagePosition::Header => f.write_str("header"),
            PagePosition::Footer => f.write_str("footer"),
        }
    }
}

/// Catch-all for the keys a rule group with a flattened `format` leaves
/// unclaimed. Any leftover key fails deserialization, so a misspelled
/// requirement is an error instead of a silently skipped check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoUnknownKeys;

impl<'de> Deserialize<'de> for NoUnknownKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rest = BTreeMap::<String, IgnoredAny>::deserialize(deserializer)?;
        match rest.keys().next() {
            None => Ok(NoUnknownKeys),
            Some(key) => Err(de::Error::custom(format!("unknown field `{key}`"))),
        }
    }
}

impl Serialize for NoUnknownKeys {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

/// Formatting requirements shared by every paragraph context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParagraphRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_left_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_right_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line: Option<FirstLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<LineSpacing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_before_pt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_after_pt: Option<f64>,
}

impl ParagraphRules {
    /// True when no field carries a requirement.
    pub fn is_empty(&self) -> bool {
        self.font_name.is_none()
            && self.font_size.is_none()
            && self.bold.is_none()
            && self.alignment.is_none()
            && self.indent_left_cm.is_none()
            && self.indent_right_cm.is_none()
            && self.first_line.is_none()
            && self.line_spacing.is_none()
            && self.space_before_pt.is_none()
            && self.space_after_pt.is_none()
    }

    pub fn has_run_requirements(&self) -> bool {
        self.font_name.is_some() || self.font_size.is_some() || self.bold.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingRules {
    #[serde(flatten)]
    pub format: ParagraphRules,
    /// Section titles that must appear as headings, compared case-insensitively
    /// after a leading section number is stripped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_sections: Vec<String>,
    #[serde(flatten)]
    pub unknown_keys: NoUnknownKeys,
}

impl HeadingRules {
    pub fn is_empty(&self) -> bool {
        self.format.is_empty() && self.required_sections.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListLevelRules {
    #[serde(flatten)]
    pub format: ParagraphRules,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<MarkerSuffix>,
    #[serde(flatten)]
    pub unknown_keys: NoUnknownKeys,
}

impl ListLevelRules {
    pub fn is_empty(&self) -> bool {
        self.format.is_empty() && self.suffix.is_none()
    }
}

/// Per-level list requirements, keyed by level 1..=9.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListRules {
    pub levels: BTreeMap<u8, ListLevelRules>,
}

impl ListRules {
    pub fn level(&self, level: u8) -> Option<&ListLevelRules> {
        self.levels.get(&level).filter(|rules| !rules.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.levels
            .iter()
            .filter(|(level, _)| (1..=MAX_LIST_LEVEL).contains(*level))
            .all(|(_, rules)| rules.is_empty())
    }

    /// Configured left indents per level, used by the classifier to infer a
    /// level when a paragraph carries no numbering metadata.
    pub fn level_indents(&self) -> Vec<(u8, f64)> {
        self.levels
            .iter()
            .filter(|(level, _)| (1..=MAX_LIST_LEVEL).contains(*level))
            .filter_map(|(level, rules)| rules.format.indent_left_cm.map(|cm| (*level, cm)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionRules {
    #[serde(flatten)]
    pub format: ParagraphRules,
    /// Caption label ("Figure", "Table"). Falls back to the context's
    /// conventional label when the text format is checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_format: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential_numbering: Option<bool>,
    #[serde(flatten)]
    pub unknown_keys: NoUnknownKeys,
}

impl CaptionRules {
    pub fn is_empty(&self) -> bool {
        self.format.is_empty()
            && self.check_format != Some(true)
            && self.sequential_numbering != Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TocRules {
    #[serde(flatten)]
    pub format: ParagraphRules,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(flatten)]
    pub unknown_keys: NoUnknownKeys,
}

impl TocRules {
    pub fn is_empty(&self) -> bool {
        self.format.is_empty() && self.required != Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSetupRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_top_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_bottom_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_left_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_right_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_numbers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number_position: Option<PagePosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number_alignment: Option<Alignment>,
}

impl PageSetupRules {
    pub fn has_margin_requirements(&self) -> bool {
        self.margin_top_cm.is_some()
            || self.margin_bottom_cm.is_some()
            || self.margin_left_cm.is_some()
            || self.margin_right_cm.is_some()
    }

    pub fn has_numbering_requirements(&self) -> bool {
        self.page_numbers.is_some()
            || self.page_number_position.is_some()
            || self.page_number_alignment.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_margin_requirements() && !self.has_numbering_requirements()
    }
}

/// One checkable standard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ruleset {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub plain_text: ParagraphRules,
    pub heading: HeadingRules,
    pub subheading: ParagraphRules,
    pub lists: ListRules,
    pub image_caption: CaptionRules,
    pub table_caption: CaptionRules,
    pub table_text: ParagraphRules,
    pub toc: TocRules,
    pub page_setup: PageSetupRules,
}

impl Ruleset {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_no_requirement() {
        let yaml = r#"
id: minimal
plain_text:
  font_size: 14
  line_spacing:
    multiplier: 1.5
  first_line:
    indent: 1.25
heading:
  bold: true
  required_sections: [Introduction, Conclusion]
lists:
  levels:
    2:
      indent_left_cm: 2.5
      suffix: parenthesis
"#;
        let ruleset: Ruleset = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ruleset.plain_text.font_size, Some(14.0));
        assert_eq!(ruleset.plain_text.font_name, None);
        assert_eq!(ruleset.plain_text.line_spacing, Some(LineSpacing::Multiplier(1.5)));
        assert_eq!(ruleset.plain_text.first_line, Some(FirstLine::Indent(1.25)));
        assert_eq!(ruleset.heading.format.bold, Some(true));
        assert_eq!(ruleset.heading.required_sections.len(), 2);
        assert_eq!(ruleset.lists.level_indents(), vec![(2, 2.5)]);
        assert_eq!(
            ruleset.lists.level(2).and_then(|l| l.suffix),
            Some(MarkerSuffix::Parenthesis)
        );
        assert!(ruleset.table_text.is_empty());
        assert!(ruleset.toc.is_empty());
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        let direct = serde_yaml::from_str::<Ruleset>("id: x\nplain_text:\n  font_sise: 14\n");
        assert!(direct.unwrap_err().to_string().contains("font_sise"));

        // Groups with a flattened format block
        for yaml in [
            "id: x\nheading:\n  font_sise: 14\n",
            "id: x\ntable_caption:\n  lable: Table\n",
            "id: x\ntoc:\n  requried: true\n",
            "id: x\nlists:\n  levels:\n    1:\n      sufix: dot\n",
            "id: x\npage_setup:\n  margin_top: 2\n",
            "id: x\nplaintext:\n  font_size: 14\n",
        ] {
            assert!(serde_yaml::from_str::<Ruleset>(yaml).is_err(), "accepted: {yaml}");
        }
    }

    #[test]
    fn flattened_groups_still_read_their_format_keys() {
        let ruleset: Ruleset = serde_yaml::from_str(
            "id: x\ntable_caption:\n  font_size: 12\n  label: Table\n  check_format: true\n",
        )
        .unwrap();
        assert_eq!(ruleset.table_caption.format.font_size, Some(12.0));
        assert_eq!(ruleset.table_caption.label.as_deref(), Some("Table"));

        let yaml = serde_yaml::to_string(&ruleset).unwrap();
        assert!(!yaml.contains("unknown_keys"));
        assert_eq!(serde_yaml::from_str::<Ruleset>(&yaml).unwrap(), ruleset);
    }

    #[test]
    fn unit_variant_first_line_parses_from_plain_string() {
        let rules: ParagraphRules = serde_yaml::from_str("first_line: none").unwrap();
        assert_eq!(rules.first_line, Some(FirstLine::None));
    }

    #[test]
    fn marker_suffix_classification() {
        assert_eq!(MarkerSuffix::classify("%1."), MarkerSuffix::Dot);
        assert_eq!(MarkerSuffix::classify("%1)"), MarkerSuffix::Parenthesis);
        assert_eq!(MarkerSuffix::classify("%1"), MarkerSuffix::Bare);
    }

    #[test]
    fn caption_rules_with_only_flags_off_are_empty() {
        let rules = CaptionRules {
            check_format: Some(false),
            ..CaptionRules::default()
        };
        assert!(rules.is_empty());
    }
}
