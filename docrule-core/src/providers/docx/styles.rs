use super::super::xml_tree::{self, Element};
use super::body::{numbering_ref, paragraph_props, run_props};
use super::{NUMBERING_PART, STYLES_PART};
use crate::document::{NumberingLevel, NumberingTable, StyleDefinition, StyleKind, StyleTable};
use crate::error::DocruleError;
use crate::units;
use std::collections::HashMap;

/// `word/styles.xml`: document defaults plus every style definition.
pub(super) fn parse_styles(xml: &str) -> Result<StyleTable, DocruleError> {
    let root = xml_tree::parse(xml, STYLES_PART)?;
    let mut table = StyleTable::default();
    let Some(styles) = root.child("styles") else {
        return Ok(table);
    };

    if let Some(defaults) = styles.child("docDefaults") {
        if let Some(ppr) = defaults.child("pPrDefault").and_then(|d| d.child("pPr")) {
            table.default_paragraph = paragraph_props(ppr);
        }
        if let Some(rpr) = defaults.child("rPrDefault").and_then(|d| d.child("rPr")) {
            table.default_run = run_props(rpr);
        }
    }

    for element in styles.children_named("style") {
        let Some(style) = parse_style(element) else {
            continue;
        };
        let is_default = element.attr("default").and_then(units::on_off) == Some(true);
        if is_default && style.kind == StyleKind::Paragraph {
            table.default_paragraph_style = Some(style.id.clone());
        }
        table.insert(style);
    }

    log::debug!(
        "parsed {} styles (default paragraph style: {})",
        table.styles.len(),
        table.default_paragraph_style.as_deref().unwrap_or("none")
    );
    Ok(table)
}

fn parse_style(element: &Element) -> Option<StyleDefinition> {
    let id = element.attr("styleId")?;
    let kind = match element.attr("type").unwrap_or("paragraph") {
        "character" => StyleKind::Character,
        "table" => StyleKind::Table,
        "numbering" => StyleKind::Numbering,
        _ => StyleKind::Paragraph,
    };
    let mut style = StyleDefinition::new(id, kind);
    style.name = element.child_val("name").map(str::to_string);
    style.based_on = element.child_val("basedOn").map(str::to_string);
    if let Some(ppr) = element.child("pPr") {
        style.paragraph = paragraph_props(ppr);
        style.numbering = ppr.child("numPr").and_then(numbering_ref);
    }
    if let Some(rpr) = element.child("rPr") {
        style.run = run_props(rpr);
    }
    Some(style)
}

/// `word/numbering.xml`: abstract definitions with their levels, and the
/// numbering instances that point at them.
pub(super) fn parse_numbering(xml: &str) -> Result<NumberingTable, DocruleError> {
    let root = xml_tree::parse(xml, NUMBERING_PART)?;
    let mut table = NumberingTable::default();
    let Some(numbering) = root.child("numbering") else {
        return Ok(table);
    };

    for abstract_num in numbering.children_named("abstractNum") {
        let Some(abstract_id) = abstract_num.attr("abstractNumId") else {
            continue;
        };
        let mut levels = HashMap::new();
        for lvl in abstract_num.children_named("lvl") {
            let Some(index) = lvl.attr("ilvl").and_then(|v| v.trim().parse::<u8>().ok()) else {
                continue;
            };
            levels.insert(
                index,
                NumberingLevel {
                    format: lvl.child_val("numFmt").unwrap_or_default().to_string(),
                    text: lvl.child_val("lvlText").unwrap_or_default().to_string(),
                    paragraph: lvl.child("pPr").map(paragraph_props).unwrap_or_default(),
                },
            );
        }
        table.abstracts.insert(abstract_id.to_string(), levels);
    }

    for num in numbering.children_named("num") {
        if let (Some(num_id), Some(abstract_id)) = (num.attr("numId"), num.child_val("abstractNumId")) {
            table
                .instances
                .insert(num_id.to_string(), abstract_id.to_string());
        }
    }

    Ok(table)
}
