// Minimal owned element tree over quick-xml events. Names are local names
// (namespace prefixes dropped), which is all WordprocessingML lookups need.

use crate::error::DocruleError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let attrs = start
            .attributes()
            .flatten()
            .filter_map(|attr| {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                let value = attr.unescape_value().ok()?.into_owned();
                Some((key, value))
            })
            .collect();
        Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attrs,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// `w:val` of the named child, the usual shape of a WordprocessingML property.
    pub fn child_val(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.attr("val"))
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn children_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Element> + 's {
        self.elements().filter(move |e| e.name == name)
    }

    /// Concatenated character data directly under this element.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Elements named `name` found below this one without descending into a
    /// match or into any element named in `stop`.
    pub fn find_shallow<'s>(&'s self, name: &str, stop: &[&str]) -> Vec<&'s Element> {
        let mut found = Vec::new();
        for child in self.elements() {
            if child.name == name {
                found.push(child);
            } else if !stop.contains(&child.name.as_str()) {
                found.extend(child.find_shallow(name, stop));
            }
        }
        found
    }

    /// Whether any descendant (or this element) is named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.name == name || self.elements().any(|e| e.contains(name))
    }
}

/// Parse a whole part into a synthetic root whose children are the part's
/// top-level elements.
pub fn parse(xml: &str, part: &str) -> Result<Element, DocruleError> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Element::default()];

    loop {
        let event = reader.read_event().map_err(|e| DocruleError::xml(part, e))?;
        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)),
            Event::Empty(start) => push_child(&mut stack, XmlNode::Element(Element::from_start(&start))),
            Event::End(_) => {
                let done = stack.pop();
                match done {
                    Some(element) if !stack.is_empty() => {
                        push_child(&mut stack, XmlNode::Element(element))
                    }
                    _ => {
                        return Err(DocruleError::xml(
                            part,
                            quick_xml::Error::UnexpectedToken("unbalanced end tag".to_string()),
                        ))
                    }
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| DocruleError::xml(part, e))?;
                if !text.is_empty() {
                    push_child(&mut stack, XmlNode::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_child(&mut stack, XmlNode::Text(text));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(DocruleError::xml(
            part,
            quick_xml::Error::UnexpectedEof("unclosed element".to_string()),
        ));
    }
    Ok(stack.pop().unwrap_or_default())
}

fn push_child(stack: &mut [Element], node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}
