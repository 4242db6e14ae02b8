//! Minimal owned XML tree for WordprocessingML parts.
//!
//! Attribute values are kept in their escaped source form and written back
//! verbatim. Text nodes are unescaped on read and escaped on write.

use crate::error::{ContractError, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    Declaration(String),
    Instruction(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    #[cfg(test)]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.is(name))
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Concatenated direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub prolog: Vec<Node>,
    pub root: Element,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(xml_error)?;

            let node = match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                    continue;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        ContractError::Xml("closing tag without matching start".to_string())
                    })?;
                    Node::Element(element)
                }
                Event::Empty(start) => Node::Element(element_from_start(&start)?),
                Event::Text(text) => {
                    let value = text.unescape().map_err(xml_error)?;
                    Node::Text(value.into_owned())
                }
                Event::CData(data) => Node::CData(String::from_utf8_lossy(&data).into_owned()),
                Event::Comment(comment) => {
                    Node::Comment(String::from_utf8_lossy(&comment).into_owned())
                }
                Event::Decl(decl) => Node::Declaration(String::from_utf8_lossy(&decl).into_owned()),
                Event::PI(pi) => Node::Instruction(String::from_utf8_lossy(&pi).into_owned()),
                Event::DocType(doctype) => {
                    Node::DocType(String::from_utf8_lossy(&doctype).into_owned())
                }
                Event::Eof => break,
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    Node::Element(element) if root.is_none() => root = Some(element),
                    Node::Element(_) => {
                        return Err(ContractError::Xml(
                            "more than one root element".to_string(),
                        ))
                    }
                    other if root.is_none() => prolog.push(other),
                    // Whitespace or comments after the root are not kept.
                    _ => {}
                },
            }
        }

        if !stack.is_empty() {
            return Err(ContractError::Xml(format!(
                "unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }

        let root =
            root.ok_or_else(|| ContractError::Xml("document has no root element".to_string()))?;
        Ok(Self { prolog, root })
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.prolog {
            write_node(&mut out, node);
        }
        write_element(&mut out, &self.root);
        out
    }
}

fn xml_error(err: impl std::fmt::Display) -> ContractError {
    ContractError::Xml(err.to_string())
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ContractError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => out.push_str(&escape(text.as_str())),
        Node::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Declaration(decl) | Node::Instruction(decl) => {
            out.push_str("<?");
            out.push_str(decl);
            out.push_str("?>");
        }
        Node::DocType(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}
