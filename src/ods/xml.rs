use std::borrow::Cow;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::Error;

/// Owned XML node. Names are kept qualified (`table:table-cell`) so that a
/// document can be written back with the prefixes it was read with.
#[derive(Clone, Debug, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    /// Placeholder filled in by the caller at write time.
    Slot,
}

impl XmlNode {
    pub fn collect_text(&self, out: &mut String) {
        match self {
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Element(e) => {
                for child in &e.children {
                    child.collect_text(out);
                }
            }
            XmlNode::Slot => {}
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    /// `xmlns` declarations introduced on this element, as (attribute name, uri).
    pub namespaces: Vec<(String, String)>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|c| match c {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Convert a parsed element and its subtree into an owned tree.
    pub fn from_node(node: roxmltree::Node) -> Self {
        let parent_ns: Vec<(Option<&str>, &str)> = node
            .parent_element()
            .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
            .unwrap_or_default();
        let namespaces = node
            .namespaces()
            .filter(|ns| ns.name() != Some("xml"))
            .filter(|ns| !parent_ns.contains(&(ns.name(), ns.uri())))
            .map(|ns| match ns.name() {
                Some(prefix) => (format!("xmlns:{prefix}"), ns.uri().to_string()),
                None => ("xmlns".to_string(), ns.uri().to_string()),
            })
            .collect();

        let attrs = node
            .attributes()
            .map(|a| {
                let name = match a.namespace().and_then(|uri| node.lookup_prefix(uri)) {
                    Some(prefix) => format!("{prefix}:{}", a.name()),
                    None => a.name().to_string(),
                };
                (name, a.value().to_string())
            })
            .collect();

        let children = node
            .children()
            .filter_map(|c| {
                if c.is_element() {
                    Some(XmlNode::Element(XmlElement::from_node(c)))
                } else if c.is_text() {
                    c.text().map(|t| XmlNode::Text(t.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name: qualified_name(node),
            namespaces,
            attrs,
            children,
        }
    }
}

pub fn qualified_name(node: roxmltree::Node) -> String {
    let tag = node.tag_name();
    match tag.namespace().and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) => format!("{prefix}:{}", tag.name()),
        None => tag.name().to_string(),
    }
}

fn write_err(e: impl std::fmt::Display) -> Error {
    Error::XmlWrite(e.to_string())
}

pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, Error> {
        let mut inner = Writer::new(Vec::new());
        inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_err)?;
        Ok(Self { inner })
    }

    pub fn start<'a, I>(&mut self, name: &str, attrs: I, empty: bool) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a str, Cow<'a, str>)>,
    {
        let mut start = BytesStart::new(name);
        for (k, v) in attrs {
            start.push_attribute((k, v.as_ref()));
        }
        let event = if empty {
            Event::Empty(start)
        } else {
            Event::Start(start)
        };
        self.inner.write_event(event).map_err(write_err)
    }

    pub fn end(&mut self, name: &str) -> Result<(), Error> {
        self.inner
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_err)
    }

    pub fn text(&mut self, text: &str) -> Result<(), Error> {
        self.inner
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_err)
    }

    pub fn node<F>(&mut self, node: &XmlNode, slot: &mut F) -> Result<(), Error>
    where
        F: FnMut(&mut XmlWriter) -> Result<(), Error>,
    {
        match node {
            XmlNode::Text(t) => self.text(t),
            XmlNode::Element(e) => self.element(e, slot),
            XmlNode::Slot => slot(self),
        }
    }

    pub fn element<F>(&mut self, el: &XmlElement, slot: &mut F) -> Result<(), Error>
    where
        F: FnMut(&mut XmlWriter) -> Result<(), Error>,
    {
        let attrs = el
            .namespaces
            .iter()
            .chain(el.attrs.iter())
            .map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str())));
        self.start(&el.name, attrs, el.children.is_empty())?;
        if el.children.is_empty() {
            return Ok(());
        }
        for child in &el.children {
            self.node(child, slot)?;
        }
        self.end(&el.name)
    }

    /// Write a list of nodes with no slot content.
    pub fn nodes(&mut self, nodes: &[XmlNode]) -> Result<(), Error> {
        let mut empty = |_: &mut XmlWriter| -> Result<(), Error> { Ok(()) };
        for node in nodes {
            self.node(node, &mut empty)?;
        }
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}
