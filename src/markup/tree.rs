// src/markup/tree.rs
//! Generic attributed tree built from normalized report markup in a single
//! forward pass over the quick-xml event stream.

use crate::utils::error::ParseError;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;

/// Nesting limit; real reports stay far below it.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkupNode {
    pub name: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive tag name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Case-insensitive attribute lookup.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First node named `name` in pre-order, this node included.
    pub fn find_first(&self, name: &str) -> Option<&MarkupNode> {
        if self.is(name) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_first(name))
    }

    /// Every node named `name` in document order, this node included.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a MarkupNode> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if node.is(name) {
                found.push(node);
            }
        });
        found
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MarkupNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// How a node's scope ended.
enum Closed {
    /// Its own end tag.
    Own,
    /// The end tag of the open ancestor at this stack index.
    Ancestor(usize),
    /// End of input, or a tokenizer error after the root opened.
    Eof,
}

/// Builds the tree rooted at the first start tag.
///
/// Unclosed elements at end of input are returned as they stand. An end
/// tag that names an open ancestor closes everything nested inside that
/// ancestor; an end tag naming nothing open is ignored.
pub fn parse_tree(markup: &str) -> Result<MarkupNode, ParseError> {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let mut builder = TreeBuilder {
                    reader,
                    open: Vec::new(),
                };
                let (root, _) = builder.build_node(&start)?;
                return Ok(root);
            }
            Ok(Event::Empty(start)) => return Ok(node_from_start(&start)),
            Ok(Event::Eof) => {
                return Err(ParseError::MalformedDocument(
                    "no start tag before end of input".to_string(),
                ))
            }
            Ok(_) => continue,
            Err(e) => {
                return Err(ParseError::MalformedDocument(format!(
                    "tokenizer error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }
}

struct TreeBuilder<'i> {
    reader: Reader<&'i [u8]>,
    open: Vec<String>,
}

impl<'i> TreeBuilder<'i> {
    fn build_node(&mut self, start: &BytesStart<'_>) -> Result<(MarkupNode, Closed), ParseError> {
        if self.open.len() >= MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }

        let mut node = node_from_start(start);
        let depth = self.open.len();
        self.open.push(node.name.clone());

        let closed = loop {
            match self.reader.read_event() {
                Ok(Event::Start(child)) => {
                    let (child_node, child_closed) = self.build_node(&child)?;
                    node.children.push(child_node);
                    match child_closed {
                        Closed::Own => {}
                        Closed::Ancestor(idx) if idx == depth => break Closed::Own,
                        other => break other,
                    }
                }
                Ok(Event::Empty(child)) => node.children.push(node_from_start(&child)),
                Ok(Event::Text(text)) => append_text(&mut node.text, &decode_text(&text)),
                Ok(Event::CData(cdata)) => {
                    append_text(&mut node.text, &String::from_utf8_lossy(&cdata))
                }
                Ok(Event::End(end)) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    if name == node.name {
                        break Closed::Own;
                    }
                    if let Some(idx) = self.open[..depth].iter().rposition(|open| *open == name) {
                        break Closed::Ancestor(idx);
                    }
                    tracing::trace!("Ignoring unmatched end tag </{}> inside <{}>", name, node.name);
                }
                Ok(Event::Eof) => break Closed::Eof,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "Tokenizer stopped at byte {} inside <{}>: {}; keeping the partial tree",
                        self.reader.buffer_position(),
                        node.name,
                        e
                    );
                    break Closed::Eof;
                }
            }
        };

        self.open.pop();
        Ok((node, closed))
    }
}

fn node_from_start(start: &BytesStart<'_>) -> MarkupNode {
    let mut node = MarkupNode::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.html_attributes().filter_map(Result::ok) {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        node.attributes.insert(key, value);
    }
    node
}

// Unknown entities survive as literal text rather than failing the document.
fn decode_text<'a>(text: &'a BytesText<'_>) -> Cow<'a, str> {
    match text.unescape() {
        Ok(decoded) => decoded,
        Err(_) => String::from_utf8_lossy(text),
    }
}

fn append_text(target: &mut String, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        target.push_str(trimmed);
    }
}
