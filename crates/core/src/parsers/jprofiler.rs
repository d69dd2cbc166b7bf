use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use crate::model::{CallNode, CallTree};

#[derive(Debug, Error)]
pub enum XmlParseError {
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("node #{ordinal} ({class}) is missing required attribute `{attribute}`")]
    MissingAttribute {
        attribute: &'static str,
        ordinal: usize,
        class: String,
    },
    #[error("node #{ordinal}: attribute `{attribute}` is not an integer: {value:?}")]
    InvalidNumber {
        attribute: &'static str,
        ordinal: usize,
        value: String,
    },
    #[error("unbalanced element nesting")]
    Unbalanced,
    #[error("no call nodes found")]
    Empty,
}

/// A `<node>` whose start tag has been read but whose children are still open.
struct OpenNode {
    node: CallNode,
    /// `leaf` as exported, if the attribute was present.
    leaf_attr: Option<bool>,
}

impl OpenNode {
    fn close(mut self) -> CallNode {
        self.node.leaf = self
            .leaf_attr
            .unwrap_or_else(|| self.node.children.is_empty());
        self.node
    }
}

/// Parse a JProfiler call-tree export (`jpexport ... CallTree -format=xml`).
///
/// Every `<node>` element becomes a [`CallNode`]; other elements (`<tree>`,
/// thread groupings) are transparent containers. Required attributes are
/// `class`, `methodName`, `count` and `selfTime`; `leaf` falls back to
/// "has no child nodes". `time`, `percent`, `lineNumber` and `signature` are
/// ignored.
pub fn parse_jprofiler_xml(data: &[u8]) -> Result<CallTree, XmlParseError> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut roots: Vec<CallNode> = Vec::new();
    let mut open_nodes: Vec<OpenNode> = Vec::new();
    // One entry per open element: true when it is a `<node>`.
    let mut open_elements: Vec<bool> = Vec::new();
    let mut ordinal = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.name().as_ref() == b"node" {
                    ordinal += 1;
                    open_nodes.push(read_node(&e, ordinal)?);
                    open_elements.push(true);
                } else {
                    open_elements.push(false);
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"node" {
                    ordinal += 1;
                    let node = read_node(&e, ordinal)?.close();
                    attach(node, &mut open_nodes, &mut roots);
                }
            }
            Event::End(_) => match open_elements.pop() {
                Some(true) => {
                    let node = open_nodes.pop().ok_or(XmlParseError::Unbalanced)?.close();
                    attach(node, &mut open_nodes, &mut roots);
                }
                Some(false) => {}
                None => return Err(XmlParseError::Unbalanced),
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !open_elements.is_empty() {
        return Err(XmlParseError::Unbalanced);
    }
    if ordinal == 0 {
        return Err(XmlParseError::Empty);
    }

    Ok(CallTree::new(roots))
}

fn attach(node: CallNode, open_nodes: &mut [OpenNode], roots: &mut Vec<CallNode>) {
    match open_nodes.last_mut() {
        Some(parent) => parent.node.children.push(node),
        None => roots.push(node),
    }
}

fn read_node(e: &BytesStart<'_>, ordinal: usize) -> Result<OpenNode, XmlParseError> {
    let mut class_name: Option<String> = None;
    let mut method_name: Option<String> = None;
    let mut count: Option<u64> = None;
    let mut self_time: Option<u64> = None;
    let mut leaf_attr: Option<bool> = None;

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"class" => class_name = Some(value.into_owned()),
            b"methodName" => method_name = Some(value.into_owned()),
            b"count" => count = Some(parse_integer("count", &value, ordinal)?),
            b"selfTime" => self_time = Some(parse_integer("selfTime", &value, ordinal)?),
            b"leaf" => leaf_attr = Some(value.trim().eq_ignore_ascii_case("true")),
            _ => {}
        }
    }

    let class = class_name.ok_or_else(|| XmlParseError::MissingAttribute {
        attribute: "class",
        ordinal,
        class: "<unknown class>".to_string(),
    })?;
    let missing = |attribute: &'static str| XmlParseError::MissingAttribute {
        attribute,
        ordinal,
        class: class.clone(),
    };
    let method_name = method_name.ok_or_else(|| missing("methodName"))?;
    let count = count.ok_or_else(|| missing("count"))?;
    let self_time = self_time.ok_or_else(|| missing("selfTime"))?;

    Ok(OpenNode {
        node: CallNode {
            class_name: class,
            method_name,
            count,
            self_time,
            leaf: true,
            children: Vec::new(),
        },
        leaf_attr,
    })
}

fn parse_integer(attribute: &'static str, value: &str, ordinal: usize) -> Result<u64, XmlParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| XmlParseError::InvalidNumber {
            attribute,
            ordinal,
            value: value.to_string(),
        })
}
