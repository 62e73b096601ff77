//! Namespace-aware element tree built from `quick-xml` events.
//!
//! Definition documents are small, so they are read fully into memory and
//! walked as a tree. Element and attribute names are stored as local names;
//! each element keeps the namespace URI its prefix resolved to.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use super::DefinitionError;

/// One XML element with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Namespace URI, if the element's name is bound to one.
    pub namespace: Option<String>,
    /// Local name (prefix stripped).
    pub name: String,
    /// Attributes in document order, by local name. `xmlns` declarations are dropped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated text and CDATA content, trimmed at the edges.
    pub text: String,
}

impl Element {
    /// Look up an attribute by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child with the given namespace and local name.
    pub fn child(&self, namespace: Option<&str>, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| child.namespace.as_deref() == namespace && child.name == name)
    }

    /// All children with the given namespace and local name, in document order.
    pub fn children_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter(move |child| child.namespace.as_deref() == namespace && child.name == name)
    }

    /// Follow a path of child names, all in one namespace.
    pub fn descend(&self, namespace: Option<&str>, path: &[&str]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |element, name| element.child(namespace, name))
    }

    /// Remove every descendant bound to `namespace`.
    pub fn prune_namespace(&mut self, namespace: &str) {
        self.children.retain(|child| child.namespace.as_deref() != Some(namespace));
        for child in &mut self.children {
            child.prune_namespace(namespace);
        }
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(source: &str) -> Result<Element, DefinitionError> {
    let mut reader = NsReader::from_str(source);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = match resolved {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            _ => None,
        };

        match event {
            Event::Start(start) => stack.push(element_from(namespace, &start)?),
            Event::Empty(start) => {
                let element = element_from(namespace, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| DefinitionError::Structure("unmatched end tag".to_string()))?;
                trim_edges(&mut element.text);
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DefinitionError::Structure(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| DefinitionError::Structure("document has no root element".to_string()))
}

/// Text events arrive untrimmed so whitespace next to CDATA sections and
/// comments survives; only the element's outer edges are trimmed.
fn trim_edges(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

fn element_from(
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<Element, DefinitionError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key;
        if key.as_ref() == b"xmlns" || key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let name = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((name, value));
    }

    Ok(Element {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DefinitionError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(DefinitionError::Structure(format!(
                "second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}
