use super::collapse_whitespace;
use crate::error::{QuireError, Result};
use crate::metadata::RawMetadata;
use std::fmt;
use sxd_document::parser;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value, XPath};

/// Structured value extractor for one XML node
pub type NodeWalker = for<'d> fn(XmlNode<'d>) -> Option<String>;

/// How the nodes selected by an XPath become raw values
#[derive(Clone, Copy)]
pub enum ValueExtractor {
    /// Whitespace-collapsed string value
    Text,
    /// Custom walker; `None` means the node yields no value
    Walker(NodeWalker),
}

impl ValueExtractor {
    fn extract(self, node: Node<'_>) -> Option<String> {
        match self {
            ValueExtractor::Text => collapse_whitespace(&node.string_value()),
            ValueExtractor::Walker(walk) => walk(XmlNode(node)).and_then(|v| collapse_whitespace(&v)),
        }
    }
}

impl fmt::Debug for ValueExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExtractor::Text => f.write_str("Text"),
            ValueExtractor::Walker(_) => f.write_str("Walker"),
        }
    }
}

/// Read-only view of a node handed to [`NodeWalker`]s
#[derive(Clone, Copy)]
pub struct XmlNode<'d>(Node<'d>);

impl<'d> XmlNode<'d> {
    pub(crate) fn from_node(node: Node<'d>) -> Self {
        Self(node)
    }

    /// Local name of an element or attribute
    pub fn name(&self) -> Option<&'d str> {
        match self.0 {
            Node::Element(e) => Some(e.name().local_part()),
            Node::Attribute(a) => Some(a.name().local_part()),
            _ => None,
        }
    }

    /// Whitespace-collapsed text content; `None` when blank
    pub fn text(&self) -> Option<String> {
        collapse_whitespace(&self.0.string_value())
    }

    /// Child elements in document order
    pub fn children(&self) -> Vec<XmlNode<'d>> {
        match self.0 {
            Node::Element(e) => e
                .children()
                .into_iter()
                .filter_map(|c| c.element())
                .map(|e| XmlNode(Node::Element(e)))
                .collect(),
            Node::Root(r) => r
                .children()
                .into_iter()
                .filter_map(|c| c.element())
                .map(|e| XmlNode(Node::Element(e)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// First child element with the given local name
    pub fn child(&self, name: &str) -> Option<XmlNode<'d>> {
        self.children().into_iter().find(|c| c.name() == Some(name))
    }

    /// Text of the first child element with the given local name
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(|c| c.text())
    }

    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        match self.0 {
            Node::Element(e) => e.attribute_value(name),
            _ => None,
        }
    }
}

/// XPath tables describing how to pull raw metadata out of one XML format
#[derive(Debug, Clone, Default)]
pub struct XmlSchema {
    /// Evaluated once against the document; values go into every record
    pub global_map: Vec<(String, ValueExtractor)>,
    /// Each selected node is one record; `None` = whole document
    pub article_node: Option<String>,
    /// Evaluated relative to each article node
    pub article_map: Vec<(String, ValueExtractor)>,
}

impl XmlSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(mut self, xpath: &str, extractor: ValueExtractor) -> Self {
        self.global_map.push((xpath.to_string(), extractor));
        self
    }

    pub fn article_node(mut self, xpath: &str) -> Self {
        self.article_node = Some(xpath.to_string());
        self
    }

    pub fn article(mut self, xpath: &str, extractor: ValueExtractor) -> Self {
        self.article_map.push((xpath.to_string(), extractor));
        self
    }

    /// Compile every XPath once so broken tables fail before extraction
    pub fn validate(&self) -> Result<()> {
        let factory = Factory::new();
        let all = self
            .global_map
            .iter()
            .chain(self.article_map.iter())
            .map(|(xpath, _)| xpath.as_str())
            .chain(self.article_node.as_deref());

        for xpath in all {
            compile(&factory, xpath)?;
        }
        Ok(())
    }

    /// Extract one raw record per article node
    pub fn extract(&self, xml: &str, source_url: &str) -> Result<Vec<RawMetadata>> {
        let package = parser::parse(xml).map_err(|e| QuireError::ExtractionError {
            url: source_url.to_string(),
            reason: format!("malformed XML: {}", e),
        })?;
        let document = package.as_document();
        let factory = Factory::new();
        let context = Context::new();
        let root: Node<'_> = document.root().into();

        let mut global = RawMetadata::new();
        for (xpath, extractor) in &self.global_map {
            for value in evaluate(&factory, &context, xpath, root, *extractor)? {
                global.put(xpath, value);
            }
        }

        let nodes = match &self.article_node {
            Some(xpath) => select(&factory, &context, xpath, root)?,
            None => vec![root],
        };

        let mut records = Vec::with_capacity(nodes.len());
        for node in nodes {
            let mut record = RawMetadata::from_source(source_url);
            for (xpath, extractor) in &self.article_map {
                for value in evaluate(&factory, &context, xpath, node, *extractor)? {
                    record.put(xpath, value);
                }
            }
            for (key, values) in global.iter() {
                for value in values {
                    record.put(key, value.clone());
                }
            }
            records.push(record);
        }

        Ok(records)
    }
}

fn compile(factory: &Factory, xpath: &str) -> Result<XPath> {
    factory
        .build(xpath)
        .map_err(|e| QuireError::XPathError(format!("Invalid XPath '{}': {}", xpath, e)))?
        .ok_or_else(|| QuireError::XPathError(format!("Invalid XPath: {}", xpath)))
}

fn select<'d>(factory: &Factory, context: &Context<'d>, xpath: &str, node: Node<'d>) -> Result<Vec<Node<'d>>> {
    match compile(factory, xpath)?.evaluate(context, node)? {
        Value::Nodeset(nodeset) => Ok(nodeset.document_order()),
        _ => Err(QuireError::XPathError(format!("Article node XPath '{}' does not select nodes", xpath))),
    }
}

fn evaluate<'d>(
    factory: &Factory, context: &Context<'d>, xpath: &str, node: Node<'d>, extractor: ValueExtractor,
) -> Result<Vec<String>> {
    let values = match compile(factory, xpath)?.evaluate(context, node)? {
        Value::Nodeset(nodeset) => nodeset
            .document_order()
            .into_iter()
            .filter_map(|n| extractor.extract(n))
            .collect(),
        Value::String(s) => collapse_whitespace(&s).into_iter().collect(),
        Value::Number(n) if n.is_finite() => vec![n.to_string()],
        Value::Number(_) | Value::Boolean(_) => Vec::new(),
    };

    Ok(values)
}
