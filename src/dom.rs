//! Arena-based document model.
//!
//! Alle Knoten liegen in einem `Vec`; ein [`Node`] ist ein `Copy`-Handle aus
//! Dokument-Referenz und Index und implementiert [`DocumentNode`]. Das Modell
//! folgt DOM Level 2: Namespace-Deklarationen sind Attribute im
//! xmlns-Namespace, Knoten ohne Local-Name sind nicht namespace-aware.
//!
//! # Beispiel
//!
//! ```
//! use fastinf::dom::Document;
//! use fastinf::node::{DocumentNode, NodeKind};
//!
//! let mut doc = Document::new();
//! let root = doc.append_element(Document::ROOT, Some("urn:a"), "a:root");
//! doc.add_attribute(root, None, "id", "1");
//! doc.append_text(root, "hi");
//!
//! let el = doc.document_element().unwrap();
//! assert_eq!(el.kind(), NodeKind::Element);
//! assert_eq!(el.prefix(), Some("a"));
//! assert_eq!(el.children().next().unwrap().value(), "hi");
//! ```

use std::io::Read;

use crate::Result;
use crate::constants::{XMLNS_NAMESPACE_NAME, XMLNS_NAMESPACE_PREFIX};
use crate::node::{DocumentNode, NodeKind};
use crate::qname::split_lexical;
use crate::xml::{XmlEvent, emit_xml_events};

/// Index eines Knotens in seinem [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeName {
    qualified: String,
    prefix: Option<String>,
    local_name: Option<String>,
    namespace_uri: Option<String>,
}

impl NodeName {
    /// Namespace-aware Name (`createElementNS`).
    fn namespaced(namespace_uri: Option<&str>, qualified: &str) -> Self {
        let (prefix, local) = split_lexical(qualified);
        Self {
            qualified: qualified.to_owned(),
            prefix: (!prefix.is_empty()).then(|| prefix.to_owned()),
            local_name: Some(local.to_owned()),
            namespace_uri: namespace_uri.filter(|ns| !ns.is_empty()).map(str::to_owned),
        }
    }

    /// Name ohne Namespace-Information (`createElement`).
    fn plain(name: &str) -> Self {
        Self {
            qualified: name.to_owned(),
            prefix: None,
            local_name: None,
            namespace_uri: None,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    name: Option<NodeName>,
    value: String,
    attributes: Vec<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind, name: Option<NodeName>, value: &str) -> Self {
        Self {
            kind,
            name,
            value: value.to_owned(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A document tree. Knoten 0 ist der Dokumentknoten.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// Id des Dokumentknotens.
    pub const ROOT: NodeId = NodeId(0);

    /// Leeres Dokument (nur der Dokumentknoten).
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document, None, "")],
        }
    }

    /// Parses XML text into a namespace-aware document.
    pub fn parse_str(xml: &str) -> Result<Self> {
        Self::parse_reader(xml.as_bytes())
    }

    /// Parses XML from a reader. Die DOCTYPE-Deklaration wird nicht übernommen.
    pub fn parse_reader(reader: impl Read) -> Result<Self> {
        let mut doc = Self::new();
        let mut stack = vec![Self::ROOT];
        emit_xml_events(reader, |event| {
            let parent = stack.last().copied().unwrap_or(Self::ROOT);
            match event {
                XmlEvent::StartElement {
                    name,
                    namespaces,
                    attributes,
                } => {
                    let el = doc.append_element(
                        parent,
                        Some(name.namespace_name.as_str()),
                        &name.qualified(),
                    );
                    for ns in namespaces {
                        doc.add_namespace_declaration(el, &ns.prefix, &ns.namespace_name);
                    }
                    for attr in attributes {
                        doc.add_attribute(
                            el,
                            Some(attr.name.namespace_name.as_str()),
                            &attr.name.qualified(),
                            &attr.value,
                        );
                    }
                    stack.push(el);
                }
                XmlEvent::EndElement => {
                    stack.pop();
                }
                XmlEvent::Characters(text) => {
                    doc.append_text(parent, text);
                }
                XmlEvent::CData(text) => {
                    doc.append_cdata(parent, text);
                }
                XmlEvent::Comment(text) => {
                    doc.append_comment(parent, text);
                }
                XmlEvent::ProcessingInstruction { target, data } => {
                    doc.append_processing_instruction(parent, target, data);
                }
                XmlEvent::DocType { .. } => {}
            }
            Ok(())
        })?;
        Ok(doc)
    }

    /// Handle auf den Dokumentknoten.
    pub fn root(&self) -> Node<'_> {
        self.node(Self::ROOT)
    }

    /// Handle auf einen Knoten dieses Dokuments.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { doc: self, id }
    }

    /// Erstes Element unter dem Dokumentknoten.
    pub fn document_element(&self) -> Option<Node<'_>> {
        self.root().children().find(|n| n.kind() == NodeKind::Element)
    }

    /// Anzahl aller Knoten inkl. Dokumentknoten und Attribute.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Appends a namespace-aware element (`prefix:local` in `namespace_uri`).
    pub fn append_element(
        &mut self,
        parent: NodeId,
        namespace_uri: Option<&str>,
        qualified_name: &str,
    ) -> NodeId {
        let name = NodeName::namespaced(namespace_uri, qualified_name);
        self.push_child(parent, NodeData::new(NodeKind::Element, Some(name), ""))
    }

    /// Appends an element without namespace information.
    pub fn append_element_without_namespace(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.push_child(
            parent,
            NodeData::new(NodeKind::Element, Some(NodeName::plain(name)), ""),
        )
    }

    /// Adds a namespace-aware attribute to `element`.
    pub fn add_attribute(
        &mut self,
        element: NodeId,
        namespace_uri: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> NodeId {
        let name = NodeName::namespaced(namespace_uri, qualified_name);
        self.push_attribute(element, NodeData::new(NodeKind::Attribute, Some(name), value))
    }

    /// Adds an attribute without namespace information.
    pub fn add_attribute_without_namespace(
        &mut self,
        element: NodeId,
        name: &str,
        value: &str,
    ) -> NodeId {
        self.push_attribute(
            element,
            NodeData::new(NodeKind::Attribute, Some(NodeName::plain(name)), value),
        )
    }

    /// Adds `xmlns` (leerer Prefix) bzw. `xmlns:prefix` to `element`.
    pub fn add_namespace_declaration(
        &mut self,
        element: NodeId,
        prefix: &str,
        namespace_uri: &str,
    ) -> NodeId {
        let qualified = if prefix.is_empty() {
            XMLNS_NAMESPACE_PREFIX.to_owned()
        } else {
            format!("{XMLNS_NAMESPACE_PREFIX}:{prefix}")
        };
        self.add_attribute(
            element,
            Some(XMLNS_NAMESPACE_NAME),
            &qualified,
            namespace_uri,
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_child(parent, NodeData::new(NodeKind::Text, None, text))
    }

    pub fn append_cdata(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_child(parent, NodeData::new(NodeKind::CData, None, text))
    }

    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_child(parent, NodeData::new(NodeKind::Comment, None, text))
    }

    pub fn append_processing_instruction(
        &mut self,
        parent: NodeId,
        target: &str,
        data: &str,
    ) -> NodeId {
        let name = NodeName::plain(target);
        self.push_child(
            parent,
            NodeData::new(NodeKind::ProcessingInstruction, Some(name), data),
        )
    }

    fn push_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_attribute(&mut self, element: NodeId, data: NodeData) -> NodeId {
        debug_assert_eq!(self.nodes[element.0].kind, NodeKind::Element);
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        self.nodes[element.0].attributes.push(id);
        id
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy-Handle auf einen Knoten eines [`Document`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub fn id(self) -> NodeId {
        self.id
    }

    fn data(self) -> &'a NodeData {
        &self.doc.nodes[self.id.0]
    }

    fn name(self) -> Option<&'a NodeName> {
        self.data().name.as_ref()
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}#{} {}", self.kind(), self.id.0, self.node_name())
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

/// Iterator über Attribute oder Kinder.
#[derive(Clone)]
pub struct Nodes<'a> {
    doc: &'a Document,
    ids: std::slice::Iter<'a, NodeId>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().map(|&id| Node { doc: self.doc, id })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<'a> DocumentNode<'a> for Node<'a> {
    type Attributes = Nodes<'a>;
    type Children = Nodes<'a>;

    fn kind(self) -> NodeKind {
        self.data().kind
    }

    fn node_name(self) -> &'a str {
        self.name().map(|n| n.qualified.as_str()).unwrap_or("")
    }

    fn local_name(self) -> Option<&'a str> {
        self.name().and_then(|n| n.local_name.as_deref())
    }

    fn namespace_uri(self) -> Option<&'a str> {
        self.name().and_then(|n| n.namespace_uri.as_deref())
    }

    fn prefix(self) -> Option<&'a str> {
        self.name().and_then(|n| n.prefix.as_deref())
    }

    fn value(self) -> &'a str {
        &self.data().value
    }

    fn attributes(self) -> Nodes<'a> {
        Nodes {
            doc: self.doc,
            ids: self.data().attributes.iter(),
        }
    }

    fn children(self) -> Nodes<'a> {
        Nodes {
            doc: self.doc,
            ids: self.data().children.iter(),
        }
    }
}
