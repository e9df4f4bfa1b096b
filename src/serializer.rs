//! DOM serializer: walks a [`DocumentNode`] tree and drives the [`Encoder`].
//!
//! Pro Element werden die Attribute in Namespace-Deklarationen (Namespace
//! `http://www.w3.org/2000/xmlns/`) und reguläre Attribute getrennt. Die
//! Deklarationen öffnen einen Scope im [`NamespaceContext`]; Namespaces, die
//! Element- oder Attributnamen brauchen aber nicht deklariert sind, werden
//! ergänzt, damit der literale Name auf indizierte Prefixe verweisen kann.
//!
//! # Beispiel
//!
//! ```
//! use fastinf::{DocumentSerializer, SerializerOptions};
//! use fastinf::dom::Document;
//!
//! let doc = Document::parse_str("<a><b/><b/></a>").unwrap();
//! let mut serializer = DocumentSerializer::new(SerializerOptions::default());
//! let bytes = serializer.serialize_to_vec(doc.root()).unwrap();
//! assert_eq!(&bytes[..4], &[0xE0, 0x00, 0x00, 0x01]);
//! ```

use std::borrow::Cow;
use std::io::Write;

use log::debug;

use crate::constants::{XML_NAMESPACE_PREFIX, XMLNS_NAMESPACE_NAME, XMLNS_NAMESPACE_PREFIX};
use crate::encoder::{AttributeRef, Encoder, NameRef, NamespaceRef};
use crate::namespace::NamespaceContext;
use crate::node::{DocumentNode, NodeKind};
use crate::options::SerializerOptions;
use crate::walker::{self, NodeVisitor};
use crate::xml::is_xml_whitespace;
use crate::{Error, Result};

/// Namensteile eines Knotens nach der Auflösung.
struct ResolvedName<'a> {
    prefix: Cow<'a, str>,
    namespace_name: &'a str,
    local_name: &'a str,
}

impl ResolvedName<'_> {
    fn as_name_ref(&self) -> NameRef<'_> {
        NameRef::new(&self.prefix, self.namespace_name, self.local_name)
    }
}

/// Serializes document trees to Fast Infoset, one document at a time.
///
/// Eine Instanz kann für beliebig viele Dokumente wiederverwendet werden;
/// jede `serialize*`-Methode beginnt mit einem Reset.
pub struct DocumentSerializer {
    encoder: Encoder,
    namespaces: NamespaceContext,
    /// Zähler für erzeugte Prefixe (`ns1`, `ns2`, ...).
    generated_prefixes: usize,
}

impl DocumentSerializer {
    pub fn new(options: SerializerOptions) -> Self {
        Self {
            encoder: Encoder::new(options),
            namespaces: NamespaceContext::new(),
            generated_prefixes: 0,
        }
    }

    pub fn options(&self) -> &SerializerOptions {
        self.encoder.options()
    }

    /// Encoder der letzten Session (z.B. für Vocabulary-Inspektion).
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Clears vocabulary, namespace scopes and buffered output; Kapazitäten
    /// bleiben erhalten.
    pub fn reset(&mut self) {
        self.encoder.reset();
        self.namespaces.reset_contexts();
        self.generated_prefixes = 0;
    }

    /// Serializes a document node (or a single element as a complete
    /// document) into `out`.
    pub fn serialize<'a, N: DocumentNode<'a>>(
        &mut self,
        node: N,
        out: &mut impl Write,
    ) -> Result<()> {
        self.reset();
        self.encoder.start_document()?;
        match node.kind() {
            NodeKind::Document => self.visit_document(node)?,
            NodeKind::Element => self.visit_element(node)?,
            kind => {
                return Err(Error::structural(format!(
                    "cannot serialize {kind:?} node as document"
                )));
            }
        }
        self.encoder.end_document()?;
        debug!("serialized document: {} octets", self.encoder.buf_len());
        self.encoder.finish_to(out)
    }

    /// Serializes `element` as the document element of a complete document.
    pub fn serialize_element<'a, N: DocumentNode<'a>>(
        &mut self,
        element: N,
        out: &mut impl Write,
    ) -> Result<()> {
        if element.kind() != NodeKind::Element {
            return Err(Error::structural("serialize_element expects an element node"));
        }
        self.serialize(element, out)
    }

    /// Wie [`serialize`](Self::serialize), liefert die Bytes als `Vec`.
    pub fn serialize_to_vec<'a, N: DocumentNode<'a>>(&mut self, node: N) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize(node, &mut out)?;
        Ok(out)
    }

    /// Löst den Elementnamen auf und ergänzt fehlende Deklarationen in `decls`.
    fn resolve_element_name<'a, N: DocumentNode<'a>>(
        &mut self,
        node: N,
        decls: &mut Vec<(Cow<'a, str>, &'a str)>,
    ) -> ResolvedName<'a> {
        let Some(local_name) = node.local_name() else {
            // Nicht namespace-aware: Name literal, ohne Namespace.
            return ResolvedName {
                prefix: Cow::Borrowed(""),
                namespace_name: "",
                local_name: node.node_name(),
            };
        };
        let prefix = node.prefix().unwrap_or("");
        let namespace_name = node.namespace_uri().unwrap_or("");
        if self.namespaces.namespace_uri(prefix) != namespace_name {
            if namespace_name.is_empty() && !prefix.is_empty() {
                // Prefix ohne Namespace: wie unpräfixiert behandeln.
                return self.resolve_unprefixed_no_namespace(local_name, decls);
            }
            self.namespaces.declare_namespace(prefix, Some(namespace_name).filter(|ns| !ns.is_empty()));
            decls.push((Cow::Borrowed(prefix), namespace_name));
        }
        ResolvedName {
            prefix: Cow::Borrowed(prefix),
            namespace_name,
            local_name,
        }
    }

    fn resolve_unprefixed_no_namespace<'a>(
        &mut self,
        local_name: &'a str,
        decls: &mut Vec<(Cow<'a, str>, &'a str)>,
    ) -> ResolvedName<'a> {
        if !self.namespaces.namespace_uri("").is_empty() {
            self.namespaces.declare_default_namespace(None);
            decls.push((Cow::Borrowed(""), ""));
        }
        ResolvedName {
            prefix: Cow::Borrowed(""),
            namespace_name: "",
            local_name,
        }
    }

    /// Attributnamen: ein Namespace braucht immer einen Prefix.
    fn resolve_attribute_name<'a, N: DocumentNode<'a>>(
        &mut self,
        attr: N,
        decls: &mut Vec<(Cow<'a, str>, &'a str)>,
    ) -> ResolvedName<'a> {
        let (Some(local_name), Some(namespace_name)) = (attr.local_name(), attr.namespace_uri())
        else {
            return ResolvedName {
                prefix: Cow::Borrowed(""),
                namespace_name: "",
                local_name: attr.local_name().unwrap_or_else(|| attr.node_name()),
            };
        };
        let prefix = attr.prefix().unwrap_or("");
        if !prefix.is_empty() && self.namespaces.namespace_uri(prefix) == namespace_name {
            return ResolvedName {
                prefix: Cow::Borrowed(prefix),
                namespace_name,
                local_name,
            };
        }
        let in_scope = self
            .namespaces
            .prefixes(namespace_name)
            .find(|p| !p.is_empty())
            .map(str::to_owned);
        let prefix: Cow<'a, str> = match in_scope {
            Some(p) => Cow::Owned(p),
            None => {
                let p: Cow<'a, str> = if prefix.is_empty()
                    || !self.namespaces.namespace_uri(prefix).is_empty()
                {
                    Cow::Owned(self.generate_prefix())
                } else {
                    Cow::Borrowed(prefix)
                };
                self.namespaces.declare_namespace(&p, Some(namespace_name));
                decls.push((p.clone(), namespace_name));
                p
            }
        };
        ResolvedName {
            prefix,
            namespace_name,
            local_name,
        }
    }

    fn generate_prefix(&mut self) -> String {
        loop {
            self.generated_prefixes += 1;
            let candidate = format!("ns{}", self.generated_prefixes);
            if self.namespaces.namespace_uri(&candidate).is_empty() {
                return candidate;
            }
        }
    }

    fn should_skip_text(&self, text: &str) -> bool {
        text.is_empty()
            || (self.encoder.options().ignore_whitespace_text_content && is_xml_whitespace(text))
    }
}

impl<'a, N: DocumentNode<'a>> NodeVisitor<'a, N> for DocumentSerializer {
    fn visit_element(&mut self, node: N) -> Result<()> {
        self.namespaces.push_context();

        // Namespace-Deklarationen und reguläre Attribute trennen
        let mut decls: Vec<(Cow<'a, str>, &'a str)> = Vec::new();
        let mut regular: Vec<N> = Vec::new();
        for attr in node.attributes() {
            if attr.namespace_uri() == Some(XMLNS_NAMESPACE_NAME) {
                let prefix = match attr.local_name() {
                    Some(XMLNS_NAMESPACE_PREFIX) | None => "",
                    Some(local) => local,
                };
                if prefix == XML_NAMESPACE_PREFIX {
                    continue;
                }
                let uri = attr.value();
                self.namespaces
                    .declare_namespace(prefix, Some(uri).filter(|u| !u.is_empty()));
                decls.retain(|(p, _)| p != prefix);
                decls.push((Cow::Borrowed(prefix), uri));
            } else {
                regular.push(attr);
            }
        }

        let name = self.resolve_element_name(node, &mut decls);
        let mut attr_names = Vec::with_capacity(regular.len());
        for attr in &regular {
            attr_names.push(self.resolve_attribute_name(*attr, &mut decls));
        }

        let namespace_refs: Vec<NamespaceRef<'_>> = decls
            .iter()
            .map(|(prefix, uri)| NamespaceRef::new(prefix, uri))
            .collect();
        let attribute_refs: Vec<AttributeRef<'_>> = attr_names
            .iter()
            .zip(&regular)
            .map(|(attr_name, attr)| AttributeRef::new(attr_name.as_name_ref(), attr.value()))
            .collect();

        self.encoder
            .start_element(name.as_name_ref(), &namespace_refs, &attribute_refs)?;
        walker::walk_children(self, node)?;
        self.encoder.end_element()?;
        self.namespaces.pop_context();
        Ok(())
    }

    fn visit_text(&mut self, node: N) -> Result<()> {
        let text = node.value();
        if self.should_skip_text(text) {
            return Ok(());
        }
        self.encoder.characters(text)
    }

    fn visit_cdata(&mut self, node: N) -> Result<()> {
        let text = node.value();
        if self.should_skip_text(text) {
            return Ok(());
        }
        self.encoder.cdata(text)
    }

    fn visit_comment(&mut self, node: N) -> Result<()> {
        if self.encoder.options().ignore_comments {
            return Ok(());
        }
        self.encoder.comment(node.value())
    }

    fn visit_processing_instruction(&mut self, node: N) -> Result<()> {
        if self.encoder.options().ignore_processing_instructions {
            return Ok(());
        }
        self.encoder
            .processing_instruction(node.node_name(), node.value())
    }
}
