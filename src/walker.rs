//! Document walker: depth-first, left-to-right dispatch over node kinds.
//!
//! Der Walker hält keinen eigenen Zustand. Ein [`NodeVisitor`] bekommt pro
//! Knotenart einen Callback und entscheidet selbst, ob er über
//! [`walk_children`] in die Kinder absteigt.

use crate::Result;
use crate::node::{DocumentNode, NodeKind};

/// Callbacks per node kind.
pub trait NodeVisitor<'a, N: DocumentNode<'a>> {
    /// Dokumentknoten. Default: nur Element-, Kommentar- und PI-Kinder.
    fn visit_document(&mut self, node: N) -> Result<()> {
        walk_document_children(self, node)
    }

    fn visit_element(&mut self, node: N) -> Result<()>;

    fn visit_text(&mut self, node: N) -> Result<()>;

    fn visit_cdata(&mut self, node: N) -> Result<()>;

    fn visit_comment(&mut self, node: N) -> Result<()>;

    fn visit_processing_instruction(&mut self, node: N) -> Result<()>;
}

/// Dispatches `node` to the matching visitor callback.
///
/// Attribute und unbekannte Knotenarten werden übersprungen.
pub fn walk<'a, N, V>(visitor: &mut V, node: N) -> Result<()>
where
    N: DocumentNode<'a>,
    V: NodeVisitor<'a, N> + ?Sized,
{
    match node.kind() {
        NodeKind::Document => visitor.visit_document(node),
        NodeKind::Element => visitor.visit_element(node),
        NodeKind::Text => visitor.visit_text(node),
        NodeKind::CData => visitor.visit_cdata(node),
        NodeKind::Comment => visitor.visit_comment(node),
        NodeKind::ProcessingInstruction => visitor.visit_processing_instruction(node),
        NodeKind::Attribute | NodeKind::Other => Ok(()),
    }
}

/// Walks all children of `node` in document order.
pub fn walk_children<'a, N, V>(visitor: &mut V, node: N) -> Result<()>
where
    N: DocumentNode<'a>,
    V: NodeVisitor<'a, N> + ?Sized,
{
    for child in node.children() {
        walk(visitor, child)?;
    }
    Ok(())
}

/// Walks the children of a document node; nur Elemente, Kommentare und PIs,
/// Text auf Dokumentebene wird ignoriert.
pub fn walk_document_children<'a, N, V>(visitor: &mut V, node: N) -> Result<()>
where
    N: DocumentNode<'a>,
    V: NodeVisitor<'a, N> + ?Sized,
{
    for child in node.children() {
        match child.kind() {
            NodeKind::Element => visitor.visit_element(child)?,
            NodeKind::Comment => visitor.visit_comment(child)?,
            NodeKind::ProcessingInstruction => visitor.visit_processing_instruction(child)?,
            _ => {}
        }
    }
    Ok(())
}
