//! Read-only document tree contract consumed by the serializer.
//!
//! Jedes Dokumentmodell, das Knoten als billige `Copy`-Handles liefert, kann
//! serialisiert werden: [`dom::Node`](crate::dom::Node) ist die mitgelieferte
//! Implementierung, Tests wrappen z.B. `roxmltree`.

/// Art eines Knotens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
    /// Vom Walker nicht unterstützte Knotenart (z.B. Entity-Referenzen);
    /// wird übersprungen.
    Other,
}

/// A node of a read-only, tree-shaped document.
///
/// Namespace-Regeln wie in DOM Level 2:
/// - `local_name() == None`: der Knoten wurde nicht namespace-aware erzeugt,
///   nur `node_name()` ist aussagekräftig.
/// - `namespace_uri() == None`: kein Namespace.
/// - Namespace-Deklarationen sind Attribute im Namespace
///   `http://www.w3.org/2000/xmlns/` (`xmlns` bzw. `xmlns:p`).
pub trait DocumentNode<'a>: Copy + 'a {
    type Attributes: Iterator<Item = Self>;
    type Children: Iterator<Item = Self>;

    fn kind(self) -> NodeKind;

    /// Qualifizierter Name (`p:local`), PI-Target, sonst leer.
    fn node_name(self) -> &'a str;

    fn local_name(self) -> Option<&'a str>;

    fn namespace_uri(self) -> Option<&'a str>;

    fn prefix(self) -> Option<&'a str>;

    /// Inhalt von Text, CDATA, Kommentar, Attribut oder PI-Daten.
    fn value(self) -> &'a str;

    /// Attribute eines Elements in Dokumentreihenfolge (leer für andere Knoten).
    fn attributes(self) -> Self::Attributes;

    /// Kindknoten in Dokumentreihenfolge.
    fn children(self) -> Self::Children;
}
