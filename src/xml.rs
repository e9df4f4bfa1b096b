//! XML-Eingabe über quick-xml.
//!
//! Ein Pull-Parser-Durchlauf liefert [`XmlEvent`]s in Dokumentreihenfolge.
//! [`dom`](crate::dom) baut daraus einen Baum, [`streaming`](crate::streaming)
//! speist sie ohne Baum direkt in den Encoder.

mod emit;
pub(crate) use emit::emit_xml_events;

use crate::encoder::NameRef;

/// Namespace-aufgelöster Name aus der XML-Eingabe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlName {
    pub(crate) prefix: String,
    pub(crate) namespace_name: String,
    pub(crate) local_name: String,
}

impl XmlName {
    pub(crate) fn as_name_ref(&self) -> NameRef<'_> {
        NameRef::new(&self.prefix, &self.namespace_name, &self.local_name)
    }

    /// `prefix:local` bzw. `local`.
    pub(crate) fn qualified(&self) -> String {
        if self.prefix.is_empty() {
            self.local_name.clone()
        } else {
            format!("{}:{}", self.prefix, self.local_name)
        }
    }
}

/// Reguläres Attribut (keine `xmlns`-Deklaration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlAttribute {
    pub(crate) name: XmlName,
    pub(crate) value: String,
}

/// `xmlns` / `xmlns:prefix`; leerer Namespace-Name = Undeclaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlNamespace {
    pub(crate) prefix: String,
    pub(crate) namespace_name: String,
}

/// Borrowed XML event. Leere Elemente kommen als `StartElement` + `EndElement`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum XmlEvent<'a> {
    StartElement {
        name: &'a XmlName,
        namespaces: &'a [XmlNamespace],
        attributes: &'a [XmlAttribute],
    },
    EndElement,
    /// Zusammengefasster Text inkl. aufgelöster Referenzen.
    Characters(&'a str),
    CData(&'a str),
    Comment(&'a str),
    ProcessingInstruction {
        target: &'a str,
        data: &'a str,
    },
    DocType {
        system_id: &'a str,
        public_id: &'a str,
    },
}

/// XML 1.0 S: Leerzeichen, Tab, CR, LF.
#[inline]
pub(crate) fn is_xml_whitespace(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}
