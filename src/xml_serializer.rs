//! Document tree → XML text.
//!
//! Schreibt einen [`DocumentNode`]-Baum als kompaktes XML (ohne
//! XML-Deklaration, ohne Einrückung). Namen werden so geschrieben, wie der
//! Knoten sie liefert (`node_name()`); Namespace-Deklarationen sind normale
//! `xmlns`-Attribute und erscheinen deshalb unverändert.
//!
//! Zwei APIs:
//! - [`node_to_xml()`] gibt XML als String zurück (Convenience).
//! - [`node_to_xml_writer()`] streamt XML direkt in `impl Write`.

use std::io::Write;

use crate::error::Error;
use crate::node::{DocumentNode, NodeKind};
use crate::walker::{self, NodeVisitor};
use crate::Result;

/// Serialisiert einen Knoten (Dokument, Element oder Blatt) als XML-String.
pub fn node_to_xml<'a, N: DocumentNode<'a>>(node: N) -> Result<String> {
    let mut buf = Vec::new();
    node_to_xml_writer(node, &mut buf)?;
    String::from_utf8(buf).map_err(|_| Error::IoError("XML output is not valid UTF-8".into()))
}

/// Serialisiert einen Knoten direkt in einen Writer.
pub fn node_to_xml_writer<'a, N: DocumentNode<'a>>(node: N, writer: impl Write) -> Result<()> {
    let mut ser = XmlTreeSerializer { writer };
    walker::walk(&mut ser, node)?;
    ser.writer.flush().map_err(io_err)
}

// ============================================================================
// Hilfsfunktionen
// ============================================================================

fn io_err(e: std::io::Error) -> Error {
    Error::IoError(e.to_string())
}

/// Schreibt einen String als Bytes in den Writer.
#[inline]
fn w(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(s.as_bytes()).map_err(io_err)
}

/// Schreibt einen Kommentar, prüft auf XML-Restriktionen.
fn write_comment(writer: &mut impl Write, text: &str) -> Result<()> {
    if text.contains("--") || text.ends_with('-') {
        return Err(Error::structural(
            "comment contains '--' or ends with '-' (XML 1.0 section 2.5)",
        ));
    }
    w(writer, "<!--")?;
    w(writer, text)?;
    w(writer, "-->")
}

/// Schreibt eine Processing Instruction, prüft auf XML-Restriktionen.
fn write_pi(writer: &mut impl Write, target: &str, data: &str) -> Result<()> {
    if data.contains("?>") {
        return Err(Error::structural(
            "processing instruction data contains '?>' (XML 1.0 section 2.6)",
        ));
    }
    w(writer, "<?")?;
    w(writer, target)?;
    if !data.is_empty() {
        w(writer, " ")?;
        w(writer, data)?;
    }
    w(writer, "?>")
}

/// CDATA-Abschnitt; `]]>` im Inhalt wird auf zwei Abschnitte verteilt.
fn write_cdata(writer: &mut impl Write, text: &str) -> Result<()> {
    w(writer, "<![CDATA[")?;
    w(writer, &text.replace("]]>", "]]]]><![CDATA[>"))?;
    w(writer, "]]>")
}

/// XML-Escaping mit memchr3: sucht drei Zeichen gleichzeitig und ersetzt sie.
/// Große Blöcke ohne Escape-Zeichen werden in einem Stück geschrieben.
fn write_escaped_memchr3(
    w: &mut impl Write,
    s: &str,
    needle: [u8; 3],
    replacement: [&[u8]; 3],
) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while let Some(offset) = memchr::memchr3(needle[0], needle[1], needle[2], &bytes[start..]) {
        let pos = start + offset;
        w.write_all(&bytes[start..pos]).map_err(io_err)?;
        let replace = match bytes[pos] {
            b if b == needle[0] => replacement[0],
            b if b == needle[1] => replacement[1],
            _ => replacement[2],
        };
        w.write_all(replace).map_err(io_err)?;
        start = pos + 1;
    }
    w.write_all(&bytes[start..]).map_err(io_err)
}

/// Text-Inhalt: & < > → &amp; &lt; &gt;
fn write_escaped_text(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'>'], [b"&amp;", b"&lt;", b"&gt;"])
}

/// Attribut-Werte: & < " → &amp; &lt; &quot;
fn write_escaped_attr(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'"'], [b"&amp;", b"&lt;", b"&quot;"])
}

// ============================================================================
// XmlTreeSerializer
// ============================================================================

struct XmlTreeSerializer<W: Write> {
    writer: W,
}

impl<'a, N: DocumentNode<'a>, W: Write> NodeVisitor<'a, N> for XmlTreeSerializer<W> {
    fn visit_element(&mut self, node: N) -> Result<()> {
        let name = node.node_name();
        w(&mut self.writer, "<")?;
        w(&mut self.writer, name)?;
        for attr in node.attributes() {
            w(&mut self.writer, " ")?;
            w(&mut self.writer, attr.node_name())?;
            w(&mut self.writer, "=\"")?;
            write_escaped_attr(&mut self.writer, attr.value())?;
            w(&mut self.writer, "\"")?;
        }
        let mut children = node
            .children()
            .filter(|c| !matches!(c.kind(), NodeKind::Attribute | NodeKind::Other))
            .peekable();
        if children.peek().is_none() {
            return w(&mut self.writer, "/>");
        }
        w(&mut self.writer, ">")?;
        for child in children {
            walker::walk(self, child)?;
        }
        w(&mut self.writer, "</")?;
        w(&mut self.writer, name)?;
        w(&mut self.writer, ">")
    }

    fn visit_text(&mut self, node: N) -> Result<()> {
        write_escaped_text(&mut self.writer, node.value())
    }

    fn visit_cdata(&mut self, node: N) -> Result<()> {
        write_cdata(&mut self.writer, node.value())
    }

    fn visit_comment(&mut self, node: N) -> Result<()> {
        write_comment(&mut self.writer, node.value())
    }

    fn visit_processing_instruction(&mut self, node: N) -> Result<()> {
        write_pi(&mut self.writer, node.node_name(), node.value())
    }
}
