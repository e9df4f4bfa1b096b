//! Fast Infoset stream encoder (X.891 Annex C).
//!
//! Der [`Encoder`] ist die Low-Level-Schnittstelle: er bekommt Elemente mit
//! ihren Namespace-Attributen und regulären Attributen, Text, Kommentare
//! und PIs in Dokumentreihenfolge und schreibt die Octets in einen internen
//! Buffer. Vocabulary-Lookups (literal + registrieren vs. Index-Referenz)
//! passieren hier; Namespace-Scoping und das Auflösen eines Dokumentmodells
//! liegen eine Ebene höher im [`DocumentSerializer`](crate::serializer::DocumentSerializer).
//!
//! # Beispiel
//!
//! ```
//! use fastinf::encoder::{Encoder, NameRef};
//! use fastinf::options::SerializerOptions;
//!
//! let mut enc = Encoder::new(SerializerOptions::default());
//! enc.start_document().unwrap();
//! enc.start_element(NameRef::local("root"), &[], &[]).unwrap();
//! enc.characters("hi").unwrap();
//! enc.end_element().unwrap();
//! enc.end_document().unwrap();
//! let bytes = enc.finish().unwrap();
//! assert_eq!(&bytes[..5], &[0xE0, 0x00, 0x00, 0x01, 0x00]);
//! ```

mod qname;
mod value;

use std::io::Write;
use std::rc::Rc;

use log::{debug, trace};

use crate::constants::{
    DOCUMENT_TYPE_DECLARATION, DOCUMENT_TYPE_PUBLIC_IDENTIFIER_FLAG,
    DOCUMENT_TYPE_SYSTEM_IDENTIFIER_FLAG, DOUBLE_TERMINATOR, ELEMENT, ELEMENT_ATTRIBUTE_FLAG,
    ELEMENT_NAMESPACES_FLAG, TERMINATOR,
};
use crate::error::{Error, Result};
use crate::header::{self, FiHeader};
use crate::octet_stream::OctetWriter;
use crate::options::SerializerOptions;
use crate::qname::StringInterner;
use crate::vocabulary::SerializerVocabulary;

// ============================================================================
// Eingabetypen
// ============================================================================

/// Borrowed qualified name as handed to the encoder.
///
/// `namespace_name` leer = kein Namespace. Ein Prefix ohne Namespace wird
/// beim Literal ignoriert (X.891 C.18 kennt keinen Prefix ohne Namespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRef<'a> {
    pub prefix: &'a str,
    pub namespace_name: &'a str,
    pub local_name: &'a str,
}

impl<'a> NameRef<'a> {
    pub fn new(prefix: &'a str, namespace_name: &'a str, local_name: &'a str) -> Self {
        Self {
            prefix,
            namespace_name,
            local_name,
        }
    }

    /// Unpräfixierter Name ohne Namespace.
    pub fn local(local_name: &'a str) -> Self {
        Self::new("", "", local_name)
    }
}

/// A namespace attribute (`xmlns` / `xmlns:prefix`). An empty `namespace_name`
/// undeclares the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceRef<'a> {
    pub prefix: &'a str,
    pub namespace_name: &'a str,
}

impl<'a> NamespaceRef<'a> {
    pub fn new(prefix: &'a str, namespace_name: &'a str) -> Self {
        Self {
            prefix,
            namespace_name,
        }
    }
}

/// A regular attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRef<'a> {
    pub name: NameRef<'a>,
    pub value: &'a str,
}

impl<'a> AttributeRef<'a> {
    pub fn new(name: NameRef<'a>, value: &'a str) -> Self {
        Self { name, value }
    }
}

// ============================================================================
// Terminator-Zustand
// ============================================================================

/// Noch nicht geschriebener Terminator (X.891 C.2.11, C.3.8).
///
/// Ein einzelnes `F0` beendet eine Attribut- oder Child-Liste. Zwei
/// aufeinanderfolgende Terminatoren werden zu `FF` zusammengefasst, deshalb
/// wird das Octet erst geschrieben, wenn feststeht was folgt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentState {
    Initial,
    Open,
    Finished,
}

// ============================================================================
// Encoder
// ============================================================================

/// Streaming Fast Infoset encoder for one document at a time.
///
/// Nicht reentrant: ein Dokument muss mit `end_document()` abgeschlossen
/// (oder per `reset()` verworfen) werden, bevor das nächste beginnt.
pub struct Encoder {
    out: OctetWriter,
    options: SerializerOptions,
    vocabulary: SerializerVocabulary,
    interner: StringInterner,
    pending: Pending,
    state: DocumentState,
    /// Anzahl offener Elemente.
    depth: usize,
    /// Scratch für kodierte Strings (UTF-8/UTF-16).
    encoding_buf: Vec<u8>,
    /// Scratch für den lexikalischen Vocabulary-Key `prefix:local`.
    key_buf: String,
}

impl Encoder {
    /// Creates an encoder with the given options.
    pub fn new(options: SerializerOptions) -> Self {
        Self {
            out: OctetWriter::new(),
            options,
            vocabulary: SerializerVocabulary::new(),
            interner: StringInterner::new(),
            pending: Pending::None,
            state: DocumentState::Initial,
            depth: 0,
            encoding_buf: Vec::with_capacity(64),
            key_buf: String::with_capacity(32),
        }
    }

    /// Die Optionen dieser Session.
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Read-only Zugriff auf das Vocabulary (Tests, Diagnose).
    pub fn vocabulary(&self) -> &SerializerVocabulary {
        &self.vocabulary
    }

    /// Clears all session state: buffer, vocabulary, terminator, depth.
    ///
    /// Kapazitäten bleiben erhalten.
    pub fn reset(&mut self) {
        self.out.clear();
        self.vocabulary.clear();
        self.interner.clear();
        self.pending = Pending::None;
        self.state = DocumentState::Initial;
        self.depth = 0;
        debug!("encoder reset");
    }

    /// Writes the header and the initial vocabulary octet.
    pub fn start_document(&mut self) -> Result<()> {
        match self.state {
            DocumentState::Initial => {}
            DocumentState::Open => {
                return Err(Error::structural("document already started"));
            }
            DocumentState::Finished => return Err(Error::DocumentFinished),
        }
        let mut fi_header = FiHeader::new();
        if self.options.xml_declaration {
            fi_header = fi_header.with_xml_declaration();
        }
        header::encode(&mut self.out, &fi_header);
        self.state = DocumentState::Open;
        Ok(())
    }

    /// Writes the document termination and marks the session finished.
    pub fn end_document(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.depth != 0 {
            return Err(Error::structural(format!(
                "{} element(s) still open at end of document",
                self.depth
            )));
        }
        self.element_termination();
        self.termination();
        self.state = DocumentState::Finished;
        debug!(
            "document finished: {} octets, {} element names, {} attribute names",
            self.out.position(),
            self.vocabulary.element_name.len(),
            self.vocabulary.attribute_name.len()
        );
        Ok(())
    }

    /// Starts an element with its namespace attributes and regular attributes
    /// (X.891 C.3).
    pub fn start_element(
        &mut self,
        name: NameRef<'_>,
        namespaces: &[NamespaceRef<'_>],
        attributes: &[AttributeRef<'_>],
    ) -> Result<()> {
        self.ensure_open()?;
        self.termination();
        trace!("start element {{{}}}{}", name.namespace_name, name.local_name);

        let mut b = ELEMENT;
        if !attributes.is_empty() {
            b |= ELEMENT_ATTRIBUTE_FLAG;
        }
        if !namespaces.is_empty() {
            self.out.write_octet(b | ELEMENT_NAMESPACES_FLAG);
            for ns in namespaces {
                self.encode_namespace_attribute(ns.prefix, ns.namespace_name)?;
            }
            self.out.write_octet(TERMINATOR);
            b = ELEMENT;
        }

        self.encode_element_qname(b, name)?;

        if !attributes.is_empty() {
            for attribute in attributes {
                self.encode_attribute_qname(attribute.name)?;
                self.encode_attribute_value(attribute.value)?;
            }
            self.pending = Pending::Single;
        }
        self.depth += 1;
        Ok(())
    }

    /// Ends the innermost open element.
    pub fn end_element(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.depth == 0 {
            return Err(Error::UnbalancedEndElement);
        }
        self.element_termination();
        self.depth -= 1;
        Ok(())
    }

    /// Writes a character chunk. Empty text writes nothing.
    pub fn characters(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        if text.is_empty() {
            return Ok(());
        }
        self.termination();
        self.encode_character_chunk(text)
    }

    /// Writes a CDATA section via the built-in `cdata` encoding algorithm.
    /// Empty sections write nothing.
    pub fn cdata(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        if text.is_empty() {
            return Ok(());
        }
        self.termination();
        self.encode_cdata(text)
    }

    /// Writes a comment. An empty comment is still written (zero-length payload).
    pub fn comment(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        self.termination();
        self.encode_comment(text)
    }

    /// Writes a processing instruction.
    pub fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        self.ensure_open()?;
        if target.is_empty() {
            return Err(Error::structural("processing instruction without target"));
        }
        self.termination();
        self.encode_processing_instruction(target, data)
    }

    /// Writes a document type declaration (only before the document element).
    ///
    /// Interne Subsets werden nicht übertragen; nur System- und Public-ID.
    pub fn document_type_declaration(
        &mut self,
        system_id: Option<&str>,
        public_id: Option<&str>,
    ) -> Result<()> {
        self.ensure_open()?;
        if self.depth != 0 {
            return Err(Error::structural("document type declaration inside element"));
        }
        self.termination();
        let system_id = system_id.filter(|s| !s.is_empty());
        let public_id = public_id.filter(|s| !s.is_empty());
        let mut b = DOCUMENT_TYPE_DECLARATION;
        if system_id.is_some() {
            b |= DOCUMENT_TYPE_SYSTEM_IDENTIFIER_FLAG;
        }
        if public_id.is_some() {
            b |= DOCUMENT_TYPE_PUBLIC_IDENTIFIER_FLAG;
        }
        self.out.write_octet(b);
        if let Some(system_id) = system_id {
            qname::write_identifying_string(&mut self.out, &mut self.vocabulary.other_uri, system_id)?;
        }
        if let Some(public_id) = public_id {
            qname::write_identifying_string(&mut self.out, &mut self.vocabulary.other_uri, public_id)?;
        }
        // Die (leere) Child-Liste der DTD endet mit einem Terminator.
        self.pending = Pending::Single;
        Ok(())
    }

    /// Anzahl offener Elemente.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Ob `end_document()` bereits geschrieben wurde.
    pub fn is_finished(&self) -> bool {
        self.state == DocumentState::Finished
    }

    /// Gibt die aktuelle Buffer-Größe in Bytes zurück.
    pub fn buf_len(&self) -> usize {
        self.out.buf_len()
    }

    /// Noch nicht abgegebene Octets.
    pub fn bytes(&self) -> &[u8] {
        self.out.bytes()
    }

    /// Schreibt alle bisher kodierten Bytes in `writer` und leert den Buffer.
    ///
    /// Für Streaming-Output: periodisch aufrufen, um den Speicherverbrauch
    /// zu begrenzen. Ein noch ausstehender Terminator bleibt zurückgehalten.
    pub fn flush_to(&mut self, writer: &mut impl Write) -> Result<()> {
        self.out.drain_to(writer)
    }

    /// Beendet das Encoding und gibt den restlichen Buffer zurück.
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.state != DocumentState::Finished {
            return Err(Error::structural("document not terminated"));
        }
        Ok(self.out.into_vec())
    }

    /// Drains the remaining octets of a finished document into `writer` and
    /// flushes it.
    pub fn finish_to(&mut self, writer: &mut impl Write) -> Result<()> {
        if self.state != DocumentState::Finished {
            return Err(Error::structural("document not terminated"));
        }
        self.out.drain_to(writer)?;
        writer.flush().map_err(Error::io)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            DocumentState::Open => Ok(()),
            DocumentState::Initial => Err(Error::structural("document not started")),
            DocumentState::Finished => Err(Error::DocumentFinished),
        }
    }

    /// Schreibt einen ausstehenden Terminator.
    fn termination(&mut self) {
        match self.pending {
            Pending::None => {}
            Pending::Single => self.out.write_octet(TERMINATOR),
            Pending::Double => self.out.write_octet(DOUBLE_TERMINATOR),
        }
        self.pending = Pending::None;
    }

    /// Element-Ende: zwei ausstehende Terminatoren werden zu `FF`.
    fn element_termination(&mut self) {
        self.pending = match self.pending {
            Pending::None => Pending::Single,
            Pending::Single => Pending::Double,
            Pending::Double => {
                self.out.write_octet(DOUBLE_TERMINATOR);
                Pending::Single
            }
        };
    }

    /// Interned den Namespace-Namen (ein `Rc` pro URI und Session).
    fn intern(&mut self, s: &str) -> Rc<str> {
        self.interner.intern(s)
    }
}

#[cfg(test)]
mod tests;
