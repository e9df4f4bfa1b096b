//! Fast Infoset header (X.891 12.3-12.8).
//!
//! Der Header hat folgende Struktur:
//! - [XML-Deklaration] (optional): `<?xml encoding='finf'?>` (X.891 12.3)
//! - Identification + Version (required): `E0 00 00 01` (X.891 12.6, 12.7)
//! - Document-Octet (required): Optional-Component-Flags, hier immer `00`
//!   weil weder Initial-Vocabulary noch Additional-Data verwendet werden
//!
//! # Beispiel
//!
//! ```
//! use fastinf::header::{self, FiHeader};
//! use fastinf::octet_stream::{OctetReader, OctetWriter};
//!
//! let mut w = OctetWriter::new();
//! header::encode(&mut w, &FiHeader::default());
//! assert_eq!(w.bytes(), &[0xE0, 0x00, 0x00, 0x01, 0x00]);
//!
//! let bytes = w.into_vec();
//! let mut r = OctetReader::new(&bytes);
//! assert_eq!(header::decode(&mut r).unwrap(), FiHeader::default());
//! ```

use crate::constants::{BINARY_HEADER, DOCUMENT_NO_OPTIONAL_COMPONENTS, XML_DECLARATION};
use crate::octet_stream::{OctetReader, OctetWriter};
use crate::{Error, Result};

/// Fast Infoset header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FiHeader {
    xml_declaration: bool,
}

impl FiHeader {
    /// Header ohne XML-Deklaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Header mit vorangestellter XML-Deklaration.
    pub fn with_xml_declaration(mut self) -> Self {
        self.xml_declaration = true;
        self
    }

    /// Ob die XML-Deklaration geschrieben wird bzw. gelesen wurde.
    pub fn xml_declaration(&self) -> bool {
        self.xml_declaration
    }
}

/// Writes the header followed by the "no initial vocabulary" document octet.
pub fn encode(writer: &mut OctetWriter, header: &FiHeader) {
    if header.xml_declaration {
        writer.write_octets(XML_DECLARATION);
    }
    writer.write_octets(&BINARY_HEADER);
    writer.write_octet(DOCUMENT_NO_OPTIONAL_COMPONENTS);
}

/// Reads a header written by [`encode`].
///
/// Eine XML-Deklaration wird bis zum abschließenden `?>` übersprungen,
/// solange sie `finf` als Encoding nennt.
pub fn decode(reader: &mut OctetReader<'_>) -> Result<FiHeader> {
    let mut header = FiHeader::default();
    if reader.peek_octet() == Some(b'<') {
        let mut decl = Vec::with_capacity(XML_DECLARATION.len());
        loop {
            decl.push(reader.read_octet().map_err(|_| Error::MalformedHeader)?);
            if decl.ends_with(b"?>") {
                break;
            }
        }
        if !decl.starts_with(b"<?xml") || memchr::memmem::find(&decl, b"finf").is_none() {
            return Err(Error::MalformedHeader);
        }
        header.xml_declaration = true;
    }

    let ident = reader.read_slice(BINARY_HEADER.len()).map_err(|_| Error::MalformedHeader)?;
    if ident != BINARY_HEADER {
        return Err(Error::MalformedHeader);
    }

    let document = reader.read_octet()?;
    if document != DOCUMENT_NO_OPTIONAL_COMPONENTS {
        return Err(Error::unexpected_octet(document, "document optional components"));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_to_vec(header: &FiHeader) -> Vec<u8> {
        let mut w = OctetWriter::new();
        encode(&mut w, header);
        w.into_vec()
    }

    #[test]
    fn header_without_declaration() {
        assert_eq!(encode_to_vec(&FiHeader::new()), vec![0xE0, 0, 0, 1, 0]);
    }

    #[test]
    fn header_with_declaration() {
        let bytes = encode_to_vec(&FiHeader::new().with_xml_declaration());
        assert!(bytes.starts_with(b"<?xml encoding='finf'?>"));
        assert_eq!(&bytes[XML_DECLARATION.len()..], &[0xE0, 0, 0, 1, 0]);

        let mut r = OctetReader::new(&bytes);
        assert!(decode(&mut r).unwrap().xml_declaration());
        assert!(r.is_at_end());
    }

    #[test]
    fn standalone_declaration_accepted() {
        let mut bytes = b"<?xml encoding='finf' standalone='yes'?>".to_vec();
        bytes.extend_from_slice(&[0xE0, 0, 0, 1, 0]);
        let mut r = OctetReader::new(&bytes);
        assert!(decode(&mut r).unwrap().xml_declaration());
    }

    #[test]
    fn wrong_identification_rejected() {
        let mut r = OctetReader::new(&[0xE0, 0, 0, 2, 0]);
        assert_eq!(decode(&mut r).unwrap_err(), Error::MalformedHeader);
        let mut r = OctetReader::new(&[0xE0, 0]);
        assert_eq!(decode(&mut r).unwrap_err(), Error::MalformedHeader);
    }

    #[test]
    fn foreign_declaration_rejected() {
        let mut bytes = b"<?xml version='1.0'?>".to_vec();
        bytes.extend_from_slice(&[0xE0, 0, 0, 1, 0]);
        let mut r = OctetReader::new(&bytes);
        assert_eq!(decode(&mut r).unwrap_err(), Error::MalformedHeader);
    }

    #[test]
    fn initial_vocabulary_not_supported() {
        let mut r = OctetReader::new(&[0xE0, 0, 0, 1, 0x20]);
        assert!(matches!(
            decode(&mut r),
            Err(Error::UnexpectedOctet { octet: 0x20, .. })
        ));
    }
}
