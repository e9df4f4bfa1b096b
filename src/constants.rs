//! Octet values and flag bits of the Fast Infoset binary encoding (X.891 Annex C).

/// Optional XML declaration in front of the binary header (X.891 12.3).
pub const XML_DECLARATION: &[u8] = b"<?xml encoding='finf'?>";

/// Identification + version 1 (X.891 12.6, 12.7).
pub const BINARY_HEADER: [u8; 4] = [0xE0, 0x00, 0x00, 0x01];

/// Document octet without optional components (C.2.3).
pub const DOCUMENT_NO_OPTIONAL_COMPONENTS: u8 = 0x00;
pub const DOCUMENT_INITIAL_VOCABULARY_FLAG: u8 = 0x20;

pub const TERMINATOR: u8 = 0xF0;
pub const DOUBLE_TERMINATOR: u8 = 0xFF;

// Children (C.3.7.2, C.2.11.2)
pub const ELEMENT: u8 = 0x00;
pub const ELEMENT_ATTRIBUTE_FLAG: u8 = 0x40;
pub const ELEMENT_NAMESPACES_FLAG: u8 = 0x38;
pub const ELEMENT_LITERAL_QNAME_FLAG: u8 = 0x3C;

pub const NAMESPACE_ATTRIBUTE: u8 = 0xCC;
pub const NAMESPACE_ATTRIBUTE_MASK: u8 = 0xFC;
pub const NAMESPACE_ATTRIBUTE_PREFIX_FLAG: u8 = 0x02;
pub const NAMESPACE_ATTRIBUTE_NAME_FLAG: u8 = 0x01;

pub const ATTRIBUTE_LITERAL_QNAME_FLAG: u8 = 0x78;

pub const LITERAL_QNAME_PREFIX_FLAG: u8 = 0x02;
pub const LITERAL_QNAME_NAMESPACE_NAME_FLAG: u8 = 0x01;

pub const CHARACTER_CHUNK: u8 = 0x80;
pub const CHARACTER_CHUNK_INDEX_FLAG: u8 = 0x20;
pub const CHARACTER_CHUNK_ADD_TO_TABLE_FLAG: u8 = 0x10;
pub const CHARACTER_CHUNK_UTF_16_FLAG: u8 = 0x04;
pub const CHARACTER_CHUNK_RESTRICTED_ALPHABET_FLAG: u8 = 0x08;
pub const CHARACTER_CHUNK_ENCODING_ALGORITHM_FLAG: u8 = 0x0C;

pub const PROCESSING_INSTRUCTION: u8 = 0xE1;
pub const COMMENT: u8 = 0xE2;

pub const DOCUMENT_TYPE_DECLARATION: u8 = 0xC4;
pub const DOCUMENT_TYPE_SYSTEM_IDENTIFIER_FLAG: u8 = 0x02;
pub const DOCUMENT_TYPE_PUBLIC_IDENTIFIER_FLAG: u8 = 0x01;

// Non identifying string on the first bit (C.14)
pub const NISTRING_ADD_TO_TABLE_FLAG: u8 = 0x40;
pub const NISTRING_UTF_16_FLAG: u8 = 0x10;
pub const NISTRING_INDEX_FLAG: u8 = 0x80;
/// Index mit sieben '1'-Bits: leerer String (C.26).
pub const NISTRING_EMPTY: u8 = 0xFF;

/// Built-in encoding algorithm "cdata" (X.891 10.10).
pub const ENCODING_ALGORITHM_CDATA: u8 = 9;

/// Largest index an integer on the 2nd, 3rd or 4th bit can carry (C.25-C.28).
pub const MAXIMUM_INDEX: usize = 1 << 20;

pub const XML_NAMESPACE_PREFIX: &str = "xml";
pub const XML_NAMESPACE_NAME: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NAMESPACE_PREFIX: &str = "xmlns";
pub const XMLNS_NAMESPACE_NAME: &str = "http://www.w3.org/2000/xmlns/";
