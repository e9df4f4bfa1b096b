//! Trace reader: decodes a Fast Infoset document produced by this crate into
//! a flat list of [`Token`]s (X.891 C.2-C.8).
//!
//! Der Reader ist ein Diagnose-Werkzeug, kein vollständiger Decoder: er
//! versteht genau die Items, die der [`Encoder`](crate::Encoder) schreibt
//! (keine Initial-Vocabulary, keine Restricted Alphabets, von den Encoding
//! Algorithms nur `cdata`). Identifying strings werden über eigene Tabellen
//! aufgelöst, Indizes von Namen und Werten bleiben als Index sichtbar, damit
//! Tests die Vocabulary-Entscheidungen des Encoders prüfen können.
//!
//! Terminatoren: `F0` beendet eine Liste, `FF` beendet zwei (X.891 C.3.8).

use core::fmt;

use crate::constants::{
    ATTRIBUTE_LITERAL_QNAME_FLAG, CHARACTER_CHUNK_ADD_TO_TABLE_FLAG,
    CHARACTER_CHUNK_ENCODING_ALGORITHM_FLAG, CHARACTER_CHUNK_INDEX_FLAG,
    CHARACTER_CHUNK_RESTRICTED_ALPHABET_FLAG, CHARACTER_CHUNK_UTF_16_FLAG, COMMENT,
    DOCUMENT_TYPE_DECLARATION, DOCUMENT_TYPE_PUBLIC_IDENTIFIER_FLAG,
    DOCUMENT_TYPE_SYSTEM_IDENTIFIER_FLAG, DOUBLE_TERMINATOR, ELEMENT_ATTRIBUTE_FLAG,
    ELEMENT_LITERAL_QNAME_FLAG, ELEMENT_NAMESPACES_FLAG, ENCODING_ALGORITHM_CDATA,
    LITERAL_QNAME_NAMESPACE_NAME_FLAG, LITERAL_QNAME_PREFIX_FLAG, MAXIMUM_INDEX, NAMESPACE_ATTRIBUTE,
    NAMESPACE_ATTRIBUTE_MASK, NAMESPACE_ATTRIBUTE_NAME_FLAG, NAMESPACE_ATTRIBUTE_PREFIX_FLAG,
    NISTRING_ADD_TO_TABLE_FLAG, NISTRING_EMPTY, NISTRING_UTF_16_FLAG, PROCESSING_INSTRUCTION,
    TERMINATOR, XML_NAMESPACE_NAME, XML_NAMESPACE_PREFIX,
};
use crate::header;
use crate::integer;
use crate::octet_stream::OctetReader;
use crate::options::CharacterEncodingScheme;
use crate::string;
use crate::{Error, Result};

// ============================================================================
// Tokens
// ============================================================================

/// Element or attribute name as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameToken {
    /// Index in die Element- bzw. Attributnamen-Tabelle.
    Indexed(usize),
    /// Literaler Name (C.18); Prefix und Namespace-Name aufgelöst.
    Literal {
        prefix: Option<String>,
        namespace_name: Option<String>,
        local_name: String,
    },
}

/// Non identifying string (C.14) or character chunk content (C.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueToken {
    Empty,
    Indexed(usize),
    Literal { value: String, add_to_table: bool },
}

/// Namespace attribute (C.12); `None` = Feld nicht vorhanden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceToken {
    pub prefix: Option<String>,
    pub namespace_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeToken {
    pub name: NameToken,
    pub value: ValueToken,
}

/// One decoded information item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartElement {
        namespaces: Vec<NamespaceToken>,
        name: NameToken,
        attributes: Vec<AttributeToken>,
    },
    EndElement,
    Characters {
        value: ValueToken,
    },
    /// Character chunk mit dem `cdata`-Algorithmus.
    CData {
        value: String,
    },
    Comment {
        value: ValueToken,
    },
    ProcessingInstruction {
        target: String,
        data: ValueToken,
    },
    DocumentTypeDeclaration {
        system_id: Option<String>,
        public_id: Option<String>,
    },
    EndDocument,
}

impl fmt::Display for NameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indexed(index) => write!(f, "#{index}"),
            Self::Literal {
                prefix,
                namespace_name,
                local_name,
            } => {
                if let Some(ns) = namespace_name {
                    write!(f, "{{{ns}}}")?;
                }
                match prefix {
                    Some(p) => write!(f, "{p}:{local_name}"),
                    None => write!(f, "{local_name}"),
                }
            }
        }
    }
}

impl fmt::Display for ValueToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "\"\""),
            Self::Indexed(index) => write!(f, "#{index}"),
            Self::Literal {
                value,
                add_to_table,
            } => {
                write!(f, "{value:?}")?;
                if *add_to_table {
                    write!(f, "+")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartElement {
                namespaces,
                name,
                attributes,
            } => {
                write!(f, "SE {name}")?;
                for ns in namespaces {
                    match &ns.prefix {
                        Some(p) => write!(f, " xmlns:{p}")?,
                        None => write!(f, " xmlns")?,
                    }
                    write!(f, "={:?}", ns.namespace_name.as_deref().unwrap_or(""))?;
                }
                for attr in attributes {
                    write!(f, " {}={}", attr.name, attr.value)?;
                }
                Ok(())
            }
            Self::EndElement => write!(f, "EE"),
            Self::Characters { value } => write!(f, "CH {value}"),
            Self::CData { value } => write!(f, "CD {value:?}"),
            Self::Comment { value } => write!(f, "CM {value}"),
            Self::ProcessingInstruction { target, data } => write!(f, "PI {target} {data}"),
            Self::DocumentTypeDeclaration {
                system_id,
                public_id,
            } => write!(
                f,
                "DT system={:?} public={:?}",
                system_id.as_deref().unwrap_or(""),
                public_id.as_deref().unwrap_or("")
            ),
            Self::EndDocument => write!(f, "ED"),
        }
    }
}

/// Eine Zeile pro Token, eingerückt nach Elementtiefe.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for token in tokens {
        if matches!(token, Token::EndElement) {
            depth = depth.saturating_sub(1);
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&token.to_string());
        out.push('\n');
        if matches!(token, Token::StartElement { .. }) {
            depth += 1;
        }
    }
    out
}

// ============================================================================
// Reader
// ============================================================================

/// Decodes `data` into tokens. Der letzte Token ist immer
/// [`Token::EndDocument`]; Octets danach sind ein Fehler.
pub fn read_trace(data: &[u8]) -> Result<Vec<Token>> {
    let mut reader = TraceReader::new(data);
    header::decode(&mut reader.r)?;
    reader.read_document()?;
    Ok(reader.tokens)
}

/// Tabellen des Lesers, spiegeln das Vocabulary des Encoders.
#[derive(Default)]
struct Tables {
    prefix: Vec<String>,
    namespace_name: Vec<String>,
    local_name: Vec<String>,
    other_ncname: Vec<String>,
    other_uri: Vec<String>,
    attribute_value: Vec<String>,
    other_string: Vec<String>,
    character_content_chunk: Vec<String>,
    element_name_count: usize,
    attribute_name_count: usize,
}

impl Tables {
    fn new() -> Self {
        Self {
            prefix: vec![XML_NAMESPACE_PREFIX.to_owned()],
            namespace_name: vec![XML_NAMESPACE_NAME.to_owned()],
            ..Self::default()
        }
    }
}

/// Welche String-Tabelle ein Item verwendet.
#[derive(Clone, Copy)]
enum Table {
    Prefix,
    NamespaceName,
    LocalName,
    OtherNcname,
    OtherUri,
    AttributeValue,
    OtherString,
}

struct TraceReader<'a> {
    r: OctetReader<'a>,
    tables: Tables,
    tokens: Vec<Token>,
    /// Noch nicht verbrauchte Terminatoren aus einem `FF`.
    pending_terminators: usize,
    depth: usize,
}

impl<'a> TraceReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            r: OctetReader::new(data),
            tables: Tables::new(),
            tokens: Vec::new(),
            pending_terminators: 0,
            depth: 0,
        }
    }

    fn table(&mut self, table: Table) -> &mut Vec<String> {
        match table {
            Table::Prefix => &mut self.tables.prefix,
            Table::NamespaceName => &mut self.tables.namespace_name,
            Table::LocalName => &mut self.tables.local_name,
            Table::OtherNcname => &mut self.tables.other_ncname,
            Table::OtherUri => &mut self.tables.other_uri,
            Table::AttributeValue => &mut self.tables.attribute_value,
            Table::OtherString => &mut self.tables.other_string,
        }
    }

    /// Verbraucht einen Terminator, falls als Nächstes einer ansteht.
    fn take_terminator(&mut self) -> Result<bool> {
        if self.pending_terminators > 0 {
            self.pending_terminators -= 1;
            return Ok(true);
        }
        match self.r.peek_octet() {
            Some(TERMINATOR) => {
                self.r.read_octet()?;
                Ok(true)
            }
            Some(DOUBLE_TERMINATOR) => {
                self.r.read_octet()?;
                self.pending_terminators = 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(Error::PrematureEndOfStream),
        }
    }

    /// Document- und Element-Children (C.2.11, C.3.7) bis zum letzten
    /// Terminator.
    fn read_document(&mut self) -> Result<()> {
        loop {
            if self.take_terminator()? {
                if self.depth == 0 {
                    break;
                }
                self.depth -= 1;
                self.tokens.push(Token::EndElement);
                continue;
            }
            let b = self.r.read_octet()?;
            if b & 0x80 == 0 {
                self.read_element(b)?;
            } else if b & 0xC0 == 0x80 {
                if self.depth == 0 {
                    return Err(Error::unexpected_octet(b, "character chunk at document level"));
                }
                self.read_character_chunk(b)?;
            } else if b == PROCESSING_INSTRUCTION {
                self.read_processing_instruction()?;
            } else if b == COMMENT {
                let value = self.read_non_identifying_string(Table::OtherString)?;
                self.tokens.push(Token::Comment { value });
            } else if b & 0xFC == DOCUMENT_TYPE_DECLARATION && self.depth == 0 {
                self.read_document_type_declaration(b)?;
            } else {
                return Err(Error::unexpected_octet(b, "children"));
            }
        }

        if self.pending_terminators > 0 {
            return Err(Error::unexpected_octet(
                DOUBLE_TERMINATOR,
                "double terminator at end of document",
            ));
        }
        if let Some(trailing) = self.r.peek_octet() {
            return Err(Error::unexpected_octet(trailing, "after end of document"));
        }
        self.tokens.push(Token::EndDocument);
        Ok(())
    }

    /// Element (C.3): optionale Namespace-Attribute, Name, Attribute.
    fn read_element(&mut self, first: u8) -> Result<()> {
        let has_attributes = first & ELEMENT_ATTRIBUTE_FLAG != 0;
        let mut namespaces = Vec::new();
        let mut b = first;
        if first & 0x3C == ELEMENT_NAMESPACES_FLAG {
            loop {
                let n = self.r.read_octet()?;
                if n == TERMINATOR {
                    break;
                }
                if n & NAMESPACE_ATTRIBUTE_MASK != NAMESPACE_ATTRIBUTE {
                    return Err(Error::unexpected_octet(n, "namespace attribute"));
                }
                let prefix = if n & NAMESPACE_ATTRIBUTE_PREFIX_FLAG != 0 {
                    Some(self.read_identifying_string(Table::Prefix)?)
                } else {
                    None
                };
                let namespace_name = if n & NAMESPACE_ATTRIBUTE_NAME_FLAG != 0 {
                    Some(self.read_identifying_string(Table::NamespaceName)?)
                } else {
                    None
                };
                namespaces.push(NamespaceToken {
                    prefix,
                    namespace_name,
                });
            }
            b = self.r.read_octet()?;
            if b & 0xC0 != 0 {
                return Err(Error::unexpected_octet(b, "element name"));
            }
        }

        let name = if b & 0x3C == ELEMENT_LITERAL_QNAME_FLAG {
            let name = self.read_literal_qname(b)?;
            self.tables.element_name_count =
                (self.tables.element_name_count + 1).min(MAXIMUM_INDEX);
            name
        } else {
            let index = integer::decode_on_third_bit(b, &mut self.r)?;
            if index > self.tables.element_name_count {
                return Err(Error::unexpected_octet(b, "element name index"));
            }
            NameToken::Indexed(index)
        };

        let mut attributes = Vec::new();
        if has_attributes {
            while !self.take_terminator()? {
                let a = self.r.read_octet()?;
                let name = if a & ATTRIBUTE_LITERAL_QNAME_FLAG == ATTRIBUTE_LITERAL_QNAME_FLAG {
                    let name = self.read_literal_qname(a)?;
                    self.tables.attribute_name_count =
                        (self.tables.attribute_name_count + 1).min(MAXIMUM_INDEX);
                    name
                } else {
                    let index = integer::decode_on_second_bit(a, &mut self.r)?;
                    if index > self.tables.attribute_name_count {
                        return Err(Error::unexpected_octet(a, "attribute name index"));
                    }
                    NameToken::Indexed(index)
                };
                let value = self.read_non_identifying_string(Table::AttributeValue)?;
                attributes.push(AttributeToken { name, value });
            }
        }

        self.tokens.push(Token::StartElement {
            namespaces,
            name,
            attributes,
        });
        self.depth += 1;
        Ok(())
    }

    /// Literal qualified name (C.18); `b` trägt Prefix- und Namespace-Flag.
    fn read_literal_qname(&mut self, b: u8) -> Result<NameToken> {
        let prefix = if b & LITERAL_QNAME_PREFIX_FLAG != 0 {
            Some(self.read_indexed(Table::Prefix)?)
        } else {
            None
        };
        let namespace_name = if b & LITERAL_QNAME_NAMESPACE_NAME_FLAG != 0 {
            Some(self.read_indexed(Table::NamespaceName)?)
        } else {
            None
        };
        let local_name = self.read_identifying_string(Table::LocalName)?;
        Ok(NameToken::Literal {
            prefix,
            namespace_name,
            local_name,
        })
    }

    /// Index auf dem zweiten Bit, erstes Bit eins (C.13.4).
    fn read_indexed(&mut self, table: Table) -> Result<String> {
        let b = self.r.read_octet()?;
        if b & 0x80 == 0 {
            return Err(Error::unexpected_octet(b, "name surrogate index"));
        }
        let index = integer::decode_on_second_bit(b, &mut self.r)?;
        self.resolve(table, index, b)
    }

    fn resolve(&mut self, table: Table, index: usize, b: u8) -> Result<String> {
        let strings = self.table(table);
        index
            .checked_sub(1)
            .and_then(|pos| strings.get(pos))
            .cloned()
            .ok_or_else(|| Error::unexpected_octet(b, "string index out of range"))
    }

    /// Identifying string on the first bit (C.13).
    fn read_identifying_string(&mut self, table: Table) -> Result<String> {
        let b = self.r.read_octet()?;
        if b & 0x80 != 0 {
            let index = integer::decode_on_second_bit(b, &mut self.r)?;
            return self.resolve(table, index, b);
        }
        let len = string::read_length_on_second_bit(b, &mut self.r)?;
        let s = CharacterEncodingScheme::Utf8.decode(self.r.read_slice(len)?)?;
        push_bounded(self.table(table), &s);
        Ok(s)
    }

    /// Non identifying string on the first bit (C.14).
    fn read_non_identifying_string(&mut self, table: Table) -> Result<ValueToken> {
        let b = self.r.read_octet()?;
        if b == NISTRING_EMPTY {
            return Ok(ValueToken::Empty);
        }
        if b & 0x80 != 0 {
            let index = integer::decode_on_second_bit(b, &mut self.r)?;
            self.resolve(table, index, b)?;
            return Ok(ValueToken::Indexed(index));
        }
        let ces = match b & 0x30 {
            0 => CharacterEncodingScheme::Utf8,
            NISTRING_UTF_16_FLAG => CharacterEncodingScheme::Utf16,
            _ => return Err(Error::unexpected_octet(b, "non identifying string encoding")),
        };
        let len = string::read_length_on_fifth_bit(b, &mut self.r)?;
        let value = ces.decode(self.r.read_slice(len)?)?;
        let add_to_table = b & NISTRING_ADD_TO_TABLE_FLAG != 0;
        if add_to_table {
            push_bounded(self.table(table), &value);
        }
        Ok(ValueToken::Literal {
            value,
            add_to_table,
        })
    }

    /// Character chunk (C.7) inkl. `cdata` Encoding Algorithm (X.891 10.10).
    fn read_character_chunk(&mut self, b: u8) -> Result<()> {
        if b & CHARACTER_CHUNK_INDEX_FLAG != 0 {
            let index = integer::decode_on_fourth_bit(b, &mut self.r)?;
            if index > self.tables.character_content_chunk.len() || index == 0 {
                return Err(Error::unexpected_octet(b, "character chunk index"));
            }
            self.tokens.push(Token::Characters {
                value: ValueToken::Indexed(index),
            });
            return Ok(());
        }

        let add_to_table = b & CHARACTER_CHUNK_ADD_TO_TABLE_FLAG != 0;
        match b & CHARACTER_CHUNK_ENCODING_ALGORITHM_FLAG {
            CHARACTER_CHUNK_ENCODING_ALGORITHM_FLAG => {
                let next = self.r.read_octet()?;
                let algorithm = (b & 0x03) << 6 | next >> 2;
                if algorithm != ENCODING_ALGORITHM_CDATA {
                    return Err(Error::unexpected_octet(b, "encoding algorithm"));
                }
                let len = string::read_length_on_seventh_bit(next, &mut self.r)?;
                let value = CharacterEncodingScheme::Utf8.decode(self.r.read_slice(len)?)?;
                self.tokens.push(Token::CData { value });
            }
            CHARACTER_CHUNK_RESTRICTED_ALPHABET_FLAG => {
                return Err(Error::unexpected_octet(b, "restricted alphabet"));
            }
            scheme => {
                let ces = if scheme == CHARACTER_CHUNK_UTF_16_FLAG {
                    CharacterEncodingScheme::Utf16
                } else {
                    CharacterEncodingScheme::Utf8
                };
                let len = string::read_length_on_seventh_bit(b, &mut self.r)?;
                let value = ces.decode(self.r.read_slice(len)?)?;
                if add_to_table {
                    push_bounded(&mut self.tables.character_content_chunk, &value);
                }
                self.tokens.push(Token::Characters {
                    value: ValueToken::Literal {
                        value,
                        add_to_table,
                    },
                });
            }
        }
        Ok(())
    }

    /// Processing instruction (C.5); das `E1`-Octet ist bereits gelesen.
    fn read_processing_instruction(&mut self) -> Result<()> {
        let target = self.read_identifying_string(Table::OtherNcname)?;
        let data = self.read_non_identifying_string(Table::OtherString)?;
        self.tokens
            .push(Token::ProcessingInstruction { target, data });
        Ok(())
    }

    /// Document type declaration (C.9): IDs, dann PIs bis zum Terminator.
    fn read_document_type_declaration(&mut self, b: u8) -> Result<()> {
        let system_id = if b & DOCUMENT_TYPE_SYSTEM_IDENTIFIER_FLAG != 0 {
            Some(self.read_identifying_string(Table::OtherUri)?)
        } else {
            None
        };
        let public_id = if b & DOCUMENT_TYPE_PUBLIC_IDENTIFIER_FLAG != 0 {
            Some(self.read_identifying_string(Table::OtherUri)?)
        } else {
            None
        };
        self.tokens.push(Token::DocumentTypeDeclaration {
            system_id,
            public_id,
        });
        while !self.take_terminator()? {
            let pi = self.r.read_octet()?;
            if pi != PROCESSING_INSTRUCTION {
                return Err(Error::unexpected_octet(pi, "document type declaration"));
            }
            self.read_processing_instruction()?;
        }
        Ok(())
    }
}

/// Volle Tabellen wachsen nicht weiter, wie im Encoder.
fn push_bounded(table: &mut Vec<String>, s: &str) {
    if table.len() < MAXIMUM_INDEX {
        table.push(s.to_owned());
    }
}
