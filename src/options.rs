//! Serializer options (construction-time, immutable per session).
//!
//! # Beispiel
//!
//! ```
//! use fastinf::options::SerializerOptions;
//! use fastinf::CharacterEncodingScheme;
//!
//! let opts = SerializerOptions::default()
//!     .with_ignore_comments(true)
//!     .with_attribute_value_size_constraint(8)
//!     .with_character_encoding_scheme(CharacterEncodingScheme::Utf16);
//!
//! assert!(opts.ignore_comments);
//! assert!(opts.attribute_value_fits(5));
//! assert!(!opts.attribute_value_fits(10));
//! ```

pub use crate::string::CharacterEncodingScheme;

/// Default-Grenze für Attributwerte und Character Chunks, die in die
/// Tabellen aufgenommen werden.
pub const DEFAULT_SIZE_CONSTRAINT: usize = 32;

/// Options controlling one serialization session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerOptions {
    /// Text, der nur aus SP/TAB/CR/LF besteht, nicht kodieren.
    pub ignore_whitespace_text_content: bool,
    /// Kommentare nicht kodieren.
    pub ignore_comments: bool,
    /// Processing Instructions nicht kodieren.
    pub ignore_processing_instructions: bool,
    /// Attribute values shorter than this (in characters) are added to the
    /// attribute value table; longer ones are written literal-only.
    pub attribute_value_size_constraint: usize,
    /// Obergrenze für die Summe der Zeichen in der Attributwert-Tabelle.
    pub attribute_value_map_memory_limit: usize,
    /// Character chunks shorter than this are added to the chunk table.
    pub character_content_chunk_size_constraint: usize,
    /// Obergrenze für die Summe der Zeichen in der Chunk-Tabelle.
    pub character_content_chunk_map_memory_limit: usize,
    /// Encoding der non identifying strings und Character Chunks.
    pub character_encoding_scheme: CharacterEncodingScheme,
    /// `<?xml encoding='finf'?>` vor den Binary-Header schreiben.
    pub xml_declaration: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            ignore_whitespace_text_content: false,
            ignore_comments: false,
            ignore_processing_instructions: false,
            attribute_value_size_constraint: DEFAULT_SIZE_CONSTRAINT,
            attribute_value_map_memory_limit: usize::MAX,
            character_content_chunk_size_constraint: DEFAULT_SIZE_CONSTRAINT,
            character_content_chunk_map_memory_limit: usize::MAX,
            character_encoding_scheme: CharacterEncodingScheme::Utf8,
            xml_declaration: false,
        }
    }
}

impl SerializerOptions {
    pub fn with_ignore_whitespace_text_content(mut self, val: bool) -> Self { self.ignore_whitespace_text_content = val; self }
    pub fn with_ignore_comments(mut self, val: bool) -> Self { self.ignore_comments = val; self }
    pub fn with_ignore_processing_instructions(mut self, val: bool) -> Self { self.ignore_processing_instructions = val; self }
    /// Setzt die Größengrenze für Attributwerte in der Tabelle.
    pub fn with_attribute_value_size_constraint(mut self, size: usize) -> Self { self.attribute_value_size_constraint = size; self }
    /// Setzt das Memory-Limit der Attributwert-Tabelle (Zeichen).
    pub fn with_attribute_value_map_memory_limit(mut self, limit: usize) -> Self { self.attribute_value_map_memory_limit = limit; self }
    /// Setzt die Größengrenze für Character Chunks in der Tabelle.
    pub fn with_character_content_chunk_size_constraint(mut self, size: usize) -> Self { self.character_content_chunk_size_constraint = size; self }
    /// Setzt das Memory-Limit der Chunk-Tabelle (Zeichen).
    pub fn with_character_content_chunk_map_memory_limit(mut self, limit: usize) -> Self { self.character_content_chunk_map_memory_limit = limit; self }
    pub fn with_character_encoding_scheme(mut self, ces: CharacterEncodingScheme) -> Self { self.character_encoding_scheme = ces; self }
    pub fn with_xml_declaration(mut self, val: bool) -> Self { self.xml_declaration = val; self }

    /// Ob ein Attributwert dieser Länge (Zeichen) in die Tabelle darf.
    #[inline]
    pub fn attribute_value_fits(&self, len: usize) -> bool {
        len < self.attribute_value_size_constraint
    }

    /// Ob ein Character Chunk dieser Länge (Zeichen) in die Tabelle darf.
    #[inline]
    pub fn character_chunk_fits(&self, len: usize) -> bool {
        len < self.character_content_chunk_size_constraint
    }
}
