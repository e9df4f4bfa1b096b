//! Attribute values, character chunks, comments and processing instructions
//! (X.891 C.4.4, C.7, C.8, C.5, C.14, C.15).

use crate::constants::{
    CHARACTER_CHUNK, CHARACTER_CHUNK_ADD_TO_TABLE_FLAG, CHARACTER_CHUNK_ENCODING_ALGORITHM_FLAG,
    CHARACTER_CHUNK_INDEX_FLAG, CHARACTER_CHUNK_UTF_16_FLAG, COMMENT, ENCODING_ALGORITHM_CDATA,
    NISTRING_ADD_TO_TABLE_FLAG, NISTRING_EMPTY, NISTRING_UTF_16_FLAG, PROCESSING_INSTRUCTION,
};
use crate::error::Result;
use crate::integer;
use crate::options::CharacterEncodingScheme;
use crate::string;
use crate::vocabulary::StringIndexMap;

use super::Encoder;
use super::qname::write_identifying_string;

/// Ergebnis des Tabellen-Lookups für einen non identifying string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Index(usize),
    Literal { add_to_table: bool },
}

/// Looks `s` up in `table`.
///
/// Ist der String tabellenfähig (`eligible`), ist die Tabelle nicht voll und
/// passt er noch unter das Memory-Limit, wird er bei Fehlschlag hinzugefügt
/// (`add_to_table`). Sonst wird nur nach einem vorhandenen Eintrag gesucht.
fn lookup(table: &mut StringIndexMap, s: &str, eligible: bool, memory_limit: usize) -> Lookup {
    let fits_memory = eligible
        && !table.is_full()
        && table
            .total_characters()
            .saturating_add(s.chars().count())
            < memory_limit;
    if fits_memory {
        match table.obtain_index(s) {
            Some(index) => Lookup::Index(index),
            None => Lookup::Literal { add_to_table: true },
        }
    } else {
        match table.get(s) {
            Some(index) => Lookup::Index(index),
            None => Lookup::Literal {
                add_to_table: false,
            },
        }
    }
}

impl Encoder {
    /// Attribute value as non identifying string on the first bit (C.14).
    pub(super) fn encode_attribute_value(&mut self, value: &str) -> Result<()> {
        let eligible = self.options.attribute_value_fits(value.chars().count());
        let limit = self.options.attribute_value_map_memory_limit;
        if value.is_empty() {
            self.out.write_octet(NISTRING_EMPTY);
            return Ok(());
        }
        let found = lookup(&mut self.vocabulary.attribute_value, value, eligible, limit);
        self.write_non_identifying_string(value, found)
    }

    /// Character chunk (C.7). `text` ist nicht leer.
    pub(super) fn encode_character_chunk(&mut self, text: &str) -> Result<()> {
        let eligible = self.options.character_chunk_fits(text.chars().count());
        let limit = self.options.character_content_chunk_map_memory_limit;
        match lookup(&mut self.vocabulary.character_content_chunk, text, eligible, limit) {
            Lookup::Index(index) => integer::encode_on_fourth_bit(
                &mut self.out,
                CHARACTER_CHUNK | CHARACTER_CHUNK_INDEX_FLAG,
                index,
            ),
            Lookup::Literal { add_to_table } => {
                let mut b = CHARACTER_CHUNK;
                if add_to_table {
                    b |= CHARACTER_CHUNK_ADD_TO_TABLE_FLAG;
                }
                let ces = self.options.character_encoding_scheme;
                if ces == CharacterEncodingScheme::Utf16 {
                    b |= CHARACTER_CHUNK_UTF_16_FLAG;
                }
                ces.encode_into(text, &mut self.encoding_buf);
                string::write_length_on_seventh_bit(&mut self.out, b, self.encoding_buf.len())?;
                self.out.write_octets(&self.encoding_buf);
                Ok(())
            }
        }
    }

    /// CDATA section as character chunk with the built-in `cdata` encoding
    /// algorithm (X.891 10.10). Nie in der Chunk-Tabelle.
    ///
    /// Der 8-Bit-Algorithmus-Index beginnt auf dem siebten Bit des ersten
    /// Octets; die Länge folgt auf dem siebten Bit des zweiten Octets.
    pub(super) fn encode_cdata(&mut self, text: &str) -> Result<()> {
        let id = ENCODING_ALGORITHM_CDATA;
        self.out
            .write_octet(CHARACTER_CHUNK | CHARACTER_CHUNK_ENCODING_ALGORITHM_FLAG | (id >> 6));
        let octets = text.as_bytes();
        string::write_length_on_seventh_bit(&mut self.out, (id & 0x3F) << 2, octets.len())?;
        self.out.write_octets(octets);
        Ok(())
    }

    /// Comment (C.8): non identifying string from the "other string" table.
    pub(super) fn encode_comment(&mut self, text: &str) -> Result<()> {
        self.out.write_octet(COMMENT);
        if text.is_empty() {
            self.out.write_octet(NISTRING_EMPTY);
            return Ok(());
        }
        let eligible = self.options.character_chunk_fits(text.chars().count());
        let found = lookup(&mut self.vocabulary.other_string, text, eligible, usize::MAX);
        self.write_non_identifying_string(text, found)
    }

    /// Processing instruction (C.5): target als identifying string, Daten als
    /// non identifying string.
    pub(super) fn encode_processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        self.out.write_octet(PROCESSING_INSTRUCTION);
        write_identifying_string(&mut self.out, &mut self.vocabulary.other_ncname, target)?;
        if data.is_empty() {
            self.out.write_octet(NISTRING_EMPTY);
            return Ok(());
        }
        let eligible = self.options.character_chunk_fits(data.chars().count());
        let found = lookup(&mut self.vocabulary.other_string, data, eligible, usize::MAX);
        self.write_non_identifying_string(data, found)
    }

    /// Non identifying string on the first bit (C.14); `s` ist nicht leer.
    fn write_non_identifying_string(&mut self, s: &str, found: Lookup) -> Result<()> {
        match found {
            Lookup::Index(index) => integer::encode_on_second_bit_first_bit_one(&mut self.out, index),
            Lookup::Literal { add_to_table } => {
                let mut b = 0;
                if add_to_table {
                    b |= NISTRING_ADD_TO_TABLE_FLAG;
                }
                let ces = self.options.character_encoding_scheme;
                if ces == CharacterEncodingScheme::Utf16 {
                    b |= NISTRING_UTF_16_FLAG;
                }
                ces.encode_into(s, &mut self.encoding_buf);
                string::write_length_on_fifth_bit(&mut self.out, b, self.encoding_buf.len())?;
                self.out.write_octets(&self.encoding_buf);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_adds_eligible_strings() {
        let mut table = StringIndexMap::new();
        assert_eq!(
            lookup(&mut table, "abc", true, usize::MAX),
            Lookup::Literal { add_to_table: true }
        );
        assert_eq!(lookup(&mut table, "abc", true, usize::MAX), Lookup::Index(1));
    }

    #[test]
    fn lookup_ineligible_only_reads() {
        let mut table = StringIndexMap::new();
        assert_eq!(
            lookup(&mut table, "abc", false, usize::MAX),
            Lookup::Literal { add_to_table: false }
        );
        assert!(table.is_empty());
        table.add("abc");
        assert_eq!(lookup(&mut table, "abc", false, usize::MAX), Lookup::Index(1));
    }

    #[test]
    fn lookup_on_full_table_writes_plain_literal() {
        let mut table = StringIndexMap::with_max_index(1);
        assert_eq!(
            lookup(&mut table, "a", true, usize::MAX),
            Lookup::Literal { add_to_table: true }
        );
        assert_eq!(
            lookup(&mut table, "b", true, usize::MAX),
            Lookup::Literal {
                add_to_table: false
            }
        );
        assert_eq!(
            lookup(&mut table, "b", true, usize::MAX),
            Lookup::Literal {
                add_to_table: false
            }
        );
        assert_eq!(lookup(&mut table, "a", true, usize::MAX), Lookup::Index(1));
    }

    #[test]
    fn lookup_respects_memory_limit() {
        let mut table = StringIndexMap::new();
        table.add("1234");
        // 4 + 3 = 7, nicht < 7
        assert_eq!(
            lookup(&mut table, "abc", true, 7),
            Lookup::Literal { add_to_table: false }
        );
        assert_eq!(
            lookup(&mut table, "abc", true, 8),
            Lookup::Literal { add_to_table: true }
        );
    }
}
