//! Character strings and octet-string lengths (X.891 C.19-C.24).
//!
//! Identifying strings (prefixes, namespace names, local names, PI targets)
//! are always UTF-8 with the length on the second bit. Non identifying
//! strings (attribute values, comments, PI data) and character chunks use
//! the configured [`CharacterEncodingScheme`] with the length on the fifth
//! respectively seventh bit.

use crate::octet_stream::{OctetReader, OctetWriter};
use crate::{Error, Result};

/// Character encoding scheme for non identifying strings (X.891 C.19, C.20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterEncodingScheme {
    #[default]
    Utf8,
    /// UTF-16, big endian, ohne BOM.
    Utf16,
}

impl CharacterEncodingScheme {
    /// Kodiert `s` in `buf` (der Buffer wird vorher geleert).
    pub fn encode_into(self, s: &str, buf: &mut Vec<u8>) {
        buf.clear();
        match self {
            Self::Utf8 => buf.extend_from_slice(s.as_bytes()),
            Self::Utf16 => {
                buf.reserve(s.len() * 2);
                for unit in s.encode_utf16() {
                    buf.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
    }

    /// Decodes octets written by [`encode_into`](Self::encode_into).
    pub fn decode(self, octets: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(octets)
                .map(str::to_owned)
                .map_err(|_| Error::InvalidString),
            Self::Utf16 => {
                if octets.len() % 2 != 0 {
                    return Err(Error::InvalidString);
                }
                let units: Vec<u16> = octets
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|_| Error::InvalidString)
            }
        }
    }
}

const SECOND_BIT_SMALL_LIMIT: usize = 65;
const SECOND_BIT_MEDIUM_LIMIT: usize = 321;
const SECOND_BIT_MEDIUM_FLAG: u8 = 0x40;
const SECOND_BIT_LARGE_FLAG: u8 = 0x60;

const FIFTH_BIT_SMALL_LIMIT: usize = 9;
const FIFTH_BIT_MEDIUM_LIMIT: usize = 265;
const FIFTH_BIT_MEDIUM_FLAG: u8 = 0x08;
const FIFTH_BIT_LARGE_FLAG: u8 = 0x0C;

const SEVENTH_BIT_SMALL_LIMIT: usize = 3;
const SEVENTH_BIT_MEDIUM_LIMIT: usize = 259;
const SEVENTH_BIT_MEDIUM_FLAG: u8 = 0x02;
const SEVENTH_BIT_LARGE_FLAG: u8 = 0x03;

/// Große Längen werden als 32-Bit-Wert nach dem Flag-Octet übertragen.
fn large_length(len: usize, limit: usize) -> Result<u32> {
    u32::try_from(len - limit).map_err(|_| Error::IntegerOutOfRange {
        value: len,
        max: u32::MAX as usize + limit,
    })
}

/// Writes a non-zero octet-string length on the second bit (C.22).
///
/// Die ersten beiden Bits sind bei identifying strings immer `00`.
pub fn write_length_on_second_bit(w: &mut OctetWriter, len: usize) -> Result<()> {
    debug_assert!(len > 0, "octet string length must be non-zero");
    if len < SECOND_BIT_SMALL_LIMIT {
        // [1, 64]
        w.write_octet((len - 1) as u8);
    } else if len < SECOND_BIT_MEDIUM_LIMIT {
        // [65, 320]
        w.write_octet(SECOND_BIT_MEDIUM_FLAG);
        w.write_octet((len - SECOND_BIT_SMALL_LIMIT) as u8);
    } else {
        // [321, 2^32]
        let rest = large_length(len, SECOND_BIT_MEDIUM_LIMIT)?;
        w.write_octet(SECOND_BIT_LARGE_FLAG);
        w.write_be(rest, 4);
    }
    Ok(())
}

/// Writes a non-zero octet-string length on the fifth bit (C.23).
pub fn write_length_on_fifth_bit(w: &mut OctetWriter, b: u8, len: usize) -> Result<()> {
    debug_assert!(len > 0, "octet string length must be non-zero");
    if len < FIFTH_BIT_SMALL_LIMIT {
        // [1, 8]
        w.write_octet(b | (len - 1) as u8);
    } else if len < FIFTH_BIT_MEDIUM_LIMIT {
        // [9, 264]
        w.write_octet(b | FIFTH_BIT_MEDIUM_FLAG);
        w.write_octet((len - FIFTH_BIT_SMALL_LIMIT) as u8);
    } else {
        // [265, 2^32]
        let rest = large_length(len, FIFTH_BIT_MEDIUM_LIMIT)?;
        w.write_octet(b | FIFTH_BIT_LARGE_FLAG);
        w.write_be(rest, 4);
    }
    Ok(())
}

/// Writes a non-zero octet-string length on the seventh bit (C.24).
pub fn write_length_on_seventh_bit(w: &mut OctetWriter, b: u8, len: usize) -> Result<()> {
    debug_assert!(len > 0, "octet string length must be non-zero");
    if len < SEVENTH_BIT_SMALL_LIMIT {
        // [1, 2]
        w.write_octet(b | (len - 1) as u8);
    } else if len < SEVENTH_BIT_MEDIUM_LIMIT {
        // [3, 258]
        w.write_octet(b | SEVENTH_BIT_MEDIUM_FLAG);
        w.write_octet((len - SEVENTH_BIT_SMALL_LIMIT) as u8);
    } else {
        // [259, 2^32]
        let rest = large_length(len, SEVENTH_BIT_MEDIUM_LIMIT)?;
        w.write_octet(b | SEVENTH_BIT_LARGE_FLAG);
        w.write_be(rest, 4);
    }
    Ok(())
}

/// Writes a literal identifying string: UTF-8 octets with the length on the
/// second bit (C.22).
pub fn write_identifying_literal(w: &mut OctetWriter, s: &str) -> Result<()> {
    write_length_on_second_bit(w, s.len())?;
    w.write_octets(s.as_bytes());
    Ok(())
}

/// Reads a length on the second bit whose first octet `b` was already read.
pub fn read_length_on_second_bit(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    if b & 0x40 == 0 {
        Ok(usize::from(b & 0x3F) + 1)
    } else if b & 0x60 == SECOND_BIT_MEDIUM_FLAG {
        Ok(r.read_octet()? as usize + SECOND_BIT_SMALL_LIMIT)
    } else {
        Ok(r.read_be(4)? as usize + SECOND_BIT_MEDIUM_LIMIT)
    }
}

/// Reads a length on the fifth bit whose first octet `b` was already read.
pub fn read_length_on_fifth_bit(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    match b & 0x0C {
        FIFTH_BIT_MEDIUM_FLAG => Ok(r.read_octet()? as usize + FIFTH_BIT_SMALL_LIMIT),
        FIFTH_BIT_LARGE_FLAG => Ok(r.read_be(4)? as usize + FIFTH_BIT_MEDIUM_LIMIT),
        _ => Ok(usize::from(b & 0x07) + 1),
    }
}

/// Reads a length on the seventh bit whose first octet `b` was already read.
pub fn read_length_on_seventh_bit(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    match b & 0x03 {
        SEVENTH_BIT_MEDIUM_FLAG => Ok(r.read_octet()? as usize + SEVENTH_BIT_SMALL_LIMIT),
        SEVENTH_BIT_LARGE_FLAG => Ok(r.read_be(4)? as usize + SEVENTH_BIT_MEDIUM_LIMIT),
        small => Ok(usize::from(small) + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut OctetWriter) -> Result<()>) -> Vec<u8> {
        let mut w = OctetWriter::new();
        f(&mut w).unwrap();
        w.into_vec()
    }

    #[test]
    fn identifying_literal_small() {
        assert_eq!(
            written(|w| write_identifying_literal(w, "foo")),
            vec![0x02, b'f', b'o', b'o']
        );
    }

    #[test]
    fn second_bit_length_boundaries() {
        assert_eq!(written(|w| write_length_on_second_bit(w, 64)), vec![0x3F]);
        assert_eq!(written(|w| write_length_on_second_bit(w, 65)), vec![0x40, 0x00]);
        assert_eq!(written(|w| write_length_on_second_bit(w, 320)), vec![0x40, 0xFF]);
        assert_eq!(
            written(|w| write_length_on_second_bit(w, 321)),
            vec![0x60, 0, 0, 0, 0]
        );
    }

    #[test]
    fn fifth_bit_length_keeps_flags() {
        assert_eq!(written(|w| write_length_on_fifth_bit(w, 0x40, 5)), vec![0x44]);
        assert_eq!(written(|w| write_length_on_fifth_bit(w, 0x00, 8)), vec![0x07]);
        assert_eq!(written(|w| write_length_on_fifth_bit(w, 0x00, 10)), vec![0x08, 0x01]);
        assert_eq!(
            written(|w| write_length_on_fifth_bit(w, 0x10, 265)),
            vec![0x1C, 0, 0, 0, 0]
        );
    }

    #[test]
    fn seventh_bit_length_keeps_flags() {
        assert_eq!(written(|w| write_length_on_seventh_bit(w, 0x90, 2)), vec![0x91]);
        assert_eq!(written(|w| write_length_on_seventh_bit(w, 0x24, 3)), vec![0x26, 0x00]);
        assert_eq!(
            written(|w| write_length_on_seventh_bit(w, 0x80, 300)),
            vec![0x83, 0, 0, 0, 41]
        );
    }

    #[test]
    fn lengths_read_back() {
        for &len in &[1, 8, 9, 64, 65, 258, 259, 264, 265, 320, 321, 70_000] {
            let data = written(|w| write_length_on_second_bit(w, len));
            let mut r = OctetReader::new(&data[1..]);
            assert_eq!(read_length_on_second_bit(data[0], &mut r).unwrap(), len);

            let data = written(|w| write_length_on_fifth_bit(w, 0x40, len));
            let mut r = OctetReader::new(&data[1..]);
            assert_eq!(read_length_on_fifth_bit(data[0], &mut r).unwrap(), len);

            let data = written(|w| write_length_on_seventh_bit(w, 0x90, len));
            let mut r = OctetReader::new(&data[1..]);
            assert_eq!(read_length_on_seventh_bit(data[0], &mut r).unwrap(), len);
        }
    }

    #[test]
    fn utf16_is_big_endian() {
        let mut buf = Vec::new();
        CharacterEncodingScheme::Utf16.encode_into("aé", &mut buf);
        assert_eq!(buf, vec![0x00, b'a', 0x00, 0xE9]);
        assert_eq!(CharacterEncodingScheme::Utf16.decode(&buf).unwrap(), "aé");
    }

    #[test]
    fn utf16_surrogate_pair() {
        let mut buf = Vec::new();
        CharacterEncodingScheme::Utf16.encode_into("\u{1F600}", &mut buf);
        assert_eq!(buf.len(), 4);
        assert_eq!(CharacterEncodingScheme::Utf16.decode(&buf).unwrap(), "\u{1F600}");
    }

    #[test]
    fn invalid_octets_rejected() {
        assert_eq!(
            CharacterEncodingScheme::Utf8.decode(&[0xC3]).unwrap_err(),
            Error::InvalidString
        );
        assert_eq!(
            CharacterEncodingScheme::Utf16.decode(&[0x00]).unwrap_err(),
            Error::InvalidString
        );
    }
}
