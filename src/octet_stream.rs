//! Octet-level stream writer and reader for Fast Infoset.
//!
//! Fast Infoset items are octet aligned (X.891 C.1): every item starts on an
//! octet boundary and the flag bits of one item share an octet with the
//! beginning of the next integer or length. The writer therefore works on
//! whole octets; the bit-packing happens in `integer` and `string`.

use std::io::Write;

use crate::{Error, Result};

/// Initiale Buffer-Kapazität (wie der 1-KiB-Octet-Buffer eines FI-Encoders).
const INITIAL_CAPACITY: usize = 1024;

/// Writes octets into a growable buffer that can be drained into any sink.
///
/// Der Buffer wächst nie zurück: `clear()` behält die Kapazität, damit ein
/// wiederverwendeter Encoder nach dem ersten Dokument nicht neu allokiert.
pub struct OctetWriter {
    buf: Vec<u8>,
    /// Summe aller bereits per `drain_to()` abgegebenen Octets.
    drained: usize,
}

impl OctetWriter {
    /// Creates a new empty `OctetWriter`.
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(INITIAL_CAPACITY),
            drained: 0,
        }
    }

    /// Writes a single octet.
    #[inline(always)]
    pub fn write_octet(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Writes a slice of octets.
    #[inline]
    pub fn write_octets(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes the low `n` octets of `val`, most significant first (n <= 4).
    #[inline]
    pub fn write_be(&mut self, val: u32, n: usize) {
        debug_assert!(n <= 4, "write_be: n={n} > 4");
        for shift in (0..n).rev() {
            self.buf.push((val >> (shift * 8)) as u8);
        }
    }

    /// Anzahl der insgesamt geschriebenen Octets (inklusive bereits gedrainter).
    pub fn position(&self) -> usize {
        self.drained + self.buf.len()
    }

    /// Gibt die aktuelle Buffer-Größe in Bytes zurück.
    pub fn buf_len(&self) -> usize {
        self.buf.len()
    }

    /// Read-only Zugriff auf die noch nicht gedrainten Octets.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Schreibt alle gepufferten Octets in `writer` und leert den Buffer.
    pub fn drain_to(&mut self, writer: &mut impl Write) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        writer.write_all(&self.buf).map_err(Error::io)?;
        self.drained += self.buf.len();
        self.buf.clear();
        Ok(())
    }

    /// Verwirft alle Octets, behält aber die Kapazität.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.drained = 0;
    }

    /// Returns the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for OctetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads octets from a byte slice.
pub struct OctetReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> OctetReader<'a> {
    /// Creates a new `OctetReader` over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reads one octet.
    #[inline]
    pub fn read_octet(&mut self) -> Result<u8> {
        let val = *self.data.get(self.pos).ok_or(Error::PrematureEndOfStream)?;
        self.pos += 1;
        Ok(val)
    }

    /// Liest das nächste Octet ohne die Position zu verändern.
    #[inline]
    pub fn peek_octet(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Reads `n` octets as a borrowed slice.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::PrematureEndOfStream)?;
        let slice = self.data.get(self.pos..end).ok_or(Error::PrematureEndOfStream)?;
        self.pos = end;
        Ok(slice)
    }

    /// Reads `n` octets as a big-endian integer (n <= 4).
    pub fn read_be(&mut self, n: usize) -> Result<u32> {
        let mut val = 0u32;
        for &b in self.read_slice(n)? {
            val = (val << 8) | u32::from(b);
        }
        Ok(val)
    }

    /// Aktuelle Leseposition in Octets.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Ob alle Octets gelesen wurden.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
}
