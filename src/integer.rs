//! Index integers on the 2nd, 3rd and 4th bit of an octet (X.891 C.25-C.28).
//!
//! Fast Infoset writes vocabulary indices as "non-zero integers": index `n`
//! (1-based) is transmitted as `n - 1`, packed into the free low bits of the
//! octet that already carries the item's flags. Depending on the value the
//! integer takes the rest of that octet, or spills into one to three further
//! octets. Die Flag-Bits des aktuellen Octets kommen als `b` herein.

use crate::constants::MAXIMUM_INDEX;
use crate::octet_stream::{OctetReader, OctetWriter};
use crate::{Error, Result};

const SECOND_BIT_SMALL_LIMIT: usize = 64;
const SECOND_BIT_MEDIUM_LIMIT: usize = 8256;
const SECOND_BIT_MEDIUM_FLAG: u8 = 0x40;
const SECOND_BIT_LARGE_FLAG: u8 = 0x60;

const THIRD_BIT_SMALL_LIMIT: usize = 32;
const THIRD_BIT_MEDIUM_LIMIT: usize = 2080;
const THIRD_BIT_LARGE_LIMIT: usize = 526_368;
const THIRD_BIT_MEDIUM_FLAG: u8 = 0x20;
const THIRD_BIT_LARGE_FLAG: u8 = 0x28;
const THIRD_BIT_LARGE_LARGE_FLAG: u8 = 0x30;

const FOURTH_BIT_SMALL_LIMIT: usize = 16;
const FOURTH_BIT_MEDIUM_LIMIT: usize = 1040;
const FOURTH_BIT_LARGE_LIMIT: usize = 263_184;
const FOURTH_BIT_MEDIUM_FLAG: u8 = 0x10;
const FOURTH_BIT_LARGE_FLAG: u8 = 0x14;
const FOURTH_BIT_LARGE_LARGE_FLAG: u8 = 0x18;

/// Prüft den Index-Bereich [1, 2^20] und liefert den Wire-Wert `index - 1`.
#[inline]
fn wire_value(index: usize) -> Result<usize> {
    if index == 0 || index > MAXIMUM_INDEX {
        return Err(Error::IntegerOutOfRange {
            value: index,
            max: MAXIMUM_INDEX,
        });
    }
    Ok(index - 1)
}

/// Encodes `index` on the second bit with the first bit set to one (C.25).
///
/// Verwendet für Index-Referenzen auf identifying und non identifying strings.
pub fn encode_on_second_bit_first_bit_one(w: &mut OctetWriter, index: usize) -> Result<()> {
    encode_on_second_bit(w, 0x80, index)
}

/// Encodes `index` on the second bit with the first bit set to zero (C.25).
///
/// Verwendet für indizierte Attribut-Namen (C.17).
pub fn encode_on_second_bit_first_bit_zero(w: &mut OctetWriter, index: usize) -> Result<()> {
    encode_on_second_bit(w, 0x00, index)
}

fn encode_on_second_bit(w: &mut OctetWriter, first_bit: u8, index: usize) -> Result<()> {
    let i = wire_value(index)?;
    if i < SECOND_BIT_SMALL_LIMIT {
        // [1, 64]
        w.write_octet(first_bit | i as u8);
    } else if i < SECOND_BIT_MEDIUM_LIMIT {
        // [65, 8256]
        let i = i - SECOND_BIT_SMALL_LIMIT;
        w.write_octet(first_bit | SECOND_BIT_MEDIUM_FLAG | (i >> 8) as u8);
        w.write_octet(i as u8);
    } else {
        // [8257, 1048576]
        let i = i - SECOND_BIT_MEDIUM_LIMIT;
        w.write_octet(first_bit | SECOND_BIT_LARGE_FLAG | (i >> 16) as u8);
        w.write_be(i as u32, 2);
    }
    Ok(())
}

/// Encodes `index` on the third bit; `b` carries the two leading bits (C.27).
pub fn encode_on_third_bit(w: &mut OctetWriter, b: u8, index: usize) -> Result<()> {
    let i = wire_value(index)?;
    if i < THIRD_BIT_SMALL_LIMIT {
        // [1, 32]
        w.write_octet(b | i as u8);
    } else if i < THIRD_BIT_MEDIUM_LIMIT {
        // [33, 2080]
        let i = i - THIRD_BIT_SMALL_LIMIT;
        w.write_octet(b | THIRD_BIT_MEDIUM_FLAG | (i >> 8) as u8);
        w.write_octet(i as u8);
    } else if i < THIRD_BIT_LARGE_LIMIT {
        // [2081, 526368]
        let i = i - THIRD_BIT_MEDIUM_LIMIT;
        w.write_octet(b | THIRD_BIT_LARGE_FLAG | (i >> 16) as u8);
        w.write_be(i as u32, 2);
    } else {
        // [526369, 1048576]
        let i = i - THIRD_BIT_LARGE_LIMIT;
        w.write_octet(b | THIRD_BIT_LARGE_LARGE_FLAG);
        w.write_be(i as u32, 3);
    }
    Ok(())
}

/// Encodes `index` on the fourth bit; `b` carries the three leading bits (C.28).
pub fn encode_on_fourth_bit(w: &mut OctetWriter, b: u8, index: usize) -> Result<()> {
    let i = wire_value(index)?;
    if i < FOURTH_BIT_SMALL_LIMIT {
        // [1, 16]
        w.write_octet(b | i as u8);
    } else if i < FOURTH_BIT_MEDIUM_LIMIT {
        // [17, 1040]
        let i = i - FOURTH_BIT_SMALL_LIMIT;
        w.write_octet(b | FOURTH_BIT_MEDIUM_FLAG | (i >> 8) as u8);
        w.write_octet(i as u8);
    } else if i < FOURTH_BIT_LARGE_LIMIT {
        // [1041, 263184]
        let i = i - FOURTH_BIT_MEDIUM_LIMIT;
        w.write_octet(b | FOURTH_BIT_LARGE_FLAG | (i >> 16) as u8);
        w.write_be(i as u32, 2);
    } else {
        // [263185, 1048576]
        let i = i - FOURTH_BIT_LARGE_LIMIT;
        w.write_octet(b | FOURTH_BIT_LARGE_LARGE_FLAG);
        w.write_be(i as u32, 3);
    }
    Ok(())
}

/// Decodes an integer on the second bit whose first octet `b` was already read.
/// Returns the 1-based index.
pub fn decode_on_second_bit(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    let i = if b & 0x40 == 0 {
        usize::from(b & 0x3F)
    } else if b & 0x60 == SECOND_BIT_MEDIUM_FLAG {
        (usize::from(b & 0x1F) << 8 | r.read_octet()? as usize) + SECOND_BIT_SMALL_LIMIT
    } else {
        (usize::from(b & 0x0F) << 16 | r.read_be(2)? as usize) + SECOND_BIT_MEDIUM_LIMIT
    };
    Ok(i + 1)
}

/// Decodes an integer on the third bit whose first octet `b` was already read.
pub fn decode_on_third_bit(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    let i = if b & 0x20 == 0 {
        usize::from(b & 0x1F)
    } else {
        match b & 0x38 {
            THIRD_BIT_MEDIUM_FLAG => {
                (usize::from(b & 0x07) << 8 | r.read_octet()? as usize) + THIRD_BIT_SMALL_LIMIT
            }
            THIRD_BIT_LARGE_FLAG => {
                (usize::from(b & 0x07) << 16 | r.read_be(2)? as usize) + THIRD_BIT_MEDIUM_LIMIT
            }
            THIRD_BIT_LARGE_LARGE_FLAG => r.read_be(3)? as usize + THIRD_BIT_LARGE_LIMIT,
            _ => return Err(Error::unexpected_octet(b, "integer on third bit")),
        }
    };
    Ok(i + 1)
}

/// Decodes an integer on the fourth bit whose first octet `b` was already read.
pub fn decode_on_fourth_bit(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    let i = if b & 0x10 == 0 {
        usize::from(b & 0x0F)
    } else {
        match b & 0x1C {
            FOURTH_BIT_MEDIUM_FLAG => {
                (usize::from(b & 0x03) << 8 | r.read_octet()? as usize) + FOURTH_BIT_SMALL_LIMIT
            }
            FOURTH_BIT_LARGE_FLAG => {
                (usize::from(b & 0x03) << 16 | r.read_be(2)? as usize) + FOURTH_BIT_MEDIUM_LIMIT
            }
            FOURTH_BIT_LARGE_LARGE_FLAG => r.read_be(3)? as usize + FOURTH_BIT_LARGE_LIMIT,
            _ => return Err(Error::unexpected_octet(b, "integer on fourth bit")),
        }
    };
    Ok(i + 1)
}
