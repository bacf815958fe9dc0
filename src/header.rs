//! Initial-byte codec: `(major type, argument)` pairs in canonical form.

use crate::error::{CborError, Result};
use crate::read::Reader;
use crate::write::Writer;

// CBOR major types
pub const MAJOR_UNSIGNED: u8 = 0;
pub const MAJOR_NEGATIVE: u8 = 1;
pub const MAJOR_BYTES: u8 = 2;
pub const MAJOR_TEXT: u8 = 3;
pub const MAJOR_ARRAY: u8 = 4;
pub const MAJOR_MAP: u8 = 5;
pub const MAJOR_TAG: u8 = 6;
pub const MAJOR_SIMPLE: u8 = 7;

// Additional info values
pub(crate) const FALSE: u8 = 20;
pub(crate) const TRUE: u8 = 21;
pub(crate) const NULL: u8 = 22;
pub(crate) const UNDEFINED: u8 = 23;
pub(crate) const ONE_BYTE: u8 = 24;
pub(crate) const TWO_BYTES: u8 = 25;
pub(crate) const FOUR_BYTES: u8 = 26;
pub(crate) const EIGHT_BYTES: u8 = 27;
pub(crate) const INDEFINITE: u8 = 31;

/// The break marker closing an indefinite-length item (major 7, info 31).
pub const BREAK: u8 = (MAJOR_SIMPLE << 5) | INDEFINITE;

/// Header argument: a definite magnitude or the indefinite marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    Value(u64),
    Indefinite,
}

/// A decoded initial byte plus any extension bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: u8,
    /// Low five bits of the initial byte; needed to tell float widths apart under major 7.
    pub info: u8,
    pub argument: Argument,
}

impl Header {
    pub fn is_break(&self) -> bool {
        self.major == MAJOR_SIMPLE && self.argument == Argument::Indefinite
    }

    pub fn value(&self) -> Option<u64> {
        match self.argument {
            Argument::Value(v) => Some(v),
            Argument::Indefinite => None,
        }
    }

    /// The definite length as `usize`, or `None` for indefinite items.
    pub fn length(&self) -> Result<Option<usize>> {
        match self.argument {
            Argument::Value(v) => usize::try_from(v)
                .map(Some)
                .map_err(|_| CborError::LengthOverflow(v)),
            Argument::Indefinite => Ok(None),
        }
    }
}

/// Writes `major` with `value` using the fewest extension bytes.
pub fn write_header<W: Writer + ?Sized>(writer: &mut W, major: u8, value: u64) {
    let initial = major << 5;
    if value < 24 {
        writer.write_byte(initial | value as u8);
    } else if value < 256 {
        writer.write_byte(initial | ONE_BYTE);
        writer.write_byte(value as u8);
    } else if value < 65536 {
        writer.write_byte(initial | TWO_BYTES);
        writer.write_u16(value as u16);
    } else if value < 4294967296 {
        writer.write_byte(initial | FOUR_BYTES);
        writer.write_u32(value as u32);
    } else {
        writer.write_byte(initial | EIGHT_BYTES);
        writer.write_u64(value);
    }
}

/// Opens an indefinite-length item; close it with [`write_break`].
pub fn write_indefinite<W: Writer + ?Sized>(writer: &mut W, major: u8) {
    debug_assert!(matches!(
        major,
        MAJOR_BYTES | MAJOR_TEXT | MAJOR_ARRAY | MAJOR_MAP
    ));
    writer.write_byte((major << 5) | INDEFINITE);
}

pub fn write_break<W: Writer + ?Sized>(writer: &mut W) {
    writer.write_byte(BREAK);
}

pub fn read_header<R: Reader + ?Sized>(reader: &mut R) -> Result<Header> {
    let offset = reader.position();
    let initial = reader.read_byte()?;
    let major = initial >> 5;
    let info = initial & 0x1f;

    let argument = match info {
        0..=23 => Argument::Value(info as u64),
        ONE_BYTE => Argument::Value(reader.read_byte()? as u64),
        TWO_BYTES => Argument::Value(reader.read_u16()? as u64),
        FOUR_BYTES => Argument::Value(reader.read_u32()? as u64),
        EIGHT_BYTES => Argument::Value(reader.read_u64()?),
        INDEFINITE => match major {
            MAJOR_BYTES | MAJOR_TEXT | MAJOR_ARRAY | MAJOR_MAP | MAJOR_SIMPLE => {
                Argument::Indefinite
            }
            _ => {
                return Err(CborError::malformed(
                    offset,
                    "indefinite length is not allowed for this major type",
                ));
            }
        },
        _ => {
            return Err(CborError::malformed(
                offset,
                "reserved additional info value",
            ));
        }
    };

    Ok(Header {
        major,
        info,
        argument,
    })
}
