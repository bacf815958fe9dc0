//! Standard tag numbers and builders for tagged values.
//!
//! The builders produce plain [`Value::Tag`] trees; no registry is involved.
//! Typed arrays (RFC 8746) are carried as byte strings in the byte order the
//! tag names.

use serde::Serialize;

use crate::error::Result;
use crate::ser::Encoder;
use crate::value::Value;
use crate::write::{SegmentedWriter, Writer};

// RFC 8949
pub const TAG_DATETIME_STRING: u64 = 0; // RFC 3339 date/time text
pub const TAG_EPOCH_DATETIME: u64 = 1; // seconds since the epoch
pub const TAG_URI: u64 = 32;
pub const TAG_BASE64URL: u64 = 33;
pub const TAG_BASE64: u64 = 34;

// RFC 8746 typed arrays
pub const TAG_UINT8_ARRAY: u64 = 64;
pub const TAG_UINT16BE_ARRAY: u64 = 65;
pub const TAG_UINT32BE_ARRAY: u64 = 66;
pub const TAG_UINT64BE_ARRAY: u64 = 67;
pub const TAG_UINT8_CLAMPED_ARRAY: u64 = 68;
pub const TAG_UINT16LE_ARRAY: u64 = 69;
pub const TAG_UINT32LE_ARRAY: u64 = 70;
pub const TAG_UINT64LE_ARRAY: u64 = 71;
pub const TAG_SINT8_ARRAY: u64 = 72;
pub const TAG_SINT16BE_ARRAY: u64 = 73;
pub const TAG_SINT32BE_ARRAY: u64 = 74;
pub const TAG_SINT64BE_ARRAY: u64 = 75;
pub const TAG_SINT16LE_ARRAY: u64 = 77;
pub const TAG_SINT32LE_ARRAY: u64 = 78;
pub const TAG_SINT64LE_ARRAY: u64 = 79;
pub const TAG_FLOAT32BE_ARRAY: u64 = 81;
pub const TAG_FLOAT64BE_ARRAY: u64 = 82;
pub const TAG_FLOAT32LE_ARRAY: u64 = 85;
pub const TAG_FLOAT64LE_ARRAY: u64 = 86;

/// Serializes `value` behind a tag header into a fresh buffer.
pub fn to_vec_tagged<T: Serialize + ?Sized>(tag: u64, value: &T) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(SegmentedWriter::new());
    encoder.write_tag(tag)?;
    encoder.encode(value)?;
    Ok(encoder.into_inner().result())
}

pub fn datetime_string(datetime: &str) -> Value {
    Value::tagged(TAG_DATETIME_STRING, datetime)
}

pub fn epoch_datetime(epoch: i64) -> Value {
    Value::tagged(TAG_EPOCH_DATETIME, epoch)
}

pub fn uri(uri: &str) -> Value {
    Value::tagged(TAG_URI, uri)
}

pub fn base64url(data: &str) -> Value {
    Value::tagged(TAG_BASE64URL, data)
}

pub fn base64(data: &str) -> Value {
    Value::tagged(TAG_BASE64, data)
}

pub fn uint8_array(data: &[u8]) -> Value {
    Value::tagged(TAG_UINT8_ARRAY, data)
}

macro_rules! typed_array {
    ($($name:ident, $t:ty, $tag:ident, $to_bytes:ident;)*) => {
        $(
            #[doc = concat!("Packs `", stringify!($t), "` elements under tag [`", stringify!($tag), "`].")]
            pub fn $name(data: &[$t]) -> Value {
                let bytes: Vec<u8> = data.iter().flat_map(|n| n.$to_bytes()).collect();
                Value::tagged($tag, bytes)
            }
        )*
    };
}

typed_array! {
    uint16be_array, u16, TAG_UINT16BE_ARRAY, to_be_bytes;
    uint32be_array, u32, TAG_UINT32BE_ARRAY, to_be_bytes;
    uint64be_array, u64, TAG_UINT64BE_ARRAY, to_be_bytes;
    uint16le_array, u16, TAG_UINT16LE_ARRAY, to_le_bytes;
    uint32le_array, u32, TAG_UINT32LE_ARRAY, to_le_bytes;
    uint64le_array, u64, TAG_UINT64LE_ARRAY, to_le_bytes;
    sint16be_array, i16, TAG_SINT16BE_ARRAY, to_be_bytes;
    sint32be_array, i32, TAG_SINT32BE_ARRAY, to_be_bytes;
    sint64be_array, i64, TAG_SINT64BE_ARRAY, to_be_bytes;
    sint16le_array, i16, TAG_SINT16LE_ARRAY, to_le_bytes;
    sint32le_array, i32, TAG_SINT32LE_ARRAY, to_le_bytes;
    sint64le_array, i64, TAG_SINT64LE_ARRAY, to_le_bytes;
    float32be_array, f32, TAG_FLOAT32BE_ARRAY, to_be_bytes;
    float64be_array, f64, TAG_FLOAT64BE_ARRAY, to_be_bytes;
    float32le_array, f32, TAG_FLOAT32LE_ARRAY, to_le_bytes;
    float64le_array, f64, TAG_FLOAT64LE_ARRAY, to_le_bytes;
}
