//! # tagwire CBOR
//!
//! A CBOR (RFC 8949) encoder/decoder built around a dynamic [`Value`] tree and
//! a per-codec registry of semantic tags.
//!
//! ## Features
//! - All eight major types, with canonical (shortest) argument widths on encode
//! - Definite and indefinite-length arrays, maps, byte and text strings
//! - Semantic tags: domain objects are mapped to tagged values on encode and
//!   rebuilt from them on decode, per [`Codec`]
//! - Byte-level [`Reader`] and [`Writer`] traits; encoding goes through a
//!   segmented buffer ([`SegmentedWriter`])
//! - serde integration ([`to_vec`], [`from_slice`], [`Encoder`], [`Decoder`])
//! - Standard tags and RFC 8746 typed arrays in [`tags`]
//!
//! Every decode is bounded: nesting depth is capped by [`CodecConfig`] and
//! declared lengths never pre-allocate more than the input can back.
//!
//! ## Example
//! ```rust
//! use tagwire_cbor::{Codec, Value, tags};
//!
//! let codec = Codec::new();
//! let value = Value::Array(vec![
//!     Value::from(1),
//!     tags::uri("https://example.com"),
//!     Value::from(vec![0xde_u8, 0xad]),
//! ]);
//!
//! let bytes = codec.encode(&value).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), value);
//! ```
//!
//! ## Performance
//! Use `serde_bytes::ByteBuf` or `#[serde(with = "serde_bytes")]` for binary
//! fields; a plain `Vec<u8>` serializes as an array of integers.

use serde::{Deserialize, Serialize};

mod codec;
pub mod de;
pub mod error;
pub mod header;
pub mod read;
pub mod registry;
pub mod ser;
pub mod tags;
pub mod value;
pub mod write;

pub use codec::{Codec, CodecConfig, DEFAULT_MAX_DEPTH, ValueEncoder};
pub use de::Decoder;
pub use error::{CborError, Result};
pub use read::{IoReader, Reader, SliceReader};
pub use registry::Registry;
pub use ser::Encoder;
pub use value::{DomainObject, Object, Value};
pub use write::{SEGMENT_SIZE, SegmentedWriter, Writer};

/// Upper bound on capacity reserved from a declared length before any
/// element has been read.
pub(crate) const PREALLOC_LIMIT: usize = 4096;

/// Encodes a value with an empty registry.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Codec::new().encode(value)
}

/// Decodes exactly one value with an empty registry; tags stay [`Value::Tag`].
pub fn decode(bytes: &[u8]) -> Result<Value> {
    Codec::new().decode(bytes)
}

/// Serializes any `Serialize` type to CBOR.
///
/// Sequences and maps without a known length are written indefinite-length.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(SegmentedWriter::new());
    encoder.encode(value)?;
    Ok(encoder.into_inner().result())
}

/// Deserializes one data item from `slice`, failing with
/// [`CborError::TrailingData`] if bytes remain after it.
pub fn from_slice<'de, T: Deserialize<'de>>(slice: &[u8]) -> Result<T> {
    let mut decoder = Decoder::new(SliceReader::new(slice));
    let value = decoder.decode()?;
    let remaining = decoder.into_inner().remaining();
    if remaining > 0 {
        return Err(CborError::TrailingData(remaining));
    }
    Ok(value)
}
