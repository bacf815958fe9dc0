use std::fmt;
use std::io;

/// Errors produced while encoding or decoding CBOR.
///
/// Every error is fatal to the call that raised it: neither `encode` nor
/// `decode` ever returns a partial result.
#[derive(Debug, thiserror::Error)]
pub enum CborError {
    /// The value has no built-in encoding and no registered semantic encoder matched it.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A reserved additional-info value (28-30), an indefinite marker under a major type
    /// that does not allow one, or a break byte outside of an indefinite collection.
    #[error("malformed header at offset {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: &'static str },

    /// The input ended while more bytes were required.
    #[error("truncated input: needed {needed} more byte(s)")]
    TruncatedInput { needed: usize },

    /// A text string was not valid UTF-8.
    #[error("invalid UTF-8 in text string")]
    InvalidUtf8,

    /// An indefinite-length collection reached end of input before its break byte.
    #[error("indefinite-length collection is missing its break byte")]
    UnterminatedCollection,

    /// An integer cannot be represented by a CBOR major type 0/1 header.
    #[error("integer {0} is outside the CBOR integer range")]
    IntegerOutOfRange(i128),

    /// A declared length does not fit the platform's `usize`.
    #[error("declared length {0} exceeds the addressable range")]
    LengthOverflow(u64),

    /// Nesting went deeper than the configured limit.
    #[error("nesting depth exceeds limit of {0}")]
    DepthLimitExceeded(usize),

    /// Simple values 20-31 are reserved for booleans, null, undefined and header markers.
    #[error("simple value {0} cannot be encoded as a generic simple value")]
    InvalidSimpleValue(u8),

    /// Indefinite-length framing was used out of order: a chunk or value where it
    /// cannot go, an odd number of map entries, or items left open.
    #[error("invalid framing: {0}")]
    InvalidFraming(&'static str),

    /// Bytes were left over after a complete data item.
    #[error("{0} trailing byte(s) after data item")]
    TrailingData(usize),

    /// A registered semantic decoder rejected the content of its tag.
    #[error("invalid content for tag {tag}: {reason}")]
    InvalidTagContent { tag: u64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serde error: {0}")]
    Serde(String),
}

impl CborError {
    pub(crate) fn malformed(offset: usize, reason: &'static str) -> Self {
        CborError::MalformedHeader { offset, reason }
    }

    /// Convenience for semantic decoders that need to reject their input.
    pub fn invalid_tag_content(tag: u64, reason: impl fmt::Display) -> Self {
        CborError::InvalidTagContent {
            tag,
            reason: reason.to_string(),
        }
    }
}

impl serde::ser::Error for CborError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CborError::Serde(msg.to_string())
    }
}

impl serde::de::Error for CborError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CborError::Serde(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CborError>;
