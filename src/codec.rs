//! Value codec: dispatches [`Value`]s onto the eight major types.

use tracing::{debug, trace};

use crate::PREALLOC_LIMIT;
use crate::error::{CborError, Result};
use crate::header::{
    self, Argument, EIGHT_BYTES, FALSE, FOUR_BYTES, Header, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP,
    MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG, MAJOR_TEXT, MAJOR_UNSIGNED, NULL, ONE_BYTE, TRUE,
    TWO_BYTES, UNDEFINED,
};
use crate::read::{Reader, SliceReader};
use crate::registry::Registry;
use crate::value::Value;
use crate::write::{SegmentedWriter, Writer};

/// Default limit on nested arrays, maps and tags.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Settings shared by every encode and decode call of a [`Codec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Deepest nesting of arrays, maps and tags accepted in either direction.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// A codec configuration: a semantic tag registry plus limits.
///
/// Each instance owns its registry, so codecs with different tag semantics
/// can be used side by side.
///
/// # Example
/// ```
/// use tagwire_cbor::{Codec, Value};
///
/// #[derive(Debug, PartialEq)]
/// struct Celsius(f64);
///
/// let mut codec = Codec::new();
/// codec
///     .add_semantic_encode(1000, |v| {
///         let c = v.as_object()?.downcast_ref::<Celsius>()?;
///         Some(Value::Float(c.0))
///     })
///     .add_semantic_decode(1000, |v| Ok(Value::object(Celsius(v.as_f64().unwrap_or_default()))));
///
/// let bytes = codec.encode(&Value::object(Celsius(21.5))).unwrap();
/// assert_eq!(codec.decode(&bytes).unwrap(), Value::object(Celsius(21.5)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Codec {
    registry: Registry,
    config: CodecConfig,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Codec {
            registry: Registry::new(),
            config,
        }
    }

    pub fn with_registry(registry: Registry, config: CodecConfig) -> Self {
        Codec { registry, config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers a semantic encoder; see [`Registry::add_semantic_encode`].
    pub fn add_semantic_encode<F>(&mut self, tag: u64, encode: F) -> &mut Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.registry.add_semantic_encode(tag, encode);
        self
    }

    /// Registers a semantic decoder; see [`Registry::add_semantic_decode`].
    pub fn add_semantic_decode<F>(&mut self, tag: u64, decode: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.registry.add_semantic_decode(tag, decode);
        self
    }

    /// Serializes `value` into a fresh buffer.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let mut encoder = self.encoder();
        encoder.encode(value)?;
        Ok(encoder.finish()?.result())
    }

    /// Starts an encoder over a new [`SegmentedWriter`], for callers that
    /// need indefinite-length framing or several items back to back.
    pub fn encoder(&self) -> ValueEncoder<'_, SegmentedWriter> {
        self.encoder_for(SegmentedWriter::new())
    }

    pub fn encoder_for<W: Writer>(&self, writer: W) -> ValueEncoder<'_, W> {
        ValueEncoder {
            writer,
            codec: self,
            open: Vec::new(),
        }
    }

    /// Decodes exactly one data item; leftover bytes are an error.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let (value, consumed) = self.decode_prefix(bytes)?;
        if consumed != bytes.len() {
            return Err(CborError::TrailingData(bytes.len() - consumed));
        }
        Ok(value)
    }

    /// Decodes the first data item and reports how many bytes it used.
    pub fn decode_prefix(&self, bytes: &[u8]) -> Result<(Value, usize)> {
        let mut reader = SliceReader::new(bytes);
        let value = self.decode_from(&mut reader)?;
        Ok((value, reader.position()))
    }

    /// Decodes one data item from any [`Reader`].
    pub fn decode_from<R: Reader>(&self, reader: R) -> Result<Value> {
        let mut decoder = ValueDecoder {
            reader,
            codec: self,
        };
        decoder.decode_value(0).inspect_err(|err| {
            trace!(error = %err, offset = decoder.reader.position(), "decode failed");
        })
    }
}

fn check_depth(depth: usize, max_depth: usize) -> Result<()> {
    if depth > max_depth {
        debug!(max_depth, "nesting depth limit exceeded");
        return Err(CborError::DepthLimitExceeded(max_depth));
    }
    Ok(())
}

/// Writes values through a codec's registry into `W`.
///
/// Indefinite-length items are opened and closed explicitly; [`Self::finish`]
/// refuses to hand back the writer while any of them is still open.
pub struct ValueEncoder<'c, W: Writer> {
    writer: W,
    codec: &'c Codec,
    open: Vec<OpenItem>,
}

/// An indefinite-length item awaiting its break byte.
struct OpenItem {
    major: u8,
    /// Data items written directly inside; keys and values count separately.
    entries: usize,
}

impl<W: Writer> ValueEncoder<'_, W> {
    pub fn encode(&mut self, value: &Value) -> Result<()> {
        if self.in_string() {
            return Err(CborError::InvalidFraming(
                "indefinite strings only accept chunks",
            ));
        }
        self.encode_value(value, self.open.len())?;
        self.count_entry();
        Ok(())
    }

    /// Opens an indefinite-length array; follow with elements and [`Self::end_indefinite`].
    pub fn begin_indefinite_array(&mut self) -> Result<()> {
        self.begin_indefinite(MAJOR_ARRAY)
    }

    /// Opens an indefinite-length map; follow with alternating keys and values.
    pub fn begin_indefinite_map(&mut self) -> Result<()> {
        self.begin_indefinite(MAJOR_MAP)
    }

    /// Opens an indefinite byte string; add chunks with [`Self::write_bytes_chunk`].
    pub fn begin_indefinite_bytes(&mut self) -> Result<()> {
        self.begin_indefinite(MAJOR_BYTES)
    }

    /// Opens an indefinite text string; add chunks with [`Self::write_text_chunk`].
    pub fn begin_indefinite_text(&mut self) -> Result<()> {
        self.begin_indefinite(MAJOR_TEXT)
    }

    fn begin_indefinite(&mut self, major: u8) -> Result<()> {
        if self.in_string() {
            return Err(CborError::InvalidFraming(
                "nested item inside an indefinite string",
            ));
        }
        check_depth(self.open.len() + 1, self.codec.config.max_depth)?;
        header::write_indefinite(&mut self.writer, major);
        self.count_entry();
        self.open.push(OpenItem { major, entries: 0 });
        Ok(())
    }

    pub fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.write_string_chunk(MAJOR_BYTES, chunk)
    }

    pub fn write_text_chunk(&mut self, chunk: &str) -> Result<()> {
        self.write_string_chunk(MAJOR_TEXT, chunk.as_bytes())
    }

    fn write_string_chunk(&mut self, major: u8, chunk: &[u8]) -> Result<()> {
        if self.open.last().map(|item| item.major) != Some(major) {
            return Err(CborError::InvalidFraming(
                "string chunk outside a matching indefinite string",
            ));
        }
        header::write_header(&mut self.writer, major, chunk.len() as u64);
        self.writer.write_chunk(chunk);
        Ok(())
    }

    /// Closes the innermost indefinite item with a break byte.
    ///
    /// A map holding a key without its value is left open and reported.
    pub fn end_indefinite(&mut self) -> Result<()> {
        match self.open.last() {
            None => {
                return Err(CborError::InvalidFraming(
                    "break without an open indefinite item",
                ));
            }
            Some(item) if item.major == MAJOR_MAP && item.entries % 2 != 0 => {
                return Err(CborError::InvalidFraming(
                    "indefinite map has a key without a value",
                ));
            }
            Some(_) => {}
        }
        self.open.pop();
        header::write_break(&mut self.writer);
        Ok(())
    }

    /// Returns the writer once every indefinite item has been closed.
    pub fn finish(self) -> Result<W> {
        if !self.open.is_empty() {
            return Err(CborError::InvalidFraming(
                "indefinite item left open",
            ));
        }
        Ok(self.writer)
    }

    fn in_string(&self) -> bool {
        matches!(
            self.open.last(),
            Some(OpenItem { major: MAJOR_BYTES | MAJOR_TEXT, .. })
        )
    }

    fn count_entry(&mut self) {
        if let Some(item) = self.open.last_mut() {
            item.entries += 1;
        }
    }

    fn encode_value(&mut self, value: &Value, depth: usize) -> Result<()> {
        check_depth(depth, self.codec.config.max_depth)?;
        match value {
            Value::Integer(n) => self.encode_integer(*n),
            Value::Bytes(b) => {
                header::write_header(&mut self.writer, MAJOR_BYTES, b.len() as u64);
                self.writer.write_chunk(b);
                Ok(())
            }
            Value::Text(s) => {
                header::write_header(&mut self.writer, MAJOR_TEXT, s.len() as u64);
                self.writer.write_chunk(s.as_bytes());
                Ok(())
            }
            Value::Array(items) => {
                header::write_header(&mut self.writer, MAJOR_ARRAY, items.len() as u64);
                for item in items {
                    self.encode_value(item, depth + 1)?;
                }
                Ok(())
            }
            Value::Map(pairs) => {
                header::write_header(&mut self.writer, MAJOR_MAP, pairs.len() as u64);
                for (key, val) in pairs {
                    self.encode_value(key, depth + 1)?;
                    self.encode_value(val, depth + 1)?;
                }
                Ok(())
            }
            Value::Tag(tag, inner) => {
                header::write_header(&mut self.writer, MAJOR_TAG, *tag);
                self.encode_value(inner, depth + 1)
            }
            Value::Bool(b) => {
                self.writer
                    .write_byte((MAJOR_SIMPLE << 5) | if *b { TRUE } else { FALSE });
                Ok(())
            }
            Value::Null => {
                self.writer.write_byte((MAJOR_SIMPLE << 5) | NULL);
                Ok(())
            }
            Value::Undefined => {
                self.writer.write_byte((MAJOR_SIMPLE << 5) | UNDEFINED);
                Ok(())
            }
            Value::Float(f) => {
                write_float(&mut self.writer, *f);
                Ok(())
            }
            Value::Simple(n) => {
                if (FALSE..32).contains(n) {
                    return Err(CborError::InvalidSimpleValue(*n));
                }
                header::write_header(&mut self.writer, MAJOR_SIMPLE, *n as u64);
                Ok(())
            }
            Value::Object(obj) => match self.codec.registry.find_encoder(value) {
                Some((tag, content)) => {
                    trace!(tag, object = obj.type_name(), "semantic encode");
                    header::write_header(&mut self.writer, MAJOR_TAG, tag);
                    self.encode_value(&content, depth + 1)
                }
                None => Err(CborError::UnsupportedType(obj.type_name().to_string())),
            },
        }
    }

    fn encode_integer(&mut self, n: i128) -> Result<()> {
        if n >= 0 {
            let magnitude = u64::try_from(n).map_err(|_| CborError::IntegerOutOfRange(n))?;
            header::write_header(&mut self.writer, MAJOR_UNSIGNED, magnitude);
        } else {
            let magnitude =
                u64::try_from(-1 - n).map_err(|_| CborError::IntegerOutOfRange(n))?;
            header::write_header(&mut self.writer, MAJOR_NEGATIVE, magnitude);
        }
        Ok(())
    }
}

/// Writes a float under major type 7.
///
/// Always eight bytes unless the `compact_floats` feature picks the shortest
/// lossless width.
pub(crate) fn write_float<W: Writer + ?Sized>(writer: &mut W, v: f64) {
    #[cfg(feature = "compact_floats")]
    {
        let h = half::f16::from_f64(v);
        if h.to_f64() == v || (v.is_nan() && h.is_nan()) {
            writer.write_byte((MAJOR_SIMPLE << 5) | TWO_BYTES);
            writer.write_u16(h.to_bits());
            return;
        }
        let s = v as f32;
        if s as f64 == v {
            writer.write_byte((MAJOR_SIMPLE << 5) | FOUR_BYTES);
            writer.write_u32(s.to_bits());
            return;
        }
    }
    writer.write_byte((MAJOR_SIMPLE << 5) | EIGHT_BYTES);
    writer.write_u64(v.to_bits());
}

/// Interprets a major type 7 header as a simple value or float.
pub(crate) fn simple_from_header(header: &Header, offset: usize) -> Result<Value> {
    let bits = match header.argument {
        Argument::Value(bits) => bits,
        Argument::Indefinite => {
            return Err(CborError::malformed(offset, "unexpected break"));
        }
    };
    Ok(match header.info {
        FALSE => Value::Bool(false),
        TRUE => Value::Bool(true),
        NULL => Value::Null,
        UNDEFINED => Value::Undefined,
        0..=19 => Value::Simple(header.info),
        ONE_BYTE if bits < 32 => {
            return Err(CborError::malformed(
                offset,
                "two-byte simple value below 32",
            ));
        }
        ONE_BYTE => Value::Simple(bits as u8),
        TWO_BYTES => Value::Float(half::f16::from_bits(bits as u16).to_f64()),
        FOUR_BYTES => Value::Float(f32::from_bits(bits as u32) as f64),
        _ => Value::Float(f64::from_bits(bits)),
    })
}

struct ValueDecoder<'c, R: Reader> {
    reader: R,
    codec: &'c Codec,
}

impl<R: Reader> ValueDecoder<'_, R> {
    fn decode_value(&mut self, depth: usize) -> Result<Value> {
        check_depth(depth, self.codec.config.max_depth)?;
        let offset = self.reader.position();
        let header = header::read_header(&mut self.reader)?;

        match header.major {
            MAJOR_UNSIGNED => Ok(Value::Integer(definite(&header) as i128)),
            MAJOR_NEGATIVE => Ok(Value::Integer(-1 - definite(&header) as i128)),
            MAJOR_BYTES => read_string_body(&mut self.reader, &header).map(Value::Bytes),
            MAJOR_TEXT => {
                let bytes = read_string_body(&mut self.reader, &header)?;
                String::from_utf8(bytes)
                    .map(Value::Text)
                    .map_err(|_| CborError::InvalidUtf8)
            }
            MAJOR_ARRAY => {
                let mut items = Vec::new();
                match header.length()? {
                    Some(len) => {
                        items.reserve(len.min(PREALLOC_LIMIT));
                        for _ in 0..len {
                            items.push(self.decode_value(depth + 1)?);
                        }
                    }
                    None => {
                        while !consume_break(&mut self.reader)? {
                            items.push(self.decode_value(depth + 1)?);
                        }
                    }
                }
                Ok(Value::Array(items))
            }
            MAJOR_MAP => {
                let mut pairs = Vec::new();
                match header.length()? {
                    Some(len) => {
                        pairs.reserve(len.min(PREALLOC_LIMIT));
                        for _ in 0..len {
                            let key = self.decode_value(depth + 1)?;
                            let val = self.decode_value(depth + 1)?;
                            pairs.push((key, val));
                        }
                    }
                    None => {
                        while !consume_break(&mut self.reader)? {
                            let key = self.decode_value(depth + 1)?;
                            let val = self.decode_value(depth + 1)?;
                            pairs.push((key, val));
                        }
                    }
                }
                Ok(Value::Map(pairs))
            }
            MAJOR_TAG => {
                let tag = definite(&header);
                let inner = self.decode_value(depth + 1)?;
                match self.codec.registry.decoder(tag) {
                    Some(decode) => {
                        trace!(tag, "semantic decode");
                        decode(inner)
                    }
                    None => Ok(Value::Tag(tag, Box::new(inner))),
                }
            }
            _ => simple_from_header(&header, offset),
        }
    }
}

/// Consumes a break byte if one is next.
///
/// Reaching end of input here means the enclosing indefinite item was never closed.
pub(crate) fn consume_break<R: Reader + ?Sized>(reader: &mut R) -> Result<bool> {
    match reader.peek_byte()? {
        Some(header::BREAK) => {
            reader.read_byte()?;
            Ok(true)
        }
        Some(_) => Ok(false),
        None => Err(CborError::UnterminatedCollection),
    }
}

/// Body of a byte or text string, joining the chunks of an indefinite one.
///
/// Text chunks are checked for UTF-8 one by one, so a code point split across
/// chunks is rejected.
pub(crate) fn read_string_body<R: Reader + ?Sized>(reader: &mut R, header: &Header) -> Result<Vec<u8>> {
    let Some(len) = header.length()? else {
        let mut out = Vec::new();
        while !consume_break(reader)? {
            let offset = reader.position();
            let chunk_header = header::read_header(reader)?;
            if chunk_header.major != header.major {
                return Err(CborError::malformed(
                    offset,
                    "indefinite string chunk has the wrong major type",
                ));
            }
            let Some(chunk_len) = chunk_header.length()? else {
                return Err(CborError::malformed(offset, "nested indefinite string chunk"));
            };
            let chunk = reader.read_chunk(chunk_len)?;
            if header.major == MAJOR_TEXT && std::str::from_utf8(&chunk).is_err() {
                return Err(CborError::InvalidUtf8);
            }
            out.extend_from_slice(&chunk);
        }
        return Ok(out);
    };
    reader.read_chunk(len)
}

/// Magnitude of a header whose major type never carries the indefinite marker.
pub(crate) fn definite(header: &Header) -> u64 {
    // read_header rejects info 31 for majors 0, 1 and 6
    header.value().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::IoReader;

    fn roundtrip(value: Value) {
        let codec = Codec::new();
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), value, "bytes: {:02x?}", bytes);
    }

    #[test]
    fn test_integer_boundaries() {
        let codec = Codec::new();
        let cases: [(i128, usize); 8] = [
            (23, 1),
            (24, 2),
            (255, 2),
            (256, 3),
            (65535, 3),
            (65536, 5),
            (4294967295, 5),
            (4294967296, 9),
        ];
        for (n, len) in cases {
            let bytes = codec.encode(&Value::Integer(n)).unwrap();
            assert_eq!(bytes.len(), len, "encoding of {}", n);
            assert_eq!(codec.decode(&bytes).unwrap(), Value::Integer(n));
        }
    }

    #[test]
    fn test_negative_transform() {
        let codec = Codec::new();
        assert_eq!(codec.encode(&Value::from(-1)).unwrap(), vec![0x20]);
        assert_eq!(codec.encode(&Value::from(-256)).unwrap(), vec![0x38, 0xff]);
    }

    #[test]
    fn test_full_integer_range() {
        roundtrip(Value::Integer(u64::MAX as i128));
        roundtrip(Value::Integer(-1 - u64::MAX as i128));

        let codec = Codec::new();
        let too_big = Value::Integer(u64::MAX as i128 + 1);
        assert!(matches!(
            codec.encode(&too_big),
            Err(CborError::IntegerOutOfRange(_))
        ));
        let too_small = Value::Integer(-2 - u64::MAX as i128);
        assert!(matches!(
            codec.encode(&too_small),
            Err(CborError::IntegerOutOfRange(_))
        ));
    }

    #[test]
    fn test_roundtrip_every_major_type() {
        roundtrip(Value::Bytes(vec![0, 1, 2, 255]));
        roundtrip(Value::from("hällo wörld"));
        roundtrip(Value::Array(vec![
            Value::from(1),
            Value::Array(vec![Value::from(2), Value::Null]),
        ]));
        roundtrip(Value::Map(vec![
            (Value::from(1), Value::from("one")),
            (Value::from("nested"), Value::Map(vec![])),
            (Value::from(1), Value::Undefined),
        ]));
        roundtrip(Value::tagged(42, Value::from("x")));
        roundtrip(Value::Bool(true));
        roundtrip(Value::Bool(false));
        roundtrip(Value::Null);
        roundtrip(Value::Undefined);
        roundtrip(Value::Float(-4.1));
        roundtrip(Value::Float(f64::INFINITY));
        roundtrip(Value::Simple(16));
        roundtrip(Value::Simple(255));
    }

    #[cfg(not(feature = "compact_floats"))]
    #[test]
    fn test_float_is_eight_bytes() {
        let bytes = Codec::new().encode(&Value::Float(1.5)).unwrap();
        assert_eq!(bytes, vec![0xfb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_half_and_single_floats_decode() {
        let codec = Codec::new();
        assert_eq!(codec.decode(&[0xf9, 0x3e, 0x00]).unwrap(), Value::Float(1.5));
        assert_eq!(
            codec.decode(&[0xfa, 0x47, 0xc3, 0x50, 0x00]).unwrap(),
            Value::Float(100000.0)
        );
    }

    #[test]
    fn test_reserved_simple_values_rejected() {
        let codec = Codec::new();
        for n in [20u8, 23, 24, 31] {
            assert!(matches!(
                codec.encode(&Value::Simple(n)),
                Err(CborError::InvalidSimpleValue(_))
            ));
        }
        assert!(matches!(
            codec.decode(&[0xf8, 0x10]),
            Err(CborError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_indefinite_array_matches_definite() {
        let codec = Codec::new();
        let definite = codec
            .decode(&codec.encode(&Value::from(vec![Value::from(1), Value::from(2), Value::from(3)])).unwrap())
            .unwrap();
        let indefinite = codec.decode(&[0x9f, 0x01, 0x02, 0x03, 0xff]).unwrap();
        assert_eq!(definite, indefinite);
    }

    #[test]
    fn test_indefinite_map_and_strings() {
        let codec = Codec::new();
        // {_ "a": 1, "b": [_ 2]}
        let bytes = [0xbf, 0x61, 0x61, 0x01, 0x61, 0x62, 0x9f, 0x02, 0xff, 0xff];
        assert_eq!(
            codec.decode(&bytes).unwrap(),
            Value::Map(vec![
                (Value::from("a"), Value::from(1)),
                (Value::from("b"), Value::Array(vec![Value::from(2)])),
            ])
        );
        // (_ h'0102', h'03')
        let bytes = [0x5f, 0x42, 0x01, 0x02, 0x41, 0x03, 0xff];
        assert_eq!(codec.decode(&bytes).unwrap(), Value::Bytes(vec![1, 2, 3]));
        // (_ "strea", "ming")
        let bytes = [
            0x7f, 0x65, 0x73, 0x74, 0x72, 0x65, 0x61, 0x64, 0x6d, 0x69, 0x6e, 0x67, 0xff,
        ];
        assert_eq!(codec.decode(&bytes).unwrap(), Value::from("streaming"));
    }

    #[test]
    fn test_indefinite_string_chunk_rules() {
        let codec = Codec::new();
        // text chunk inside a byte string
        assert!(matches!(
            codec.decode(&[0x5f, 0x61, 0x61, 0xff]),
            Err(CborError::MalformedHeader { offset: 1, .. })
        ));
        // nested indefinite chunk
        assert!(matches!(
            codec.decode(&[0x5f, 0x5f, 0xff, 0xff]),
            Err(CborError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_encoder_indefinite_framing() {
        let codec = Codec::new();
        let mut encoder = codec.encoder();
        encoder.begin_indefinite_array().unwrap();
        for n in 1..=3 {
            encoder.encode(&Value::from(n)).unwrap();
        }
        encoder.begin_indefinite_text().unwrap();
        encoder.write_text_chunk("ab").unwrap();
        encoder.write_text_chunk("c").unwrap();
        encoder.end_indefinite().unwrap();
        encoder.end_indefinite().unwrap();
        let bytes = encoder.finish().unwrap().result();

        assert_eq!(
            bytes,
            vec![0x9f, 0x01, 0x02, 0x03, 0x7f, 0x62, 0x61, 0x62, 0x61, 0x63, 0xff, 0xff]
        );
        assert_eq!(
            codec.decode(&bytes).unwrap(),
            Value::Array(vec![
                Value::from(1),
                Value::from(2),
                Value::from(3),
                Value::from("abc"),
            ])
        );
    }

    #[test]
    fn test_encoder_misuse() {
        let codec = Codec::new();
        let mut encoder = codec.encoder();
        assert!(encoder.end_indefinite().is_err());
        assert!(encoder.write_bytes_chunk(b"x").is_err());
        encoder.begin_indefinite_bytes().unwrap();
        assert!(encoder.write_text_chunk("x").is_err());
        assert!(matches!(
            encoder.begin_indefinite_array(),
            Err(CborError::InvalidFraming(_))
        ));
        assert!(matches!(
            encoder.encode(&Value::from(1)),
            Err(CborError::InvalidFraming(_))
        ));
    }

    #[test]
    fn test_indefinite_map_needs_even_entries() {
        let codec = Codec::new();
        let mut encoder = codec.encoder();
        encoder.begin_indefinite_map().unwrap();
        encoder.encode(&Value::from(1)).unwrap();
        assert!(matches!(
            encoder.end_indefinite(),
            Err(CborError::InvalidFraming(_))
        ));

        // the map stays open, so supplying the value lets it close
        encoder.encode(&Value::from("one")).unwrap();
        encoder.end_indefinite().unwrap();
        let bytes = encoder.finish().unwrap().result();
        assert_eq!(
            codec.decode(&bytes).unwrap(),
            Value::Map(vec![(Value::from(1), Value::from("one"))])
        );
    }

    #[test]
    fn test_nested_item_counts_as_one_map_entry() {
        let codec = Codec::new();
        let mut encoder = codec.encoder();
        encoder.begin_indefinite_map().unwrap();
        encoder.encode(&Value::from("k")).unwrap();
        encoder.begin_indefinite_array().unwrap();
        encoder.encode(&Value::from(1)).unwrap();
        encoder.encode(&Value::from(2)).unwrap();
        encoder.end_indefinite().unwrap();
        encoder.end_indefinite().unwrap();
        let bytes = encoder.finish().unwrap().result();
        assert_eq!(
            codec.decode(&bytes).unwrap(),
            Value::Map(vec![(
                Value::from("k"),
                Value::Array(vec![Value::from(1), Value::from(2)])
            )])
        );
    }

    #[test]
    fn test_finish_rejects_open_items() {
        let codec = Codec::new();
        let mut encoder = codec.encoder();
        encoder.begin_indefinite_array().unwrap();
        encoder.encode(&Value::from(1)).unwrap();
        assert!(matches!(
            encoder.finish(),
            Err(CborError::InvalidFraming(_))
        ));

        let mut encoder = codec.encoder();
        encoder.begin_indefinite_text().unwrap();
        encoder.write_text_chunk("partial").unwrap();
        assert!(encoder.finish().is_err());
    }

    #[test]
    fn test_unterminated_collection() {
        let codec = Codec::new();
        assert!(matches!(
            codec.decode(&[0x9f, 0x01, 0x02]),
            Err(CborError::UnterminatedCollection)
        ));
        assert!(matches!(
            codec.decode(&[0xbf, 0x01, 0x02]),
            Err(CborError::UnterminatedCollection)
        ));
    }

    #[test]
    fn test_break_outside_collection() {
        let codec = Codec::new();
        assert!(matches!(
            codec.decode(&[0xff]),
            Err(CborError::MalformedHeader { offset: 0, .. })
        ));
        // break in a definite array
        assert!(matches!(
            codec.decode(&[0x82, 0x01, 0xff]),
            Err(CborError::MalformedHeader { offset: 2, .. })
        ));
        // break in value position of an indefinite map
        assert!(matches!(
            codec.decode(&[0xbf, 0x01, 0xff]),
            Err(CborError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_truncated_input() {
        let codec = Codec::new();
        // byte string declaring a 4-byte length with only 2 length bytes present
        assert!(matches!(
            codec.decode(&[0x5a, 0x00, 0x00]),
            Err(CborError::TruncatedInput { .. })
        ));
        // body shorter than declared
        assert!(matches!(
            codec.decode(&[0x44, 0x01, 0x02]),
            Err(CborError::TruncatedInput { needed: 2 })
        ));
        assert!(matches!(
            codec.decode(&[]),
            Err(CborError::TruncatedInput { .. })
        ));
        // definite array missing elements
        assert!(matches!(
            codec.decode(&[0x83, 0x01]),
            Err(CborError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let codec = Codec::new();
        assert!(matches!(
            codec.decode(&[0x62, 0xc3, 0x28]),
            Err(CborError::InvalidUtf8)
        ));
    }

    #[test]
    fn test_huge_declared_length_does_not_allocate() {
        let codec = Codec::new();
        let bytes = [0x9b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00];
        assert!(codec.decode(&bytes).is_err());
    }

    #[test]
    fn test_trailing_data_and_prefix() {
        let codec = Codec::new();
        let bytes = [0x01, 0x02];
        assert!(matches!(codec.decode(&bytes), Err(CborError::TrailingData(1))));
        assert_eq!(codec.decode_prefix(&bytes).unwrap(), (Value::from(1), 1));
    }

    #[test]
    fn test_depth_limit_decode() {
        let codec = Codec::with_config(CodecConfig::default().with_max_depth(3));
        // [[[1]]] is depth 3
        assert!(codec.decode(&[0x81, 0x81, 0x81, 0x01]).is_ok());
        assert!(matches!(
            codec.decode(&[0x81, 0x81, 0x81, 0x81, 0x01]),
            Err(CborError::DepthLimitExceeded(3))
        ));

        let deep = vec![0x9f; 100_000];
        assert!(matches!(
            Codec::new().decode(&deep),
            Err(CborError::DepthLimitExceeded(DEFAULT_MAX_DEPTH))
        ));
    }

    #[test]
    fn test_depth_limit_encode() {
        let codec = Codec::with_config(CodecConfig::default().with_max_depth(2));
        let mut value = Value::from(0);
        for _ in 0..3 {
            value = Value::tagged(1, value);
        }
        assert!(matches!(
            codec.encode(&value),
            Err(CborError::DepthLimitExceeded(2))
        ));
    }

    #[test]
    fn test_decode_from_io_reader() {
        let codec = Codec::new();
        let value = Value::Map(vec![(
            Value::from("payload"),
            Value::Bytes(vec![7; 300]),
        )]);
        let bytes = codec.encode(&value).unwrap();
        let decoded = codec.decode_from(IoReader::new(&bytes[..])).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_encoder_for_vec() {
        let codec = Codec::new();
        let mut encoder = codec.encoder_for(Vec::new());
        encoder.encode(&Value::from(1)).unwrap();
        encoder.encode(&Value::from(2)).unwrap();
        assert_eq!(encoder.finish().unwrap(), vec![0x01, 0x02]);
    }
}
