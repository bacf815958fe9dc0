//! serde [`Deserializer`](serde::Deserializer) reading CBOR from a [`Reader`].
//!
//! Tags are skipped and their content is handed to the visitor, so a tagged
//! date string deserializes straight into a `String`.

use serde::de::{self, DeserializeSeed, IntoDeserializer, Visitor};

use crate::codec::{DEFAULT_MAX_DEPTH, consume_break, definite, read_string_body};
use crate::error::{CborError, Result};
use crate::header::{
    self, FALSE, Header, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE,
    MAJOR_TAG, MAJOR_TEXT, MAJOR_UNSIGNED, NULL, TRUE, UNDEFINED,
};
use crate::read::Reader;

pub struct Decoder<R: Reader> {
    reader: R,
    depth: usize,
    max_depth: usize,
}

impl<R: Reader> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Decoder {
            reader,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reads a tag header and returns its number, leaving the content unread.
    pub fn read_tag(&mut self) -> Result<u64> {
        let offset = self.reader.position();
        let header = header::read_header(&mut self.reader)?;
        if header.major != MAJOR_TAG {
            return Err(CborError::malformed(offset, "expected a tag"));
        }
        Ok(definite(&header))
    }

    pub fn decode<'de, T: de::Deserialize<'de>>(&mut self) -> Result<T> {
        T::deserialize(&mut *self)
    }

    pub fn position(&self) -> usize {
        self.reader.position()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(CborError::DepthLimitExceeded(self.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn read_text(&mut self, header: &Header) -> Result<String> {
        let bytes = read_string_body(&mut self.reader, header)?;
        String::from_utf8(bytes).map_err(|_| CborError::InvalidUtf8)
    }
}

impl<'de, R: Reader> de::Deserializer<'de> for &mut Decoder<R> {
    type Error = CborError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let offset = self.reader.position();
        let header = header::read_header(&mut self.reader)?;

        match header.major {
            MAJOR_UNSIGNED => visitor.visit_u64(definite(&header)),
            MAJOR_NEGATIVE => {
                let magnitude = definite(&header);
                if magnitude <= i64::MAX as u64 {
                    visitor.visit_i64(-1 - magnitude as i64)
                } else {
                    visitor.visit_i128(-1 - magnitude as i128)
                }
            }
            MAJOR_BYTES => visitor.visit_byte_buf(read_string_body(&mut self.reader, &header)?),
            MAJOR_TEXT => visitor.visit_string(self.read_text(&header)?),
            MAJOR_ARRAY => {
                self.enter()?;
                let mut seq = SeqAccess::new(&mut *self, header.length()?);
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                self.leave();
                Ok(value)
            }
            MAJOR_MAP => {
                self.enter()?;
                let mut map = MapAccess::new(&mut *self, header.length()?);
                let value = visitor.visit_map(&mut map)?;
                map.end()?;
                self.leave();
                Ok(value)
            }
            MAJOR_TAG => {
                self.enter()?;
                let value = self.deserialize_any(visitor)?;
                self.leave();
                Ok(value)
            }
            _ => match header.info {
                FALSE => visitor.visit_bool(false),
                TRUE => visitor.visit_bool(true),
                NULL => visitor.visit_none(),
                UNDEFINED => visitor.visit_unit(),
                _ => match crate::codec::simple_from_header(&header, offset)? {
                    crate::Value::Float(f) => visitor.visit_f64(f),
                    _ => Err(CborError::UnsupportedType(format!(
                        "simple value at offset {}",
                        offset
                    ))),
                },
            },
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        const NULL_BYTE: u8 = (MAJOR_SIMPLE << 5) | NULL;
        const UNDEFINED_BYTE: u8 = (MAJOR_SIMPLE << 5) | UNDEFINED;
        // look through tags, as deserialize_any does
        while let Some(byte) = self.reader.peek_byte()? {
            if byte >> 5 != MAJOR_TAG {
                break;
            }
            self.read_tag()?;
        }
        match self.reader.peek_byte()? {
            Some(NULL_BYTE | UNDEFINED_BYTE) => {
                self.reader.read_byte()?;
                visitor.visit_none()
            }
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let offset = self.reader.position();
        let header = header::read_header(&mut self.reader)?;
        match header.major {
            MAJOR_TEXT => {
                let variant = self.read_text(&header)?;
                visitor.visit_enum(variant.into_deserializer())
            }
            MAJOR_MAP if header.length()? == Some(1) => {
                self.enter()?;
                let value = visitor.visit_enum(Enum { de: &mut *self })?;
                self.leave();
                Ok(value)
            }
            _ => Err(CborError::malformed(
                offset,
                "expected a variant name or a single-entry map",
            )),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqAccess<'a, R: Reader> {
    de: &'a mut Decoder<R>,
    /// `None` for indefinite-length arrays.
    remaining: Option<usize>,
    taken: usize,
    /// Set once the break of an indefinite array has been read.
    closed: bool,
}

impl<'a, R: Reader> SeqAccess<'a, R> {
    fn new(de: &'a mut Decoder<R>, remaining: Option<usize>) -> Self {
        SeqAccess {
            de,
            remaining,
            taken: 0,
            closed: false,
        }
    }

    /// Fails if the visitor stopped before the last element.
    fn end(self) -> Result<()> {
        let left = match self.remaining {
            Some(n) => n,
            None if self.closed || consume_break(&mut self.de.reader)? => 0,
            None => 1,
        };
        if left > 0 {
            return Err(de::Error::invalid_length(
                self.taken + left,
                &"fewer elements in array",
            ));
        }
        Ok(())
    }
}

impl<'de, R: Reader> de::SeqAccess<'de> for SeqAccess<'_, R> {
    type Error = CborError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.remaining.as_mut() {
            Some(0) => return Ok(None),
            Some(n) => *n -= 1,
            None => {
                if self.closed {
                    return Ok(None);
                }
                if consume_break(&mut self.de.reader)? {
                    self.closed = true;
                    return Ok(None);
                }
            }
        }
        self.taken += 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        self.remaining
    }
}

struct MapAccess<'a, R: Reader> {
    de: &'a mut Decoder<R>,
    /// Pairs left; `None` for indefinite-length maps.
    remaining: Option<usize>,
    taken: usize,
    closed: bool,
}

impl<'a, R: Reader> MapAccess<'a, R> {
    fn new(de: &'a mut Decoder<R>, remaining: Option<usize>) -> Self {
        MapAccess {
            de,
            remaining,
            taken: 0,
            closed: false,
        }
    }

    fn end(self) -> Result<()> {
        let left = match self.remaining {
            Some(n) => n,
            None if self.closed || consume_break(&mut self.de.reader)? => 0,
            None => 1,
        };
        if left > 0 {
            return Err(de::Error::invalid_length(
                self.taken + left,
                &"fewer entries in map",
            ));
        }
        Ok(())
    }
}

impl<'de, R: Reader> de::MapAccess<'de> for MapAccess<'_, R> {
    type Error = CborError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.remaining.as_mut() {
            Some(0) => return Ok(None),
            Some(n) => *n -= 1,
            None => {
                if self.closed {
                    return Ok(None);
                }
                if consume_break(&mut self.de.reader)? {
                    self.closed = true;
                    return Ok(None);
                }
            }
        }
        self.taken += 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        self.remaining
    }
}

/// A `{ variant: content }` map as written by the encoder for data-carrying variants.
struct Enum<'a, R: Reader> {
    de: &'a mut Decoder<R>,
}

impl<'de, R: Reader> de::EnumAccess<'de> for Enum<'_, R> {
    type Error = CborError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self)> {
        let variant = seed.deserialize(&mut *self.de)?;
        Ok((variant, self))
    }
}

impl<'de, R: Reader> de::VariantAccess<'de> for Enum<'_, R> {
    type Error = CborError;

    fn unit_variant(self) -> Result<()> {
        de::Deserialize::deserialize(&mut *self.de).map(|_: de::IgnoredAny| ())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(&mut *self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(&mut *self.de, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_map(&mut *self.de, visitor)
    }
}
