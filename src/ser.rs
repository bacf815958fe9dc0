//! serde [`Serializer`](serde::Serializer) writing CBOR through a [`Writer`].

use serde::Serialize;
use serde::ser;

use crate::codec::write_float;
use crate::error::{CborError, Result};
use crate::header::{
    self, FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG,
    MAJOR_TEXT, MAJOR_UNSIGNED, NULL, TRUE,
};
use crate::write::Writer;

/// Serializes Rust values as CBOR.
///
/// Sequences and maps of unknown length are written with indefinite-length
/// framing; everything else uses definite lengths.
pub struct Encoder<W: Writer> {
    writer: W,
}

impl<W: Writer> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    pub fn write_tag(&mut self, tag: u64) -> Result<()> {
        header::write_header(&mut self.writer, MAJOR_TAG, tag);
        Ok(())
    }

    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// State for a compound item; `indefinite` items are closed with a break byte.
pub struct Compound<'a, W: Writer> {
    enc: &'a mut Encoder<W>,
    indefinite: bool,
}

impl<W: Writer> Compound<'_, W> {
    fn finish(self) -> Result<()> {
        if self.indefinite {
            header::write_break(&mut self.enc.writer);
        }
        Ok(())
    }
}

impl<'a, W: Writer> ser::Serializer for &'a mut Encoder<W> {
    type Ok = ();
    type Error = CborError;
    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Compound<'a, W>;
    type SerializeMap = Compound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Compound<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        let val = if v { TRUE } else { FALSE };
        self.writer.write_byte((MAJOR_SIMPLE << 5) | val);
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        if v >= 0 {
            header::write_header(&mut self.writer, MAJOR_UNSIGNED, v as u64);
        } else {
            header::write_header(&mut self.writer, MAJOR_NEGATIVE, (-1 - v) as u64);
        }
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        if v >= 0 {
            let magnitude = u64::try_from(v).map_err(|_| CborError::IntegerOutOfRange(v))?;
            header::write_header(&mut self.writer, MAJOR_UNSIGNED, magnitude);
        } else {
            let magnitude = u64::try_from(-1 - v).map_err(|_| CborError::IntegerOutOfRange(v))?;
            header::write_header(&mut self.writer, MAJOR_NEGATIVE, magnitude);
        }
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        header::write_header(&mut self.writer, MAJOR_UNSIGNED, v);
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        let magnitude =
            u64::try_from(v).map_err(|_| CborError::IntegerOutOfRange(v.min(i128::MAX as u128) as i128))?;
        self.serialize_u64(magnitude)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        write_float(&mut self.writer, v);
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        header::write_header(&mut self.writer, MAJOR_TEXT, v.len() as u64);
        self.writer.write_chunk(v.as_bytes());
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        header::write_header(&mut self.writer, MAJOR_BYTES, v.len() as u64);
        self.writer.write_chunk(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        self.writer.write_byte((MAJOR_SIMPLE << 5) | NULL);
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.serialize_none()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        header::write_header(&mut self.writer, MAJOR_MAP, 1);
        variant.serialize(&mut *self)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.open(MAJOR_ARRAY, len)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.open(MAJOR_ARRAY, Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.open(MAJOR_ARRAY, Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        header::write_header(&mut self.writer, MAJOR_MAP, 1);
        variant.serialize(&mut *self)?;
        self.open(MAJOR_ARRAY, Some(len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        self.open(MAJOR_MAP, len)
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.open(MAJOR_MAP, Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        header::write_header(&mut self.writer, MAJOR_MAP, 1);
        variant.serialize(&mut *self)?;
        self.open(MAJOR_MAP, Some(len))
    }
}

impl<W: Writer> Encoder<W> {
    fn open(&mut self, major: u8, len: Option<usize>) -> Result<Compound<'_, W>> {
        match len {
            Some(len) => header::write_header(&mut self.writer, major, len as u64),
            None => header::write_indefinite(&mut self.writer, major),
        }
        Ok(Compound {
            enc: self,
            indefinite: len.is_none(),
        })
    }
}

impl<W: Writer> ser::SerializeSeq for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Writer> ser::SerializeTuple for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Writer> ser::SerializeTupleStruct for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Writer> ser::SerializeTupleVariant for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Writer> ser::SerializeMap for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(&mut *self.enc)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Writer> ser::SerializeStruct for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        key.serialize(&mut *self.enc)?;
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: Writer> ser::SerializeStructVariant for Compound<'_, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        key.serialize(&mut *self.enc)?;
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}
