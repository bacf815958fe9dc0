use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
    ser::{self, SerializeMap, SerializeSeq},
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Dynamic CBOR value type for working with untyped CBOR data
///
/// Covers all eight major types. Maps keep their pairs in insertion order and
/// may hold duplicate keys; deduplication is left to the caller.
///
/// # Example
/// ```
/// use tagwire_cbor::{Value, decode, encode};
///
/// let value = Value::Map(vec![
///     (Value::from("name"), Value::from("Alice")),
///     (Value::from("age"), Value::from(30)),
/// ]);
///
/// let bytes = encode(&value).unwrap();
/// assert_eq!(decode(&bytes).unwrap(), value);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer value; wide enough for every major type 0 and 1 magnitude
    Integer(i128),
    /// Byte string
    Bytes(Vec<u8>),
    /// Text string
    Text(String),
    /// Array of values
    Array(Vec<Value>),
    /// Map as ordered key/value pairs
    Map(Vec<(Value, Value)>),
    /// Tagged value (tag number, boxed content)
    Tag(u64, Box<Value>),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Undefined value (simple value 23)
    Undefined,
    /// Floating point value
    Float(f64),
    /// Unassigned simple value (0-19 or 32-255)
    Simple(u8),
    /// Domain object that only a semantic encoder knows how to write
    Object(Object),
}

/// Any type that can travel through the codec as a [`Value::Object`].
///
/// Implemented automatically for every `'static` type that is `Debug`,
/// `PartialEq`, `Send` and `Sync`.
pub trait DomainObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn DomainObject) -> bool;

    fn type_name(&self) -> &'static str;
}

impl<T> DomainObject for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DomainObject) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| self == o)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Shared handle to a domain object.
#[derive(Clone)]
pub struct Object(Arc<dyn DomainObject>);

impl Object {
    pub fn new<T: DomainObject>(value: T) -> Self {
        Object(Arc::new(value))
    }

    fn inner(&self) -> &dyn DomainObject {
        &*self.0
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner().as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner().as_any().is::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.inner().type_name()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.inner().dyn_eq(other.inner())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.inner(), f)
    }
}

impl Serialize for Value {
    /// Tags serialize as their content and `Undefined` as unit, since serde has
    /// no equivalent for either. Generic simple values and domain objects are errors.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Integer(i) => {
                if let Ok(v) = i64::try_from(*i) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(*i) {
                    serializer.serialize_u64(v)
                } else {
                    serializer.serialize_i128(*i)
                }
            }
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for item in a {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Tag(_tag, inner) => inner.serialize(serializer),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_none(),
            Value::Undefined => serializer.serialize_unit(),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Simple(n) => Err(ser::Error::custom(format!(
                "simple value {} has no serde representation",
                n
            ))),
            Value::Object(o) => Err(ser::Error::custom(format!(
                "domain object {} has no serde representation",
                o.type_name()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid CBOR value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::Integer(value as i128))
            }

            fn visit_i128<E>(self, value: i128) -> Result<Value, E> {
                Ok(Value::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(Value::Integer(value as i128))
            }

            fn visit_u128<E>(self, value: u128) -> Result<Value, E>
            where
                E: de::Error,
            {
                i128::try_from(value)
                    .map(Value::Integer)
                    .map_err(|_| E::custom(format!("u128 value {} too large", value)))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Text(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::Text(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_seq<V>(self, mut visitor: V) -> Result<Value, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(visitor.size_hint().unwrap_or(0).min(1024));
                while let Some(elem) = visitor.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<Value, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(visitor.size_hint().unwrap_or(0).min(1024));
                while let Some((key, value)) = visitor.next_entry()? {
                    pairs.push((key, value));
                }
                Ok(Value::Map(pairs))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl Value {
    /// Wraps `value` in a semantic tag.
    pub fn tagged(tag: u64, value: impl Into<Value>) -> Self {
        Value::Tag(tag, Box::new(value.into()))
    }

    /// Wraps a domain object.
    pub fn object<T: DomainObject>(value: T) -> Self {
        Value::Object(Object::new(value))
    }

    /// Returns true if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if the value is tagged
    pub fn is_tag(&self) -> bool {
        matches!(self, Value::Tag(_, _))
    }

    /// Returns the value as a boolean, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is one
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the integer if it fits in an `i64`
    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|i| i64::try_from(i).ok())
    }

    /// Returns the integer if it fits in a `u64`
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|i| u64::try_from(i).ok())
    }

    /// Returns the value as a float, if it is one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as bytes, if it is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as text, if it is a text string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an array, if it is one
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the map pairs, if this is a map
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the tag number and inner value, if this is a tagged value
    pub fn as_tag(&self) -> Option<(u64, &Value)> {
        match self {
            Value::Tag(tag, value) => Some((*tag, value)),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Looks up the first pair whose key equals `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Tag(_, _) => "tag",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Float(_) => "float",
            Value::Simple(_) => "simple",
            Value::Object(o) => o.type_name(),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(v as i128)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}
