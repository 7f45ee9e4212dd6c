//! Loosely structured metadata attached to blocks (block entities) and
//! entities, as a typed tree of NBT-shaped values.

use indexmap::IndexMap;

/// A named set of values. Keeps insertion order; compares order-insensitively.
pub type NbtCompound = IndexMap<String, NbtValue>;

/// One NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    List(Vec<NbtValue>),
    Compound(NbtCompound),
}

impl NbtValue {
    /// Any integral variant widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            NbtValue::Byte(v) => Some(v.into()),
            NbtValue::Short(v) => Some(v.into()),
            NbtValue::Int(v) => Some(v.into()),
            NbtValue::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            NbtValue::Float(v) => Some(v.into()),
            NbtValue::Double(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for NbtValue {
    fn from(v: bool) -> Self {
        NbtValue::Byte(v as i8)
    }
}

impl From<i8> for NbtValue {
    fn from(v: i8) -> Self {
        NbtValue::Byte(v)
    }
}

impl From<i16> for NbtValue {
    fn from(v: i16) -> Self {
        NbtValue::Short(v)
    }
}

impl From<i32> for NbtValue {
    fn from(v: i32) -> Self {
        NbtValue::Int(v)
    }
}

impl From<i64> for NbtValue {
    fn from(v: i64) -> Self {
        NbtValue::Long(v)
    }
}

impl From<f32> for NbtValue {
    fn from(v: f32) -> Self {
        NbtValue::Float(v)
    }
}

impl From<f64> for NbtValue {
    fn from(v: f64) -> Self {
        NbtValue::Double(v)
    }
}

impl From<&str> for NbtValue {
    fn from(v: &str) -> Self {
        NbtValue::String(v.to_owned())
    }
}

impl From<String> for NbtValue {
    fn from(v: String) -> Self {
        NbtValue::String(v)
    }
}

impl From<NbtCompound> for NbtValue {
    fn from(v: NbtCompound) -> Self {
        NbtValue::Compound(v)
    }
}
