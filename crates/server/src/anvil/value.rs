//! Conversions between the engine's [`NbtValue`] tree and `fastnbt::Value`.

use std::collections::HashMap;

use fastnbt::{ByteArray, IntArray, LongArray, Value};
use voxelstore_engine::nbt::{NbtCompound, NbtValue};

pub(crate) fn to_value(value: &NbtValue) -> Value {
    match value {
        NbtValue::Byte(v) => Value::Byte(*v),
        NbtValue::Short(v) => Value::Short(*v),
        NbtValue::Int(v) => Value::Int(*v),
        NbtValue::Long(v) => Value::Long(*v),
        NbtValue::Float(v) => Value::Float(*v),
        NbtValue::Double(v) => Value::Double(*v),
        NbtValue::String(v) => Value::String(v.clone()),
        NbtValue::ByteArray(v) => Value::ByteArray(ByteArray::new(v.clone())),
        NbtValue::IntArray(v) => Value::IntArray(IntArray::new(v.clone())),
        NbtValue::LongArray(v) => Value::LongArray(LongArray::new(v.clone())),
        NbtValue::List(items) => Value::List(items.iter().map(to_value).collect()),
        NbtValue::Compound(c) => Value::Compound(to_compound(c)),
    }
}

pub(crate) fn to_compound(compound: &NbtCompound) -> HashMap<String, Value> {
    compound
        .iter()
        .map(|(k, v)| (k.clone(), to_value(v)))
        .collect()
}

pub(crate) fn from_value(value: Value) -> NbtValue {
    match value {
        Value::Byte(v) => NbtValue::Byte(v),
        Value::Short(v) => NbtValue::Short(v),
        Value::Int(v) => NbtValue::Int(v),
        Value::Long(v) => NbtValue::Long(v),
        Value::Float(v) => NbtValue::Float(v),
        Value::Double(v) => NbtValue::Double(v),
        Value::String(v) => NbtValue::String(v),
        Value::ByteArray(v) => NbtValue::ByteArray(v.iter().copied().collect()),
        Value::IntArray(v) => NbtValue::IntArray(v.iter().copied().collect()),
        Value::LongArray(v) => NbtValue::LongArray(v.iter().copied().collect()),
        Value::List(items) => NbtValue::List(items.into_iter().map(from_value).collect()),
        Value::Compound(c) => NbtValue::Compound(from_compound(c)),
    }
}

/// Key order is not preserved on disk; entries come back sorted by key so
/// repeated loads are stable.
pub(crate) fn from_compound(compound: HashMap<String, Value>) -> NbtCompound {
    let mut entries: Vec<(String, Value)> = compound.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
        .into_iter()
        .map(|(k, v)| (k, from_value(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_values_survive_conversion() {
        let mut inner = NbtCompound::new();
        inner.insert("Slot".into(), NbtValue::Byte(4));
        inner.insert("ids".into(), NbtValue::LongArray(vec![i64::MIN, 0, 9]));

        let mut outer = NbtCompound::new();
        outer.insert("Items".into(), NbtValue::List(vec![NbtValue::Compound(inner)]));
        outer.insert("Lock".into(), "".into());
        outer.insert("Weight".into(), NbtValue::Float(1.5));
        outer.insert("Colors".into(), NbtValue::IntArray(vec![-1, 2]));
        outer.insert("Bits".into(), NbtValue::ByteArray(vec![1, -1]));

        let back = from_compound(to_compound(&outer));
        assert_eq!(back, outer);
    }

    #[test]
    fn keys_come_back_sorted() {
        let mut c = NbtCompound::new();
        c.insert("z".into(), NbtValue::Int(1));
        c.insert("a".into(), NbtValue::Int(2));
        let back = from_compound(to_compound(&c));
        assert_eq!(back.keys().map(String::as_str).collect::<Vec<_>>(), ["a", "z"]);
    }
}
