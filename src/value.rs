// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use bytes::Bytes;
use getset::Getters;

use crate::wire_type::{
    Shape,
    WireType,
};

/// A single value held by a record field. Which wire type it is encoded as
/// comes from the field, not the value: a [`WireValue::List`] is a fixed
/// array or a sequence depending on the declared [`WireType`].
///
/// `u8` collections are canonically held as [`WireValue::Bytes`]; the
/// decoder always produces that form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    String(String),
    Bytes(Bytes),
    List(Vec<WireValue>),
    Record(Record),
}

impl WireValue {
    pub fn kind(&self) -> &'static str {
        match self {
            | WireValue::Bool(_) => "bool",
            | WireValue::I8(_) => "i8",
            | WireValue::I16(_) => "i16",
            | WireValue::I32(_) => "i32",
            | WireValue::I64(_) => "i64",
            | WireValue::U8(_) => "u8",
            | WireValue::U16(_) => "u16",
            | WireValue::U32(_) => "u32",
            | WireValue::U64(_) => "u64",
            | WireValue::String(_) => "string",
            | WireValue::Bytes(_) => "bytes",
            | WireValue::List(_) => "list",
            | WireValue::Record(_) => "record",
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            | WireValue::Record(record) => Some(record),
            | _ => None,
        }
    }
}

macro_rules! wire_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for WireValue {
                fn from(val: $ty) -> Self {
                    WireValue::$variant(val)
                }
            }
        )*
    };
}

wire_value_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    String => String,
    Bytes => Bytes,
    Vec<WireValue> => List,
    Record => Record,
}

impl From<&str> for WireValue {
    fn from(val: &str) -> Self {
        WireValue::String(val.to_owned())
    }
}

impl From<Vec<u8>> for WireValue {
    fn from(val: Vec<u8>) -> Self {
        WireValue::Bytes(Bytes::from(val))
    }
}

/// A named, typed value. Fields are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Field {
    name: String,
    ty: WireType,
    value: WireValue,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: WireType, value: impl Into<WireValue>) -> Self {
        Field {
            name: name.into(),
            ty,
            value: value.into(),
        }
    }
}

/// An ordered collection of fields. The order fields were added in is the
/// order they are encoded and decoded in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    pub fn builder() -> RecordBuilder {
        RecordBuilder::new()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up the first field with `name`.
    pub fn get(&self, name: &str) -> Option<&WireValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// The shape a decoder needs to read this record back.
    pub fn shape(&self) -> Shape {
        self.fields
            .iter()
            .fold(Shape::new(), |shape, f| shape.field(f.name.clone(), f.ty.clone()))
    }
}

macro_rules! scalar_setters {
    ($($method:ident: $ty:ty => $wire:ident),* $(,)?) => {
        $(
            pub fn $method(self, name: impl Into<String>, val: $ty) -> Self {
                self.field(name, WireType::$wire, val)
            }
        )*
    };
}

/// Accumulates fields and produces an immutable [`Record`] at the end, so a
/// half-populated record is never observable.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: Vec<Field>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        RecordBuilder { fields: Vec::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        RecordBuilder {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: WireType, val: impl Into<WireValue>) -> Self {
        self.push(Field::new(name, ty, val));
        self
    }

    pub(crate) fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    scalar_setters! {
        bool: bool => Bool,
        i8: i8 => I8,
        i16: i16 => I16,
        i32: i32 => I32,
        i64: i64 => I64,
        u8: u8 => U8,
        u16: u16 => U16,
        u32: u32 => U32,
        u64: u64 => U64,
    }

    pub fn string(self, name: impl Into<String>, val: impl Into<String>) -> Self {
        self.field(name, WireType::String, WireValue::String(val.into()))
    }

    /// A length prefixed byte sequence.
    pub fn bytes(self, name: impl Into<String>, val: impl Into<Bytes>) -> Self {
        self.field(name, WireType::sequence(WireType::U8), WireValue::Bytes(val.into()))
    }

    /// A byte array whose length is part of the type.
    pub fn fixed_bytes(self, name: impl Into<String>, val: impl Into<Bytes>) -> Self {
        let val = val.into();
        self.field(
            name,
            WireType::fixed_array(WireType::U8, val.len()),
            WireValue::Bytes(val),
        )
    }

    /// A nested record, typed by its own shape.
    pub fn record(self, name: impl Into<String>, val: Record) -> Self {
        self.field(name, WireType::Record(val.shape()), WireValue::Record(val))
    }

    pub fn build(self) -> Record {
        Record {
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let record = Record::builder()
            .u16("c", 3)
            .u16("a", 1)
            .string("b", "two")
            .build();

        let names: Vec<_> = record.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(record.get("a"), Some(&WireValue::U16(1)));
        assert_eq!(record.get("b"), Some(&WireValue::String("two".into())));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_shape_of_record() {
        let inner = Record::builder().u16("b1", 13).u16("b2", 15).build();
        let record = Record::builder()
            .u16("a", 17)
            .record("b", inner)
            .u16("c", 21)
            .fixed_bytes("mac", vec![0u8; 6])
            .bytes("modes", vec![1u8, 2, 3])
            .build();

        let expected = Shape::new()
            .field("a", WireType::U16)
            .field(
                "b",
                WireType::Record(
                    Shape::new()
                        .field("b1", WireType::U16)
                        .field("b2", WireType::U16),
                ),
            )
            .field("c", WireType::U16)
            .field("mac", WireType::fixed_array(WireType::U8, 6))
            .field("modes", WireType::sequence(WireType::U8));
        assert_eq!(record.shape(), expected);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(WireValue::from(true), WireValue::Bool(true));
        assert_eq!(WireValue::from(-3i16), WireValue::I16(-3));
        assert_eq!(WireValue::from("xterm"), WireValue::String("xterm".into()));
        assert_eq!(
            WireValue::from(vec![1u8, 2]),
            WireValue::Bytes(Bytes::from_static(&[1, 2]))
        );
        assert_eq!(WireValue::from(7u64).kind(), "u64");
    }
}
