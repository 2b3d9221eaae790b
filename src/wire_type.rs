// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use getset::Getters;

use crate::{
    config::LENGTH_PREFIX_SIZE,
    errs::{
        Result,
        WireError,
    },
};

/// The closed set of shapes a field can take on the wire. Anything that
/// doesn't map onto one of these (floats, maps, multidimensional
/// collections) is rejected with [`WireError::UnsupportedType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    /// 4-byte length, then the raw utf-8 bytes.
    String,
    /// N elements back-to-back. N belongs to the type, never the stream.
    FixedArray(Box<WireType>, usize),
    /// 4-byte element count, then the elements.
    Sequence(Box<WireType>),
    /// Fields inlined in declaration order.
    Record(Shape),
}

impl WireType {
    pub fn fixed_array(elem: WireType, len: usize) -> Self {
        WireType::FixedArray(Box::new(elem), len)
    }

    pub fn sequence(elem: WireType) -> Self {
        WireType::Sequence(Box::new(elem))
    }

    pub fn name(&self) -> &'static str {
        match self {
            | WireType::Bool => "bool",
            | WireType::I8 => "i8",
            | WireType::I16 => "i16",
            | WireType::I32 => "i32",
            | WireType::I64 => "i64",
            | WireType::U8 => "u8",
            | WireType::U16 => "u16",
            | WireType::U32 => "u32",
            | WireType::U64 => "u64",
            | WireType::String => "string",
            | WireType::FixedArray(..) => "fixed array",
            | WireType::Sequence(_) => "sequence",
            | WireType::Record(_) => "record",
        }
    }

    #[inline]
    pub fn is_collection(&self) -> bool {
        matches!(self, WireType::FixedArray(..) | WireType::Sequence(_))
    }

    /// Byte collections are moved as a single run instead of per element.
    #[inline]
    pub fn is_byte_run(&self) -> bool {
        match self {
            | WireType::FixedArray(elem, _) | WireType::Sequence(elem) => **elem == WireType::U8,
            | _ => false,
        }
    }

    /// `Some(n)` when every value of this type encodes to exactly `n` bytes.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            | WireType::Bool | WireType::I8 | WireType::U8 => Some(1),
            | WireType::I16 | WireType::U16 => Some(2),
            | WireType::I32 | WireType::U32 => Some(4),
            | WireType::I64 | WireType::U64 => Some(8),
            | WireType::String | WireType::Sequence(_) => None,
            | WireType::FixedArray(elem, len) => elem.fixed_width()?.checked_mul(*len),
            | WireType::Record(shape) => shape
                .fields
                .iter()
                .try_fold(0usize, |acc, f| acc.checked_add(f.ty.fixed_width()?)),
        }
    }

    /// The fewest bytes any value of this type can occupy. Saturates rather
    /// than overflowing; it is only ever used as a lower bound.
    pub fn min_encoded_size(&self) -> usize {
        match self {
            | WireType::String | WireType::Sequence(_) => LENGTH_PREFIX_SIZE,
            | WireType::FixedArray(elem, len) => elem.min_encoded_size().saturating_mul(*len),
            | WireType::Record(shape) => shape
                .fields
                .iter()
                .fold(0usize, |acc, f| acc.saturating_add(f.ty.min_encoded_size())),
            | scalar => scalar.fixed_width().unwrap_or(0),
        }
    }

    /// Recursively checks that this type is expressible on the wire.
    pub fn validate(&self) -> Result<()> {
        match self {
            | WireType::FixedArray(elem, _) => validate_element(elem, false),
            | WireType::Sequence(elem) => validate_element(elem, true),
            | WireType::Record(shape) => shape.validate(),
            | _ => Ok(()),
        }
    }
}

/// Fixed arrays of zero-width elements are accepted: their decode loop runs
/// the N declared in the shape without consuming input, so N is the only bound.
fn validate_element(elem: &WireType, counted: bool) -> Result<()> {
    if elem.is_collection() {
        return Err(WireError::unsupported(format!(
            "multidimensional collections are not supported ({} of {})",
            if counted { "sequence" } else { "fixed array" },
            elem.name()
        )));
    }

    // a count prefix over zero-width elements costs 4 bytes of input for an
    // unbounded number of decoded values
    if counted && elem.min_encoded_size() == 0 {
        return Err(WireError::unsupported(
            "sequence elements must occupy at least one byte",
        ));
    }

    elem.validate()
}

/// One named, typed slot in a record's shape.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct FieldShape {
    name: String,
    ty: WireType,
}

impl FieldShape {
    pub fn new(name: impl Into<String>, ty: WireType) -> Self {
        FieldShape {
            name: name.into(),
            ty,
        }
    }
}

/// The ordered field layout of a record. Order is the wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    fields: Vec<FieldShape>,
}

impl Shape {
    pub fn new() -> Self {
        Shape { fields: Vec::new() }
    }

    /// Append a field; the order of calls is the wire order.
    pub fn field(mut self, name: impl Into<String>, ty: WireType) -> Self {
        self.fields.push(FieldShape::new(name, ty));
        self
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        for field in &self.fields {
            field.ty.validate().map_err(|e| e.in_field(&field.name))?;
        }
        Ok(())
    }
}

impl From<Shape> for WireType {
    fn from(shape: Shape) -> Self {
        WireType::Record(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inner() -> Shape {
        Shape::new()
            .field("b1", WireType::U16)
            .field("b2", WireType::U16)
    }

    #[test]
    fn test_fixed_width() {
        assert_eq!(WireType::Bool.fixed_width(), Some(1));
        assert_eq!(WireType::I64.fixed_width(), Some(8));
        assert_eq!(WireType::String.fixed_width(), None);
        assert_eq!(
            WireType::fixed_array(WireType::U16, 3).fixed_width(),
            Some(6)
        );
        assert_eq!(WireType::Record(inner()).fixed_width(), Some(4));
        assert_eq!(
            WireType::Record(inner().field("name", WireType::String)).fixed_width(),
            None
        );
        assert_eq!(
            WireType::fixed_array(WireType::U64, usize::MAX).fixed_width(),
            None
        );
    }

    #[test]
    fn test_min_encoded_size() {
        assert_eq!(WireType::String.min_encoded_size(), 4);
        assert_eq!(WireType::sequence(WireType::U64).min_encoded_size(), 4);
        assert_eq!(
            WireType::fixed_array(WireType::String, 3).min_encoded_size(),
            12
        );
        assert_eq!(
            WireType::Record(inner().field("name", WireType::String)).min_encoded_size(),
            8
        );
        assert_eq!(WireType::Record(Shape::new()).min_encoded_size(), 0);
    }

    #[test]
    fn test_byte_run() {
        assert!(WireType::fixed_array(WireType::U8, 4).is_byte_run());
        assert!(WireType::sequence(WireType::U8).is_byte_run());
        assert!(!WireType::sequence(WireType::I8).is_byte_run());
        assert!(!WireType::U8.is_byte_run());
    }

    #[test]
    fn test_validate_accepts_records_in_collections() {
        let shape = Shape::new()
            .field("fixed", WireType::fixed_array(WireType::Record(inner()), 3))
            .field("counted", WireType::sequence(WireType::Record(inner())))
            .field("names", WireType::fixed_array(WireType::String, 2));
        assert!(shape.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_multidimensional() {
        let shape = Shape::new().field("a", WireType::U16).field(
            "grid",
            WireType::fixed_array(WireType::sequence(WireType::U16), 2),
        );
        let err = shape.validate().unwrap_err();
        assert!(matches!(err, WireError::UnsupportedType { .. }));
        assert_eq!(err.path().to_string(), "grid");

        let nested = Shape::new().field(
            "outer",
            WireType::Record(Shape::new().field(
                "rows",
                WireType::sequence(WireType::fixed_array(WireType::U8, 4)),
            )),
        );
        let err = nested.validate().unwrap_err();
        assert_eq!(err.path().to_string(), "outer.rows");
    }

    #[test]
    fn test_validate_rejects_zero_width_sequence() {
        let shape = Shape::new().field("empties", WireType::sequence(WireType::Record(Shape::new())));
        assert!(matches!(
            shape.validate(),
            Err(WireError::UnsupportedType { .. })
        ));

        // bounded by the type, so fine
        let shape = Shape::new().field(
            "empties",
            WireType::fixed_array(WireType::Record(Shape::new()), 3),
        );
        assert!(shape.validate().is_ok());
    }

    #[test]
    fn test_field_order_is_preserved() {
        let shape = Shape::new()
            .field("c", WireType::U8)
            .field("a", WireType::U8)
            .field("b", WireType::U8);
        let names: Vec<_> = shape.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
