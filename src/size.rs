// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

//! Computes exactly how many bytes a record will encode to, without writing
//! any. The encoder allocates its buffer once from this number, so this pass
//! also rejects every value the encoder couldn't write.

use crate::{
    config::{
        Config,
        LENGTH_PREFIX_SIZE,
    },
    cursor::check_length,
    errs::{
        Result,
        WireError,
    },
    value::{
        Field,
        Record,
        WireValue,
    },
    wire_type::{
        Shape,
        WireType,
    },
};

impl Record {
    /// The exact number of bytes [`Record::encode`] will produce.
    pub fn encoded_len(&self) -> Result<usize> {
        record_len(self, &Config::default())
    }
}

/// Size of a whole record, validating every declared field type first.
pub fn record_len(record: &Record, config: &Config) -> Result<usize> {
    for field in record.fields() {
        field
            .ty()
            .validate()
            .map_err(|e| e.in_field(field.name()))?;
    }
    fields_len(record.fields(), config)
}

/// Size of a single value of type `ty`.
pub fn value_len(ty: &WireType, value: &WireValue, config: &Config) -> Result<usize> {
    ty.validate()?;
    encoded_len(ty, value, config)
}

pub(crate) fn mismatch(ty: &WireType, value: &WireValue) -> WireError {
    WireError::unsupported(format!(
        "{} field holds a {} value",
        ty.name(),
        value.kind()
    ))
}

/// Nested record values must carry exactly the fields their declared shape
/// names, in the same order.
pub(crate) fn check_record_shape(shape: &Shape, record: &Record) -> Result<()> {
    if shape.len() != record.len() {
        return Err(WireError::unsupported(format!(
            "record declares {} fields, value has {}",
            shape.len(),
            record.len()
        )));
    }

    for (expected, actual) in shape.fields().iter().zip(record.fields()) {
        if expected.name() != actual.name() || expected.ty() != actual.ty() {
            return Err(WireError::unsupported(format!(
                "record field `{}` ({}) does not match declared `{}` ({})",
                actual.name(),
                actual.ty().name(),
                expected.name(),
                expected.ty().name()
            )));
        }
    }
    Ok(())
}

/// Number of elements in a collection value, as long as it is one.
pub(crate) fn collection_len(ty: &WireType, elem: &WireType, value: &WireValue) -> Result<usize> {
    match value {
        | WireValue::Bytes(bytes) if *elem == WireType::U8 => Ok(bytes.len()),
        | WireValue::List(items) => Ok(items.len()),
        | _ => Err(mismatch(ty, value)),
    }
}

fn fields_len(fields: &[Field], config: &Config) -> Result<usize> {
    fields.iter().try_fold(0usize, |acc, field| {
        let len = encoded_len(field.ty(), field.value(), config)
            .map_err(|e| e.in_field(field.name()))?;
        acc.checked_add(len)
            .ok_or_else(|| WireError::size_overflow(acc, len))
    })
}

fn encoded_len(ty: &WireType, value: &WireValue, config: &Config) -> Result<usize> {
    match (ty, value) {
        | (WireType::Bool, WireValue::Bool(_)) |
        (WireType::I8, WireValue::I8(_)) |
        (WireType::U8, WireValue::U8(_)) => Ok(1),
        | (WireType::I16, WireValue::I16(_)) | (WireType::U16, WireValue::U16(_)) => Ok(2),
        | (WireType::I32, WireValue::I32(_)) | (WireType::U32, WireValue::U32(_)) => Ok(4),
        | (WireType::I64, WireValue::I64(_)) | (WireType::U64, WireValue::U64(_)) => Ok(8),
        | (WireType::String, WireValue::String(s)) => {
            check_length(s.len(), config, None)?;
            s.len()
                .checked_add(LENGTH_PREFIX_SIZE)
                .ok_or_else(|| WireError::size_overflow(s.len(), LENGTH_PREFIX_SIZE))
        },
        | (WireType::FixedArray(elem, len), _) => {
            let count = collection_len(ty, elem, value)?;
            if count != *len {
                return Err(WireError::unsupported(format!(
                    "fixed array of {} expects {} elements, value has {}",
                    elem.name(),
                    len,
                    count
                )));
            }
            elements_len(elem, value, config)
        },
        | (WireType::Sequence(elem), _) => {
            let count = collection_len(ty, elem, value)?;
            check_length(count, config, None)?;
            let content = elements_len(elem, value, config)?;
            content
                .checked_add(LENGTH_PREFIX_SIZE)
                .ok_or_else(|| WireError::size_overflow(content, LENGTH_PREFIX_SIZE))
        },
        | (WireType::Record(shape), WireValue::Record(record)) => {
            check_record_shape(shape, record)?;
            fields_len(record.fields(), config)
        },
        | _ => Err(mismatch(ty, value)),
    }
}

fn elements_len(elem: &WireType, value: &WireValue, config: &Config) -> Result<usize> {
    match value {
        | WireValue::Bytes(bytes) => Ok(bytes.len()),
        | WireValue::List(items) => items.iter().enumerate().try_fold(0usize, |acc, (idx, item)| {
            let len = encoded_len(elem, item, config).map_err(|e| e.at_index(idx))?;
            acc.checked_add(len)
                .ok_or_else(|| WireError::size_overflow(acc, len))
        }),
        | _ => Err(mismatch(elem, value)),
    }
}
